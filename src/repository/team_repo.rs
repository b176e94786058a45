// ==========================================
// 团队产能规划系统 - 团队/按日汇总仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::team::{Team, TeamDailySchedule};
use crate::domain::types::CompletionOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// TeamRepository - 团队仓储
// ==========================================

/// 团队仓储
/// 职责: 管理 team 表的 CRUD 操作与统计计数器
pub struct TeamRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeamRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增团队
    pub fn insert(&self, team_name: &str, manager_id: Option<i64>) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO team (team_name, manager_id) VALUES (?1, ?2)",
            params![team_name, manager_id],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 team_id 查询团队
    pub fn find_by_id(&self, team_id: i64) -> RepositoryResult<Option<Team>> {
        let conn = self.get_conn()?;
        let team = conn
            .query_row(
                r#"
                SELECT team_id, manager_id, team_name,
                       on_time_completions, overdue_demands, early_completion
                FROM team
                WHERE team_id = ?1
                "#,
                params![team_id],
                Self::map_row,
            )
            .optional()?;
        Ok(team)
    }

    /// 查询全部团队（按 team_id 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Team>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT team_id, manager_id, team_name,
                   on_time_completions, overdue_demands, early_completion
            FROM team
            ORDER BY team_id
            "#,
        )?;
        let teams = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<Team>>>()?;
        Ok(teams)
    }

    /// 递增完成时效计数器（终身统计，只增不减）
    pub fn increment_outcome_counter(
        &self,
        team_id: i64,
        outcome: CompletionOutcome,
    ) -> RepositoryResult<()> {
        let column = match outcome {
            CompletionOutcome::OnTime => "on_time_completions",
            CompletionOutcome::Overdue => "overdue_demands",
            CompletionOutcome::Early => "early_completion",
        };
        let conn = self.get_conn()?;
        let sql = format!("UPDATE team SET {column} = {column} + 1 WHERE team_id = ?1");
        let affected = conn.execute(&sql, params![team_id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Team".to_string(),
                id: team_id.to_string(),
            });
        }
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<Team> {
        Ok(Team {
            team_id: row.get(0)?,
            manager_id: row.get(1)?,
            team_name: row.get(2)?,
            on_time_completions: row.get(3)?,
            overdue_demands: row.get(4)?,
            early_completion: row.get(5)?,
        })
    }
}

// ==========================================
// TeamScheduleRepository - 按日汇总仓储
// ==========================================

/// 团队按日汇总仓储
/// 职责: 管理 team_daily_schedule 表（物化缓存行）
/// 说明: 重算逻辑在引擎层 (TeamCapacityAggregator)，此处只做行存取
pub struct TeamScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TeamScheduleRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询单日汇总行
    pub fn find(
        &self,
        team_id: i64,
        date: NaiveDate,
    ) -> RepositoryResult<Option<TeamDailySchedule>> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let schedule = conn
            .query_row(
                r#"
                SELECT team_id, date, team_capacity, hours_allocated
                FROM team_daily_schedule
                WHERE team_id = ?1 AND date = ?2
                "#,
                params![team_id, date_str],
                Self::map_row,
            )
            .optional()?;
        Ok(schedule)
    }

    /// 插入或更新单日汇总行（create-if-absent）
    pub fn upsert(&self, schedule: &TeamDailySchedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let date_str = schedule.date.format("%Y-%m-%d").to_string();
        conn.execute(
            r#"
            INSERT INTO team_daily_schedule (team_id, date, team_capacity, hours_allocated)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(team_id, date) DO UPDATE SET
                team_capacity = excluded.team_capacity,
                hours_allocated = excluded.hours_allocated
            "#,
            params![
                schedule.team_id,
                date_str,
                schedule.team_capacity,
                schedule.hours_allocated,
            ],
        )?;
        Ok(())
    }

    /// 查询团队在日期范围内的汇总行
    pub fn find_range(
        &self,
        team_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<TeamDailySchedule>> {
        let conn = self.get_conn()?;
        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn.prepare(
            r#"
            SELECT team_id, date, team_capacity, hours_allocated
            FROM team_daily_schedule
            WHERE team_id = ?1
              AND date BETWEEN ?2 AND ?3
            ORDER BY date
            "#,
        )?;
        let schedules = stmt
            .query_map(params![team_id, start_str, end_str], Self::map_row)?
            .collect::<SqliteResult<Vec<TeamDailySchedule>>>()?;
        Ok(schedules)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<TeamDailySchedule> {
        Ok(TeamDailySchedule {
            team_id: row.get(0)?,
            date: NaiveDate::parse_from_str(&row.get::<_, String>(1)?, "%Y-%m-%d")
                .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
            team_capacity: row.get(2)?,
            hours_allocated: row.get(3)?,
        })
    }
}
