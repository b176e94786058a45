// ==========================================
// 团队产能规划系统 - 需求/按日分配仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::demand::{Demand, DemandDailyAllocation};
use crate::domain::types::{AllocationMode, DemandStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

fn fmt_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

// ==========================================
// DemandRepository - 需求仓储
// ==========================================

/// 需求仓储
/// 职责: 管理 demand 表的 CRUD 操作
pub struct DemandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemandRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增需求（初始为 Pending、未分配）
    pub fn insert(
        &self,
        demand_name: Option<&str>,
        allocation_mode: AllocationMode,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO demand (demand_name, allocation_mode) VALUES (?1, ?2)",
            params![demand_name, allocation_mode.to_db_str()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 demand_id 查询需求
    pub fn find_by_id(&self, demand_id: i64) -> RepositoryResult<Option<Demand>> {
        let conn = self.get_conn()?;
        let demand = conn
            .query_row(
                r#"
                SELECT demand_id, demand_name, team_id, time_needed, time_completed,
                       completion_status, assignment_status,
                       start_date, estimated_end_date, actual_end_date, allocation_mode
                FROM demand
                WHERE demand_id = ?1
                "#,
                params![demand_id],
                Self::map_row,
            )
            .optional()?;
        Ok(demand)
    }

    /// 查询团队的全部需求
    pub fn find_by_team(&self, team_id: i64) -> RepositoryResult<Vec<Demand>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT demand_id, demand_name, team_id, time_needed, time_completed,
                   completion_status, assignment_status,
                   start_date, estimated_end_date, actual_end_date, allocation_mode
            FROM demand
            WHERE team_id = ?1
            ORDER BY demand_id
            "#,
        )?;
        let demands = stmt
            .query_map(params![team_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Demand>>>()?;
        Ok(demands)
    }

    /// 整行更新需求（分配提交与状态机共用）
    pub fn update(&self, demand: &Demand) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE demand SET
                demand_name = ?2,
                team_id = ?3,
                time_needed = ?4,
                time_completed = ?5,
                completion_status = ?6,
                assignment_status = ?7,
                start_date = ?8,
                estimated_end_date = ?9,
                actual_end_date = ?10,
                allocation_mode = ?11
            WHERE demand_id = ?1
            "#,
            params![
                demand.demand_id,
                demand.demand_name,
                demand.team_id,
                demand.time_needed,
                demand.time_completed,
                demand.completion_status.to_db_str(),
                demand.assignment_status as i64,
                fmt_date(demand.start_date),
                fmt_date(demand.estimated_end_date),
                fmt_date(demand.actual_end_date),
                demand.allocation_mode.to_db_str(),
            ],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Demand".to_string(),
                id: demand.demand_id.to_string(),
            });
        }
        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<Demand> {
        let status_str: String = row.get(5)?;
        let mode_str: String = row.get(10)?;
        Ok(Demand {
            demand_id: row.get(0)?,
            demand_name: row.get(1)?,
            team_id: row.get(2)?,
            time_needed: row.get(3)?,
            time_completed: row.get(4)?,
            completion_status: DemandStatus::parse(&status_str).unwrap_or(DemandStatus::Pending),
            assignment_status: row.get::<_, i64>(6)? != 0,
            start_date: row.get::<_, Option<String>>(7)?.map(|s| parse_date(&s)),
            estimated_end_date: row.get::<_, Option<String>>(8)?.map(|s| parse_date(&s)),
            actual_end_date: row.get::<_, Option<String>>(9)?.map(|s| parse_date(&s)),
            allocation_mode: AllocationMode::parse(&mode_str).unwrap_or(AllocationMode::Regular),
        })
    }
}

// ==========================================
// DemandAllocationRepository - 按日分配仓储
// ==========================================

/// 需求按日分配仓储
/// 职责: 管理 demand_daily_allocation 表
pub struct DemandAllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemandAllocationRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入单条按日分配
    pub fn insert(&self, allocation: &DemandDailyAllocation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let date_str = allocation.date.format("%Y-%m-%d").to_string();
        conn.execute(
            r#"
            INSERT INTO demand_daily_allocation (demand_id, team_id, date, hours_allocated)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                allocation.demand_id,
                allocation.team_id,
                date_str,
                allocation.hours_allocated,
            ],
        )?;
        Ok(())
    }

    /// 查询需求的全部按日分配（按日期排序）
    pub fn find_by_demand(&self, demand_id: i64) -> RepositoryResult<Vec<DemandDailyAllocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT demand_id, team_id, date, hours_allocated
            FROM demand_daily_allocation
            WHERE demand_id = ?1
            ORDER BY date
            "#,
        )?;
        let allocations = stmt
            .query_map(params![demand_id], |row| {
                Ok(DemandDailyAllocation {
                    demand_id: row.get(0)?,
                    team_id: row.get(1)?,
                    date: parse_date(&row.get::<_, String>(2)?),
                    hours_allocated: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<DemandDailyAllocation>>>()?;
        Ok(allocations)
    }

    /// 删除需求的全部按日分配
    ///
    /// # 返回
    /// 被删除行的 (team_id, date) 列表，供调用方刷新汇总
    pub fn delete_by_demand(&self, demand_id: i64) -> RepositoryResult<Vec<(i64, NaiveDate)>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            "SELECT team_id, date FROM demand_daily_allocation WHERE demand_id = ?1",
        )?;
        let touched = stmt
            .query_map(params![demand_id], |row| {
                Ok((row.get::<_, i64>(0)?, parse_date(&row.get::<_, String>(1)?)))
            })?
            .collect::<SqliteResult<Vec<(i64, NaiveDate)>>>()?;

        conn.execute(
            "DELETE FROM demand_daily_allocation WHERE demand_id = ?1",
            params![demand_id],
        )?;

        Ok(touched)
    }

    /// 单需求分配工时合计
    pub fn sum_for_demand(&self, demand_id: i64) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let sum: f64 = conn.query_row(
            "SELECT COALESCE(SUM(hours_allocated), 0) FROM demand_daily_allocation WHERE demand_id = ?1",
            params![demand_id],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 团队单日分配工时合计（汇总缓存缺行时的回退口径）
    pub fn sum_for_team_date(&self, team_id: i64, date: NaiveDate) -> RepositoryResult<f64> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let sum: f64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(hours_allocated), 0)
            FROM demand_daily_allocation
            WHERE team_id = ?1 AND date = ?2
            "#,
            params![team_id, date_str],
            |row| row.get(0),
        )?;
        Ok(sum)
    }

    /// 统计需求分配行数
    pub fn count_for_demand(&self, demand_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM demand_daily_allocation WHERE demand_id = ?1",
            params![demand_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
