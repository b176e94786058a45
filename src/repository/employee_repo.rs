// ==========================================
// 团队产能规划系统 - 员工/产能覆盖仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 有效产能的"覆盖优先于默认"解析属于引擎层 (CapacityLedger)
// ==========================================

use crate::domain::employee::{CapacityOverride, Employee};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// EmployeeRepository - 员工仓储
// ==========================================

/// 员工仓储
/// 职责: 管理 employee 表的 CRUD 操作
pub struct EmployeeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EmployeeRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增员工档案
    pub fn insert(&self, user_id: i64, standard_daily_capacity: f64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO employee (user_id, standard_daily_capacity) VALUES (?1, ?2)",
            params![user_id, standard_daily_capacity],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 为用户创建员工档案（已存在则忽略）
    pub fn insert_if_absent(
        &self,
        user_id: i64,
        standard_daily_capacity: f64,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "INSERT OR IGNORE INTO employee (user_id, standard_daily_capacity) VALUES (?1, ?2)",
            params![user_id, standard_daily_capacity],
        )?;
        Ok(affected > 0)
    }

    /// 按 employee_id 查询员工
    pub fn find_by_id(&self, employee_id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let employee = conn
            .query_row(
                r#"
                SELECT employee_id, user_id, team_id, standard_daily_capacity
                FROM employee
                WHERE employee_id = ?1
                "#,
                params![employee_id],
                Self::map_row,
            )
            .optional()?;
        Ok(employee)
    }

    /// 按 user_id 查询员工档案
    pub fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let employee = conn
            .query_row(
                r#"
                SELECT employee_id, user_id, team_id, standard_daily_capacity
                FROM employee
                WHERE user_id = ?1
                "#,
                params![user_id],
                Self::map_row,
            )
            .optional()?;
        Ok(employee)
    }

    /// 查询团队全部成员
    pub fn find_by_team(&self, team_id: i64) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, user_id, team_id, standard_daily_capacity
            FROM employee
            WHERE team_id = ?1
            ORDER BY employee_id
            "#,
        )?;
        let employees = stmt
            .query_map(params![team_id], Self::map_row)?
            .collect::<SqliteResult<Vec<Employee>>>()?;
        Ok(employees)
    }

    /// 统计团队成员数
    pub fn count_by_team(&self, team_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM employee WHERE team_id = ?1",
            params![team_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 更新员工所属团队（None 表示移出团队）
    pub fn update_team(&self, employee_id: i64, team_id: Option<i64>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE employee SET team_id = ?2 WHERE employee_id = ?1",
            params![employee_id, team_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            });
        }
        Ok(())
    }

    /// 更新员工默认日产能
    pub fn update_standard_capacity(&self, employee_id: i64, hours: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE employee SET standard_daily_capacity = ?2 WHERE employee_id = ?1",
            params![employee_id, hours],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除用户的员工档案（不存在则忽略）
    pub fn delete_by_user(&self, user_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM employee WHERE user_id = ?1", params![user_id])?;
        Ok(affected > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<Employee> {
        Ok(Employee {
            employee_id: row.get(0)?,
            user_id: row.get(1)?,
            team_id: row.get(2)?,
            standard_daily_capacity: row.get(3)?,
        })
    }
}

// ==========================================
// CapacityOverrideRepository - 产能覆盖仓储
// ==========================================

/// 产能覆盖仓储
/// 职责: 管理 capacity_override 表的 CRUD 操作
pub struct CapacityOverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CapacityOverrideRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询单日覆盖值
    ///
    /// # 返回
    /// - Ok(Some(f64)): 该日存在覆盖
    /// - Ok(None): 无覆盖（调用方回退到默认日产能）
    pub fn find_hours(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();
        let hours = conn
            .query_row(
                "SELECT capacity_hours FROM capacity_override WHERE employee_id = ?1 AND date = ?2",
                params![employee_id, date_str],
                |row| row.get::<_, f64>(0),
            )
            .optional()?;
        Ok(hours)
    }

    /// 插入或更新单日覆盖（幂等 upsert）
    pub fn upsert(&self, employee_id: i64, date: NaiveDate, hours: f64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let date_str = date.format("%Y-%m-%d").to_string();
        conn.execute(
            r#"
            INSERT INTO capacity_override (employee_id, date, capacity_hours)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(employee_id, date) DO UPDATE SET capacity_hours = excluded.capacity_hours
            "#,
            params![employee_id, date_str, hours],
        )?;
        Ok(())
    }

    /// 查询员工在日期范围内的全部覆盖
    pub fn find_in_range(
        &self,
        employee_id: i64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> RepositoryResult<Vec<CapacityOverride>> {
        let conn = self.get_conn()?;
        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn.prepare(
            r#"
            SELECT employee_id, date, capacity_hours
            FROM capacity_override
            WHERE employee_id = ?1
              AND date BETWEEN ?2 AND ?3
            ORDER BY date
            "#,
        )?;

        let overrides = stmt
            .query_map(params![employee_id, start_str, end_str], |row| {
                Ok(CapacityOverride {
                    employee_id: row.get(0)?,
                    date: NaiveDate::parse_from_str(&row.get::<_, String>(1)?, "%Y-%m-%d")
                        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
                    capacity_hours: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<CapacityOverride>>>()?;

        Ok(overrides)
    }

    /// 统计员工覆盖行数（幂等性测试用）
    pub fn count_for_employee(&self, employee_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM capacity_override WHERE employee_id = ?1",
            params![employee_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
