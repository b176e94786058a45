// ==========================================
// 团队产能规划系统 - 审批请求仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 请求为瞬态记录，审批完成后由 API 层删除
// ==========================================

use crate::domain::request::{CapacityChangeRequest, DemandEditRequest};
use crate::domain::types::{DemandStatus, RequestStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

fn parse_date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .unwrap_or_else(|_| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
}

// ==========================================
// CapacityRequestRepository - 产能变更请求仓储
// ==========================================

/// 产能变更请求仓储
pub struct CapacityRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CapacityRequestRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入请求
    pub fn insert(&self, request: &CapacityChangeRequest) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO capacity_change_request
                (request_id, employee_id, new_capacity, start_date, end_date, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                request.request_id,
                request.employee_id,
                request.new_capacity,
                request.start_date.format("%Y-%m-%d").to_string(),
                request.end_date.format("%Y-%m-%d").to_string(),
                request.status.to_db_str(),
            ],
        )?;
        Ok(())
    }

    /// 按 request_id 查询请求
    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<CapacityChangeRequest>> {
        let conn = self.get_conn()?;
        let request = conn
            .query_row(
                r#"
                SELECT request_id, employee_id, new_capacity, start_date, end_date, status
                FROM capacity_change_request
                WHERE request_id = ?1
                "#,
                params![request_id],
                Self::map_row,
            )
            .optional()?;
        Ok(request)
    }

    /// 查询待审批请求列表
    pub fn list_pending(&self) -> RepositoryResult<Vec<CapacityChangeRequest>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT request_id, employee_id, new_capacity, start_date, end_date, status
            FROM capacity_change_request
            WHERE status = 'PENDING'
            ORDER BY start_date
            "#,
        )?;
        let requests = stmt
            .query_map([], Self::map_row)?
            .collect::<SqliteResult<Vec<CapacityChangeRequest>>>()?;
        Ok(requests)
    }

    /// 更新请求状态
    pub fn update_status(&self, request_id: &str, status: RequestStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE capacity_change_request SET status = ?2 WHERE request_id = ?1",
            params![request_id, status.to_db_str()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CapacityChangeRequest".to_string(),
                id: request_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除请求（审批完成后消费）
    pub fn delete(&self, request_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM capacity_change_request WHERE request_id = ?1",
            params![request_id],
        )?;
        Ok(affected > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<CapacityChangeRequest> {
        let status_str: String = row.get(5)?;
        Ok(CapacityChangeRequest {
            request_id: row.get(0)?,
            employee_id: row.get(1)?,
            new_capacity: row.get(2)?,
            start_date: parse_date(&row.get::<_, String>(3)?),
            end_date: parse_date(&row.get::<_, String>(4)?),
            status: RequestStatus::parse(&status_str).unwrap_or(RequestStatus::Pending),
        })
    }
}

// ==========================================
// DemandEditRequestRepository - 需求编辑请求仓储
// ==========================================

/// 需求编辑请求仓储
pub struct DemandEditRequestRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemandEditRequestRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入请求
    pub fn insert(&self, request: &DemandEditRequest) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO demand_edit_request
                (request_id, demand_id, employee_id, new_name, new_status, status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                request.request_id,
                request.demand_id,
                request.employee_id,
                request.new_name,
                request.new_status.map(|s| s.to_db_str()),
                request.status.to_db_str(),
            ],
        )?;
        Ok(())
    }

    /// 按 request_id 查询请求
    pub fn find_by_id(&self, request_id: &str) -> RepositoryResult<Option<DemandEditRequest>> {
        let conn = self.get_conn()?;
        let request = conn
            .query_row(
                r#"
                SELECT request_id, demand_id, employee_id, new_name, new_status, status
                FROM demand_edit_request
                WHERE request_id = ?1
                "#,
                params![request_id],
                Self::map_row,
            )
            .optional()?;
        Ok(request)
    }

    /// 更新请求状态
    pub fn update_status(&self, request_id: &str, status: RequestStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE demand_edit_request SET status = ?2 WHERE request_id = ?1",
            params![request_id, status.to_db_str()],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "DemandEditRequest".to_string(),
                id: request_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除请求（审批完成后消费）
    pub fn delete(&self, request_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM demand_edit_request WHERE request_id = ?1",
            params![request_id],
        )?;
        Ok(affected > 0)
    }

    fn map_row(row: &rusqlite::Row<'_>) -> SqliteResult<DemandEditRequest> {
        let status_str: String = row.get(5)?;
        Ok(DemandEditRequest {
            request_id: row.get(0)?,
            demand_id: row.get(1)?,
            employee_id: row.get(2)?,
            new_name: row.get(3)?,
            new_status: row
                .get::<_, Option<String>>(4)?
                .and_then(|s| DemandStatus::parse(&s)),
            status: RequestStatus::parse(&status_str).unwrap_or(RequestStatus::Pending),
        })
    }
}
