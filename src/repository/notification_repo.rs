// ==========================================
// 团队产能规划系统 - 通知仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::request::Notification;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 通知仓储
/// 职责: 管理 notification 表的 CRUD 操作
pub struct NotificationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl NotificationRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增通知
    pub fn insert(&self, employee_id: i64, message: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO notification (employee_id, message) VALUES (?1, ?2)",
            params![employee_id, message],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 查询员工的全部通知（新到旧）
    pub fn list_for_employee(&self, employee_id: i64) -> RepositoryResult<Vec<Notification>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT notification_id, employee_id, message, is_read, created_at
            FROM notification
            WHERE employee_id = ?1
            ORDER BY notification_id DESC
            "#,
        )?;
        let notifications = stmt
            .query_map(params![employee_id], |row| {
                let created_at_str: String = row.get(4)?;
                let created_at =
                    NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
                        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                        .unwrap_or_else(|_| Utc::now());
                Ok(Notification {
                    notification_id: row.get(0)?,
                    employee_id: row.get(1)?,
                    message: row.get(2)?,
                    is_read: row.get::<_, i64>(3)? != 0,
                    created_at,
                })
            })?
            .collect::<SqliteResult<Vec<Notification>>>()?;
        Ok(notifications)
    }

    /// 标记通知为已读
    pub fn mark_read(&self, notification_id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE notification SET is_read = 1 WHERE notification_id = ?1",
            params![notification_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Notification".to_string(),
                id: notification_id.to_string(),
            });
        }
        Ok(())
    }

    /// 删除通知
    pub fn delete(&self, notification_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM notification WHERE notification_id = ?1",
            params![notification_id],
        )?;
        Ok(affected > 0)
    }

    /// 统计员工通知数（测试用）
    pub fn count_for_employee(&self, employee_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notification WHERE employee_id = ?1",
            params![employee_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
