// ==========================================
// 团队产能规划系统 - 用户/经理仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::employee::{Manager, User};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// UserRepository - 用户仓储
// ==========================================

/// 用户仓储
/// 职责: 管理 user 表的 CRUD 操作
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增用户
    ///
    /// # 返回
    /// - Ok(i64): 新用户 user_id
    pub fn insert(
        &self,
        username: &str,
        full_name: Option<&str>,
        is_manager: bool,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO user (username, full_name, is_manager) VALUES (?1, ?2, ?3)",
            params![username, full_name, is_manager as i64],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按 user_id 查询用户
    pub fn find_by_id(&self, user_id: i64) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, full_name, is_manager FROM user WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                        is_manager: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    /// 更新用户经理标志
    pub fn update_is_manager(&self, user_id: i64, is_manager: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE user SET is_manager = ?2 WHERE user_id = ?1",
            params![user_id, is_manager as i64],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User".to_string(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }
}

// ==========================================
// ManagerRepository - 经理档案仓储
// ==========================================

/// 经理档案仓储
/// 职责: 管理 manager 表的 CRUD 操作
pub struct ManagerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ManagerRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 user_id 查询经理档案
    pub fn find_by_user(&self, user_id: i64) -> RepositoryResult<Option<Manager>> {
        let conn = self.get_conn()?;
        let manager = conn
            .query_row(
                "SELECT manager_id, user_id FROM manager WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(Manager {
                        manager_id: row.get(0)?,
                        user_id: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(manager)
    }

    /// 为用户创建经理档案（已存在则忽略）
    ///
    /// # 返回
    /// - Ok(true): 新建了档案
    /// - Ok(false): 档案已存在
    pub fn insert_if_absent(&self, user_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "INSERT OR IGNORE INTO manager (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Ok(affected > 0)
    }

    /// 删除用户的经理档案（不存在则忽略）
    pub fn delete_by_user(&self, user_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM manager WHERE user_id = ?1", params![user_id])?;
        Ok(affected > 0)
    }
}
