// ==========================================
// 团队产能规划系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合规划引擎所需的所有 Repository
// 目标: 减少各引擎的构造函数参数数量，提升可维护性
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    CapacityOverrideRepository, CapacityRequestRepository, DemandAllocationRepository,
    DemandEditRequestRepository, DemandRepository, EmployeeRepository, ManagerRepository,
    NotificationRepository, RepositoryError, RepositoryResult, TeamRepository,
    TeamScheduleRepository, UserRepository,
};

/// 规划引擎仓储集合
///
/// 聚合规划引擎所需的所有 Repository，简化依赖注入。
///
/// # 设计理念
/// - 所有仓储共享同一个数据库连接，保证事务内的一致视图
/// - 写锁 (write_lock) 串行化"模拟-提交"复合操作，防止写写交错
/// - 便于集成测试时一次性构建完整仓储层
#[derive(Clone)]
pub struct PlanningRepositories {
    conn: Arc<Mutex<Connection>>,
    /// 进程级写锁: 持有期间其他写入复合操作必须等待
    write_lock: Arc<Mutex<()>>,
    /// 用户仓储
    pub user_repo: Arc<UserRepository>,
    /// 经理档案仓储
    pub manager_repo: Arc<ManagerRepository>,
    /// 员工仓储
    pub employee_repo: Arc<EmployeeRepository>,
    /// 产能覆写仓储
    pub override_repo: Arc<CapacityOverrideRepository>,
    /// 团队仓储
    pub team_repo: Arc<TeamRepository>,
    /// 团队按日汇总仓储
    pub schedule_repo: Arc<TeamScheduleRepository>,
    /// 需求仓储
    pub demand_repo: Arc<DemandRepository>,
    /// 需求按日分配仓储
    pub allocation_repo: Arc<DemandAllocationRepository>,
    /// 产能变更请求仓储
    pub capacity_request_repo: Arc<CapacityRequestRepository>,
    /// 需求编辑请求仓储
    pub edit_request_repo: Arc<DemandEditRequestRepository>,
    /// 通知仓储
    pub notification_repo: Arc<NotificationRepository>,
}

impl PlanningRepositories {
    /// 从已有连接创建仓储集合
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::from_connection(conn.clone())),
            manager_repo: Arc::new(ManagerRepository::from_connection(conn.clone())),
            employee_repo: Arc::new(EmployeeRepository::from_connection(conn.clone())),
            override_repo: Arc::new(CapacityOverrideRepository::from_connection(conn.clone())),
            team_repo: Arc::new(TeamRepository::from_connection(conn.clone())),
            schedule_repo: Arc::new(TeamScheduleRepository::from_connection(conn.clone())),
            demand_repo: Arc::new(DemandRepository::from_connection(conn.clone())),
            allocation_repo: Arc::new(DemandAllocationRepository::from_connection(conn.clone())),
            capacity_request_repo: Arc::new(CapacityRequestRepository::from_connection(
                conn.clone(),
            )),
            edit_request_repo: Arc::new(DemandEditRequestRepository::from_connection(conn.clone())),
            notification_repo: Arc::new(NotificationRepository::from_connection(conn.clone())),
            write_lock: Arc::new(Mutex::new(())),
            conn,
        }
    }

    /// 打开数据库文件并初始化表结构后创建仓储集合
    pub fn from_db_path(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        init_schema(&conn).map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 获取共享连接（供事务控制使用）
    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }

    /// 获取进程级写锁
    ///
    /// # 约束
    /// 任何"读取-模拟-写入"复合操作必须先持有此锁再开事务，
    /// 否则两个写入方可能基于同一份快照做出冲突决策。
    pub fn writer_guard(&self) -> RepositoryResult<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 开启立即写事务 (BEGIN IMMEDIATE)
    pub fn begin_immediate(&self) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        conn.execute("BEGIN IMMEDIATE", [])
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 提交事务
    pub fn commit(&self) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        conn.execute("COMMIT", [])
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 回滚事务
    ///
    /// # 说明
    /// 回滚失败仅记录日志，不再向上传播（调用方正处于错误路径）。
    pub fn rollback(&self) {
        let conn = match self.conn.lock() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("回滚失败: 连接锁获取失败 - {}", e);
                return;
            }
        };
        if let Err(e) = conn.execute("ROLLBACK", []) {
            tracing::error!("回滚失败: {}", e);
        }
    }
}
