// ==========================================
// 团队产能规划系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod demand_repo;
pub mod employee_repo;
pub mod error;
pub mod notification_repo;
pub mod request_repo;
pub mod team_repo;
pub mod user_repo;

// 重导出核心仓储
pub use demand_repo::{DemandAllocationRepository, DemandRepository};
pub use employee_repo::{CapacityOverrideRepository, EmployeeRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use notification_repo::NotificationRepository;
pub use request_repo::{CapacityRequestRepository, DemandEditRequestRepository};
pub use team_repo::{TeamRepository, TeamScheduleRepository};
pub use user_repo::{ManagerRepository, UserRepository};
