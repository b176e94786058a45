// ==========================================
// 团队产能规划系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod demand;
pub mod employee;
pub mod request;
pub mod team;
pub mod types;

// 重导出核心类型
pub use demand::{Demand, DemandDailyAllocation};
pub use employee::{CapacityOverride, Employee, Manager, User};
pub use request::{CapacityChangeRequest, DemandEditRequest, Notification};
pub use team::{Team, TeamDailySchedule};
pub use types::{AllocationMode, CompletionOutcome, DemandStatus, RequestStatus};
