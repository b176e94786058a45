// ==========================================
// 团队产能规划系统 - 引擎层
// ==========================================
// 红线: Engine 层不直接触达 SQL，全部经由 Repository
// ==========================================
// 职责: 产能台账、汇总、模拟、分配、校验、状态机
// ==========================================

pub mod aggregator;
pub mod allocator;
pub mod capacity_ledger;
pub mod change_validator;
pub mod error;
pub mod events;
pub mod repositories;
pub mod simulator;
pub mod status;

// 重导出核心引擎
pub use aggregator::TeamCapacityAggregator;
pub use allocator::{AllocationResult, DemandAllocator};
pub use capacity_ledger::CapacityLedger;
pub use change_validator::CapacityChangeValidator;
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpNotificationSink, NotificationSink, OptionalNotificationSink, RepositoryNotificationSink,
};
pub use repositories::PlanningRepositories;
pub use simulator::{
    AllocationSimulator, DailySlice, FreeCapacityView, SimulationOutcome, EPSILON,
};
pub use status::DemandStatusEngine;
