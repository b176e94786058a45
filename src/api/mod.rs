// ==========================================
// 团队产能规划系统 - API层
// ==========================================
// 职责: 面向调用方的操作入口与 DTO 转换
// 红线: API 层不直接触达 SQL，业务规则在引擎层
// ==========================================

pub mod capacity_api;
pub mod demand_api;
pub mod error;
pub mod team_api;
pub mod user_api;

// 重导出核心 API
pub use capacity_api::{
    CapacityApi, ChangeCapacityRequest, ChangeCapacityResponse, PendingCapacityRequestDto,
};
pub use demand_api::{
    AssignDemandRequest, AssignDemandResponse, DailyAllocationDto, DeadlineQueryRequest, DemandApi,
};
pub use error::{ApiError, ApiResult};
pub use team_api::{TeamApi, TeamStatsDto};
pub use user_api::UserApi;
