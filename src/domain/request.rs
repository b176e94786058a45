// ==========================================
// 团队产能规划系统 - 审批请求与通知模型
// ==========================================
// 职责: 瞬态审批工作流记录（审批完成后删除）与通知实体
// ==========================================

use crate::domain::types::{DemandStatus, RequestStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CapacityChangeRequest - 产能变更请求
// ==========================================
// 生命周期: Pending -> Approved/Rejected -> 删除
// 审批通过时经 CapacityLedger::set_capacity_for_range 落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityChangeRequest {
    pub request_id: String, // UUID
    pub employee_id: i64,
    pub new_capacity: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RequestStatus,
}

impl CapacityChangeRequest {
    /// 请求覆盖的天数（含两端）
    pub fn span_days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

// ==========================================
// DemandEditRequest - 需求编辑请求
// ==========================================
// new_name / new_status 至少一项非空
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandEditRequest {
    pub request_id: String, // UUID
    pub demand_id: i64,
    pub employee_id: i64,
    pub new_name: Option<String>,
    pub new_status: Option<DemandStatus>,
    pub status: RequestStatus,
}

// ==========================================
// Notification - 通知
// ==========================================
// 由引擎 fire-and-forget 发出，失败不回滚核心事务
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: i64,
    pub employee_id: i64,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
