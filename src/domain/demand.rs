// ==========================================
// 团队产能规划系统 - 需求领域模型
// ==========================================
// 职责: 需求实体与按日分配记录
// ==========================================

use crate::domain::types::{AllocationMode, DemandStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Demand - 需求
// ==========================================
// 约束: 至多分配给一个团队; 重新分配前必须清理历史按日分配
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    pub demand_id: i64,
    pub demand_name: Option<String>,
    pub team_id: Option<i64>,

    // ===== 工时 =====
    pub time_needed: f64,    // 需求总工时（小时）
    pub time_completed: f64, // 已完成工时（小时）

    // ===== 状态 =====
    pub completion_status: DemandStatus,
    pub assignment_status: bool, // 是否已分配团队

    // ===== 日期 =====
    pub start_date: Option<NaiveDate>,
    pub estimated_end_date: Option<NaiveDate>,
    pub actual_end_date: Option<NaiveDate>,

    pub allocation_mode: AllocationMode,
}

impl Demand {
    /// 是否处于不可再分配的状态（进行中/已完成）
    pub fn is_locked_for_assignment(&self) -> bool {
        matches!(
            self.completion_status,
            DemandStatus::InProgress | DemandStatus::Finished
        )
    }
}

// ==========================================
// DemandDailyAllocation - 需求按日分配
// ==========================================
// 唯一: (demand_id, date); 随需求级联删除
// 不变式: 单需求所有分配之和不超过 time_needed（浮点容差内）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandDailyAllocation {
    pub demand_id: i64,
    pub team_id: i64,
    pub date: NaiveDate,
    pub hours_allocated: f64,
}
