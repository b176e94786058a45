// ==========================================
// 团队产能规划系统 - 领域类型定义
// ==========================================
// 红线: 状态转换走显式状态机,不做字符串比较分支
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 需求完成状态 (Demand Completion Status)
// ==========================================
// 状态机: Pending -> InProgress -> Finished
//         Pending -> Finished (允许直接完成)
// Finished 为终态; 不支持回退到 Pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DemandStatus {
    Pending,    // 待分配/待开工
    InProgress, // 进行中
    Finished,   // 已完成（终态）
}

impl fmt::Display for DemandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemandStatus::Pending => write!(f, "PENDING"),
            DemandStatus::InProgress => write!(f, "IN_PROGRESS"),
            DemandStatus::Finished => write!(f, "FINISHED"),
        }
    }
}

impl DemandStatus {
    /// 从字符串解析状态
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().replace(' ', "_").as_str() {
            "PENDING" => Some(DemandStatus::Pending),
            "IN_PROGRESS" => Some(DemandStatus::InProgress),
            "FINISHED" => Some(DemandStatus::Finished),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            DemandStatus::Pending => "PENDING",
            DemandStatus::InProgress => "IN_PROGRESS",
            DemandStatus::Finished => "FINISHED",
        }
    }
}

// ==========================================
// 审批请求状态 (Request Status)
// ==========================================
// 用于产能变更请求与需求编辑请求
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,  // 待审批
    Approved, // 已批准
    Rejected, // 已拒绝
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "PENDING"),
            RequestStatus::Approved => write!(f, "APPROVED"),
            RequestStatus::Rejected => write!(f, "REJECTED"),
        }
    }
}

impl RequestStatus {
    /// 从字符串解析状态
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(RequestStatus::Pending),
            "APPROVED" => Some(RequestStatus::Approved),
            "REJECTED" => Some(RequestStatus::Rejected),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Rejected => "REJECTED",
        }
    }
}

// ==========================================
// 分配模式 (Allocation Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationMode {
    Regular, // 常规
    Urgent,  // 紧急
}

impl fmt::Display for AllocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationMode::Regular => write!(f, "REGULAR"),
            AllocationMode::Urgent => write!(f, "URGENT"),
        }
    }
}

impl AllocationMode {
    /// 从字符串解析模式
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "REGULAR" => Some(AllocationMode::Regular),
            "URGENT" => Some(AllocationMode::Urgent),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AllocationMode::Regular => "REGULAR",
            AllocationMode::Urgent => "URGENT",
        }
    }
}

// ==========================================
// 完成时效结果 (Completion Outcome)
// ==========================================
// 需求转为 Finished 时，按实际完成日与预计完成日之差判定
// 对应团队的终身统计计数器（只增不减）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompletionOutcome {
    OnTime,  // 按时完成 (delta == 0)
    Overdue, // 逾期完成 (delta > 0)
    Early,   // 提前完成 (delta < 0)
}

impl fmt::Display for CompletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionOutcome::OnTime => write!(f, "ON_TIME"),
            CompletionOutcome::Overdue => write!(f, "OVERDUE"),
            CompletionOutcome::Early => write!(f, "EARLY"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demand_status_roundtrip() {
        for status in [
            DemandStatus::Pending,
            DemandStatus::InProgress,
            DemandStatus::Finished,
        ] {
            assert_eq!(DemandStatus::parse(status.to_db_str()), Some(status));
        }
    }

    #[test]
    fn test_demand_status_parse_legacy_spelling() {
        // 兼容历史数据中的 "In Progress" 写法
        assert_eq!(DemandStatus::parse("In Progress"), Some(DemandStatus::InProgress));
        assert_eq!(DemandStatus::parse("pending"), Some(DemandStatus::Pending));
        assert_eq!(DemandStatus::parse("unknown"), None);
    }

    #[test]
    fn test_request_status_roundtrip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Approved,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.to_db_str()), Some(status));
        }
    }
}
