// ==========================================
// 团队产能规划系统 - 引擎层错误
// ==========================================
// 职责: 定义分配/产能引擎的业务错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Debug, Error)]
pub enum EngineError {
    // ===== 产能变更校验 =====
    /// 日期范围非法（start > end）
    #[error("日期范围非法: 起始日期 {start} 晚于结束日期 {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// 产能值越界
    #[error("产能值非法: {value} 小时（允许范围 0 ~ {max} 小时）")]
    InvalidCapacity { value: f64, max: f64 },

    /// 跨度超限
    #[error("请求跨度非法: {days} 天（允许范围 1 ~ {max} 天）")]
    InvalidSpan { days: i64, max: i64 },

    /// 提前期不足
    #[error("请求提前期不足: 起始日期 {start} 距今不足 {min_lead} 天")]
    TooSoon { start: NaiveDate, min_lead: i64 },

    /// 员工未加入团队
    #[error("员工 {employee_id} 未加入任何团队，无法提交产能变更")]
    NoTeam { employee_id: i64 },

    /// 产能变更与既有承诺冲突
    #[error("产能变更冲突: {} 个日期的团队产能将低于已承诺工时", dates.len())]
    CapacityClash { dates: Vec<NaiveDate> },

    // ===== 需求分配 =====
    /// 需求已分配
    #[error("需求 {demand_id} 已分配团队，禁止重复分配")]
    AlreadyAssigned { demand_id: i64 },

    /// 需求状态不允许分配
    #[error("需求 {demand_id} 当前状态 {status} 不允许分配")]
    InvalidState { demand_id: i64, status: String },

    /// 工时非法
    #[error("需求工时非法: {hours} 小时（必须大于 0）")]
    InvalidHours { hours: f64 },

    /// 团队不存在
    #[error("团队不存在: {team_id}")]
    TeamNotFound { team_id: i64 },

    /// 团队成员已满
    #[error("团队 {team_id} 成员已满（上限 {max} 人）")]
    TeamFull { team_id: i64, max: usize },

    /// 产能不足（模拟窗口内无法排完）
    #[error("团队 {team_id} 产能不足: {days_attempted} 天内剩余 {remaining_hours:.1} 小时无法分配")]
    CapacityExceeded {
        team_id: i64,
        remaining_hours: f64,
        days_attempted: u32,
    },

    // ===== 需求状态机 =====
    /// 状态迁移非法
    #[error("需求状态迁移非法: {from} -> {to}")]
    InvalidStatusTransition { from: String, to: String },

    /// 需求未分配团队
    #[error("需求 {demand_id} 未分配团队，无法完成该操作")]
    NoTeamAssigned { demand_id: i64 },

    // ===== 透传 =====
    /// 仓储层错误
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 引擎层结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
