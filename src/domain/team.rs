// ==========================================
// 团队产能规划系统 - 团队领域模型
// ==========================================
// 职责: 团队实体与按日产能汇总缓存
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Team - 团队
// ==========================================
// 约束: 成员数硬上限（默认 6，加入成员时校验）
// 统计计数器为终身统计，只增不减
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub team_id: i64,
    pub manager_id: Option<i64>,
    pub team_name: String,

    // ===== 完成时效终身统计 =====
    pub on_time_completions: i64, // 按时完成次数
    pub overdue_demands: i64,     // 逾期完成次数
    pub early_completion: i64,    // 提前完成次数
}

// ==========================================
// TeamDailySchedule - 团队按日产能汇总
// ==========================================
// 性质: capacity_override + standard_daily_capacity + demand_daily_allocation
//       的物化缓存,唯一: (team_id, date)
// 不变式: 每次成功分配后 hours_allocated <= team_capacity
// 刷新契约: 任何底层行变更后必须显式调用聚合器 refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamDailySchedule {
    pub team_id: i64,
    pub date: NaiveDate,
    pub team_capacity: f64,   // 当日团队总产能（小时）
    pub hours_allocated: f64, // 当日已承诺的需求工时（小时）
}

impl TeamDailySchedule {
    /// 当日空闲产能（小时），下限为 0
    pub fn free_capacity(&self) -> f64 {
        (self.team_capacity - self.hours_allocated).max(0.0)
    }

    /// 是否超承诺（仅在产能被事后缩减时可能出现，见已知缺口）
    pub fn is_overcommitted(&self) -> bool {
        self.hours_allocated > self.team_capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_capacity_floor_at_zero() {
        let schedule = TeamDailySchedule {
            team_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            team_capacity: 10.0,
            hours_allocated: 12.0,
        };
        assert_eq!(schedule.free_capacity(), 0.0);
        assert!(schedule.is_overcommitted());
    }

    #[test]
    fn test_free_capacity_normal() {
        let schedule = TeamDailySchedule {
            team_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            team_capacity: 16.0,
            hours_allocated: 9.5,
        };
        assert_eq!(schedule.free_capacity(), 6.5);
        assert!(!schedule.is_overcommitted());
    }
}
