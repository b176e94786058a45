// ==========================================
// 团队产能规划系统 - 团队产能汇总器
// ==========================================
// 职责: 团队单日总产能/已承诺工时的读取与物化刷新
// 存储: team_daily_schedule 表（物化缓存，懒建行）
// 口径: 缓存行缺失时从基础表重算，不返回 0
// ==========================================

use chrono::NaiveDate;

use crate::domain::team::TeamDailySchedule;
use crate::engine::error::EngineResult;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::simulator::FreeCapacityView;

/// 团队产能汇总器
///
/// team_daily_schedule 是按需物化的缓存行: 写路径（分配、产能覆写）
/// 刷新受影响日期，读路径缓存命中直接返回，缺行回退基础表重算。
pub struct TeamCapacityAggregator {
    repos: PlanningRepositories,
}

impl TeamCapacityAggregator {
    /// 创建汇总器
    pub fn new(repos: PlanningRepositories) -> Self {
        Self { repos }
    }

    /// 从基础表重算团队单日总产能
    ///
    /// 口径: 所有成员的有效产能之和（覆写值优先于标准日产能）
    fn compute_total_capacity(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
        let members = self.repos.employee_repo.find_by_team(team_id)?;
        let mut total = 0.0;
        for member in &members {
            let override_hours = self.repos.override_repo.find_hours(member.employee_id, date)?;
            total += override_hours.unwrap_or(member.standard_daily_capacity);
        }
        Ok(total)
    }

    /// 从基础表重算团队单日已承诺工时
    fn compute_hours_committed(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
        Ok(self.repos.allocation_repo.sum_for_team_date(team_id, date)?)
    }

    /// 查询团队单日总产能（缓存优先）
    pub fn total_capacity(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
        match self.repos.schedule_repo.find(team_id, date)? {
            Some(row) => Ok(row.team_capacity),
            None => self.compute_total_capacity(team_id, date),
        }
    }

    /// 查询团队单日已承诺工时（缓存优先）
    pub fn hours_committed(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
        match self.repos.schedule_repo.find(team_id, date)? {
            Some(row) => Ok(row.hours_allocated),
            None => self.compute_hours_committed(team_id, date),
        }
    }

    /// 刷新团队单日物化汇总行
    ///
    /// # 说明
    /// 全量重算 team_capacity 与 hours_allocated 后 UPSERT，
    /// 必须在写锁保护的事务内调用。
    pub fn refresh(&self, team_id: i64, date: NaiveDate) -> EngineResult<TeamDailySchedule> {
        let schedule = TeamDailySchedule {
            team_id,
            date,
            team_capacity: self.compute_total_capacity(team_id, date)?,
            hours_allocated: self.compute_hours_committed(team_id, date)?,
        };
        self.repos.schedule_repo.upsert(&schedule)?;
        Ok(schedule)
    }
}

impl FreeCapacityView for TeamCapacityAggregator {
    /// 团队单日剩余可分配产能 = max(总产能 - 已承诺工时, 0)
    fn free_capacity(&self, team_id: i64, date: NaiveDate) -> EngineResult<f64> {
        match self.repos.schedule_repo.find(team_id, date)? {
            Some(row) => Ok(row.free_capacity()),
            None => {
                let total = self.compute_total_capacity(team_id, date)?;
                let committed = self.compute_hours_committed(team_id, date)?;
                Ok((total - committed).max(0.0))
            }
        }
    }
}
