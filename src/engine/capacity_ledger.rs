// ==========================================
// 团队产能规划系统 - 个人产能台账
// ==========================================
// 职责: 员工单日有效产能的读取与区间覆写
// 规则: 有覆写行取覆写值，否则取标准日产能
// ==========================================

use chrono::{Duration, NaiveDate};

use crate::config::PlanningConfig;
use crate::domain::employee::Employee;
use crate::engine::aggregator::TeamCapacityAggregator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::PlanningRepositories;
use crate::repository::RepositoryError;

/// 个人产能台账
///
/// 有效产能 = capacity_override 覆写值（若存在），否则 standard_daily_capacity。
pub struct CapacityLedger {
    repos: PlanningRepositories,
    config: PlanningConfig,
}

impl CapacityLedger {
    /// 创建产能台账
    pub fn new(repos: PlanningRepositories, config: PlanningConfig) -> Self {
        Self { repos, config }
    }

    /// 查询员工单日有效产能
    ///
    /// # 参数
    /// - employee: 员工实体（已加载标准日产能）
    /// - date: 查询日期
    pub fn effective_capacity(&self, employee: &Employee, date: NaiveDate) -> EngineResult<f64> {
        let override_hours = self
            .repos
            .override_repo
            .find_hours(employee.employee_id, date)?;
        Ok(override_hours.unwrap_or(employee.standard_daily_capacity))
    }

    /// 按员工 ID 查询单日有效产能
    pub fn effective_capacity_by_id(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> EngineResult<f64> {
        let employee = self
            .repos
            .employee_repo
            .find_by_id(employee_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            })?;
        self.effective_capacity(&employee, date)
    }

    /// 区间覆写员工产能，并同步刷新所属团队的按日汇总
    ///
    /// # 参数
    /// - employee_id: 员工 ID
    /// - new_capacity: 新的单日产能（小时）
    /// - start_date / end_date: 覆写区间（闭区间）
    ///
    /// # 约束
    /// - 范围、产能值校验失败直接报错，不产生任何写入
    /// - 覆写 + 汇总刷新在同一事务内完成（all-or-nothing）
    pub fn set_capacity_for_range(
        &self,
        employee_id: i64,
        new_capacity: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<()> {
        if start_date > end_date {
            return Err(EngineError::InvalidRange {
                start: start_date,
                end: end_date,
            });
        }
        if new_capacity < 0.0 || new_capacity > self.config.daily_capacity_cap_hours {
            return Err(EngineError::InvalidCapacity {
                value: new_capacity,
                max: self.config.daily_capacity_cap_hours,
            });
        }

        let employee = self
            .repos
            .employee_repo
            .find_by_id(employee_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Employee".to_string(),
                id: employee_id.to_string(),
            })?;

        let aggregator = TeamCapacityAggregator::new(self.repos.clone());

        // 写锁 + 立即写事务: 防止与分配流程交错
        let _guard = self.repos.writer_guard()?;
        self.repos.begin_immediate()?;

        let result = (|| -> EngineResult<()> {
            let mut date = start_date;
            while date <= end_date {
                self.repos
                    .override_repo
                    .upsert(employee_id, date, new_capacity)?;
                if let Some(team_id) = employee.team_id {
                    aggregator.refresh(team_id, date)?;
                }
                date += Duration::days(1);
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.repos.commit()?;
                tracing::info!(
                    employee_id,
                    new_capacity,
                    %start_date,
                    %end_date,
                    "产能覆写完成"
                );
                Ok(())
            }
            Err(e) => {
                self.repos.rollback();
                Err(e)
            }
        }
    }
}
