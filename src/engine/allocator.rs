// ==========================================
// 团队产能规划系统 - 需求分配器
// ==========================================
// 职责: 将需求原子化地落位到团队的逐日产能上
// 约束: 模拟与落库在同一写锁+事务内完成（all-or-nothing）
// ==========================================

use chrono::NaiveDate;

use crate::config::PlanningConfig;
use crate::domain::demand::DemandDailyAllocation;
use crate::domain::types::DemandStatus;
use crate::engine::aggregator::TeamCapacityAggregator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::OptionalNotificationSink;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::simulator::{AllocationSimulator, DailySlice, SimulationOutcome};
use crate::repository::RepositoryError;

/// 分配结果
#[derive(Debug, Clone)]
pub struct AllocationResult {
    pub demand_id: i64,
    pub team_id: i64,
    pub start_date: NaiveDate,
    pub estimated_end_date: NaiveDate,
    pub slices: Vec<DailySlice>,
}

/// 需求分配器
///
/// 分配 = 前置校验 → 模拟 → 落库 → 刷新汇总 → 提交。
/// 任一步失败则整体回滚，需求保持未分配状态。
pub struct DemandAllocator {
    repos: PlanningRepositories,
    config: PlanningConfig,
    sink: OptionalNotificationSink,
}

impl DemandAllocator {
    /// 创建分配器
    pub fn new(
        repos: PlanningRepositories,
        config: PlanningConfig,
        sink: OptionalNotificationSink,
    ) -> Self {
        Self {
            repos,
            config,
            sink,
        }
    }

    /// 将需求分配给团队
    ///
    /// # 参数
    /// - demand_id: 需求 ID
    /// - team_id: 目标团队 ID
    /// - hours: 需求总工时
    /// - start_date: 分配起始日期
    ///
    /// # 前置条件
    /// - 需求未分配且处于 Pending 状态
    /// - 工时为正
    /// - 团队存在
    ///
    /// # 失败语义
    /// 模拟窗口内排不完返回 CapacityExceeded，数据库无任何变化。
    pub fn assign(
        &self,
        demand_id: i64,
        team_id: i64,
        hours: f64,
        start_date: NaiveDate,
    ) -> EngineResult<AllocationResult> {
        // 写锁覆盖"前置校验-模拟-落库"全程，避免两次并发分配同时通过校验
        let _guard = self.repos.writer_guard()?;

        let mut demand = self
            .repos
            .demand_repo
            .find_by_id(demand_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Demand".to_string(),
                id: demand_id.to_string(),
            })?;

        if demand.assignment_status {
            return Err(EngineError::AlreadyAssigned { demand_id });
        }
        if demand.is_locked_for_assignment() {
            return Err(EngineError::InvalidState {
                demand_id,
                status: demand.completion_status.to_string(),
            });
        }
        if hours <= 0.0 {
            return Err(EngineError::InvalidHours { hours });
        }
        let team = self
            .repos
            .team_repo
            .find_by_id(team_id)?
            .ok_or(EngineError::TeamNotFound { team_id })?;

        let aggregator = TeamCapacityAggregator::new(self.repos.clone());
        let simulator = AllocationSimulator::new(self.config.max_simulation_days);

        self.repos.begin_immediate()?;

        let result = (|| -> EngineResult<AllocationResult> {
            // 清理历史残留分配行（正常路径为空）
            let stale = self.repos.allocation_repo.delete_by_demand(demand_id)?;
            for (stale_team, stale_date) in &stale {
                aggregator.refresh(*stale_team, *stale_date)?;
            }

            let outcome = simulator.simulate(&aggregator, team_id, start_date, hours)?;
            let (end_date, slices) = match outcome {
                SimulationOutcome::Feasible { end_date, slices } => (end_date, slices),
                SimulationOutcome::Infeasible {
                    remaining_hours,
                    days_attempted,
                } => {
                    return Err(EngineError::CapacityExceeded {
                        team_id,
                        remaining_hours,
                        days_attempted,
                    });
                }
            };

            for slice in &slices {
                self.repos.allocation_repo.insert(&DemandDailyAllocation {
                    demand_id,
                    team_id,
                    date: slice.date,
                    hours_allocated: slice.hours,
                })?;
            }

            demand.team_id = Some(team_id);
            demand.time_needed = hours;
            demand.start_date = Some(start_date);
            demand.estimated_end_date = Some(end_date);
            demand.assignment_status = true;
            self.repos.demand_repo.update(&demand)?;

            for slice in &slices {
                aggregator.refresh(team_id, slice.date)?;
            }

            Ok(AllocationResult {
                demand_id,
                team_id,
                start_date,
                estimated_end_date: end_date,
                slices,
            })
        })();

        match result {
            Ok(allocation) => {
                self.repos.commit()?;
                tracing::info!(
                    demand_id,
                    team_id,
                    hours,
                    %start_date,
                    estimated_end_date = %allocation.estimated_end_date,
                    "需求分配完成"
                );

                // 提交成功后通知团队成员（尽力而为）
                let message = format!(
                    "团队 {} 收到新需求 (ID {})，预计完工 {}",
                    team.team_name, demand_id, allocation.estimated_end_date
                );
                if let Ok(members) = self.repos.employee_repo.find_by_team(team_id) {
                    for member in members {
                        self.sink.notify_silently(member.employee_id, &message);
                    }
                }

                Ok(allocation)
            }
            Err(e) => {
                self.repos.rollback();
                Err(e)
            }
        }
    }

    /// 释放需求的全部分配（退回未分配状态）
    ///
    /// # 说明
    /// 删除逐日分配行、清空需求的分配字段并刷新受影响日期的汇总。
    pub fn release(&self, demand_id: i64) -> EngineResult<()> {
        let _guard = self.repos.writer_guard()?;

        let mut demand = self
            .repos
            .demand_repo
            .find_by_id(demand_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Demand".to_string(),
                id: demand_id.to_string(),
            })?;

        let aggregator = TeamCapacityAggregator::new(self.repos.clone());

        self.repos.begin_immediate()?;

        let result = (|| -> EngineResult<()> {
            let touched = self.repos.allocation_repo.delete_by_demand(demand_id)?;
            for (team_id, date) in &touched {
                aggregator.refresh(*team_id, *date)?;
            }

            demand.team_id = None;
            demand.assignment_status = false;
            demand.start_date = None;
            demand.estimated_end_date = None;
            self.repos.demand_repo.update(&demand)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.repos.commit()?;
                tracing::info!(demand_id, "需求分配已释放");
                Ok(())
            }
            Err(e) => {
                self.repos.rollback();
                Err(e)
            }
        }
    }
}
