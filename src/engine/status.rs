// ==========================================
// 团队产能规划系统 - 需求状态机
// ==========================================
// 职责: 需求完成状态迁移与团队时效计数
// 迁移: Pending -> InProgress -> Finished（Finished 为终态）
// ==========================================

use chrono::{NaiveDate, Utc};

use crate::domain::demand::Demand;
use crate::domain::types::{CompletionOutcome, DemandStatus};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::OptionalNotificationSink;
use crate::engine::repositories::PlanningRepositories;
use crate::repository::RepositoryError;

/// 需求状态机
///
/// 允许的迁移:
/// - Pending -> InProgress: 盖章开工日期
/// - Pending / InProgress -> Finished: 盖章实际完工日期、解除分配占位、
///   按实际完工与预计完工的天数差递增团队时效计数器
pub struct DemandStatusEngine {
    repos: PlanningRepositories,
    sink: OptionalNotificationSink,
}

impl DemandStatusEngine {
    /// 创建状态机
    pub fn new(repos: PlanningRepositories, sink: OptionalNotificationSink) -> Self {
        Self { repos, sink }
    }

    /// 更新需求状态（以当前日期为盖章基准）
    pub fn update_status(
        &self,
        demand_id: i64,
        new_status: DemandStatus,
    ) -> EngineResult<Demand> {
        self.update_status_at(demand_id, new_status, Utc::now().date_naive())
    }

    /// 更新需求状态（显式盖章日期，供测试使用）
    pub fn update_status_at(
        &self,
        demand_id: i64,
        new_status: DemandStatus,
        today: NaiveDate,
    ) -> EngineResult<Demand> {
        // 写锁先行: 读取状态与提交迁移之间不允许并发写插入
        let _guard = self.repos.writer_guard()?;

        let mut demand = self
            .repos
            .demand_repo
            .find_by_id(demand_id)?
            .ok_or_else(|| RepositoryError::NotFound {
                entity: "Demand".to_string(),
                id: demand_id.to_string(),
            })?;

        let from = demand.completion_status;
        let transition_err = || EngineError::InvalidStatusTransition {
            from: from.to_string(),
            to: new_status.to_string(),
        };

        match (from, new_status) {
            (DemandStatus::Pending, DemandStatus::InProgress) => {
                // 未分配团队的需求不允许开工
                if demand.team_id.is_none() {
                    return Err(EngineError::NoTeamAssigned { demand_id });
                }

                demand.completion_status = DemandStatus::InProgress;
                // 已分配的需求保留计划开工日，不覆盖
                if demand.start_date.is_none() {
                    demand.start_date = Some(today);
                }

                self.repos.begin_immediate()?;
                match self.repos.demand_repo.update(&demand) {
                    Ok(()) => self.repos.commit()?,
                    Err(e) => {
                        self.repos.rollback();
                        return Err(e.into());
                    }
                }
                tracing::info!(demand_id, "需求已开工");
                Ok(demand)
            }
            (DemandStatus::Pending | DemandStatus::InProgress, DemandStatus::Finished) => {
                let team_id = demand
                    .team_id
                    .ok_or(EngineError::NoTeamAssigned { demand_id })?;

                // 实际完工 vs 预计完工 决定时效口径
                let delta_days = match demand.estimated_end_date {
                    Some(estimated) => (today - estimated).num_days(),
                    None => 0,
                };
                let outcome = if delta_days > 0 {
                    CompletionOutcome::Overdue
                } else if delta_days < 0 {
                    CompletionOutcome::Early
                } else {
                    CompletionOutcome::OnTime
                };

                demand.completion_status = DemandStatus::Finished;
                demand.actual_end_date = Some(today);
                demand.assignment_status = false;

                self.repos.begin_immediate()?;
                let result = (|| -> EngineResult<()> {
                    self.repos.demand_repo.update(&demand)?;
                    self.repos.team_repo.increment_outcome_counter(team_id, outcome)?;
                    Ok(())
                })();
                match result {
                    Ok(()) => self.repos.commit()?,
                    Err(e) => {
                        self.repos.rollback();
                        return Err(e);
                    }
                }

                tracing::info!(demand_id, team_id, ?outcome, "需求已完工");

                // 提交后通知团队成员（尽力而为）
                let message = format!(
                    "需求 {} 已完工（{}）",
                    demand.demand_name.as_deref().unwrap_or("未命名"),
                    match outcome {
                        CompletionOutcome::OnTime => "按期",
                        CompletionOutcome::Overdue => "逾期",
                        CompletionOutcome::Early => "提前",
                    }
                );
                if let Ok(members) = self.repos.employee_repo.find_by_team(team_id) {
                    for member in members {
                        self.sink.notify_silently(member.employee_id, &message);
                    }
                }

                Ok(demand)
            }
            _ => Err(transition_err()),
        }
    }
}
