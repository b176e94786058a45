// ==========================================
// 团队产能规划系统 - 团队 API
// ==========================================
// 职责: 团队创建、成员管理与时效统计查询
// 规则: 成员数受 max_team_members 上限约束
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::PlanningConfig;
use crate::engine::error::EngineError;
use crate::engine::events::OptionalNotificationSink;
use crate::engine::repositories::PlanningRepositories;

// ==========================================
// DTO 定义
// ==========================================

/// 团队时效统计 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamStatsDto {
    pub team_id: i64,
    pub team_name: String,
    pub member_count: usize,
    pub on_time_completions: i64,
    pub overdue_demands: i64,
    pub early_completion: i64,
}

// ==========================================
// TeamApi
// ==========================================

/// 团队 API
///
/// 职责：
/// 1. 创建团队
/// 2. 成员加入/移出（带人数上限与通知）
/// 3. 时效统计查询
pub struct TeamApi {
    repos: PlanningRepositories,
    config: PlanningConfig,
    sink: OptionalNotificationSink,
}

impl TeamApi {
    /// 创建新的 TeamApi 实例
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

    /// 创建团队
    pub fn create_team(&self, team_name: &str, manager_id: Option<i64>) -> ApiResult<i64> {
        if team_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("团队名不能为空".to_string()));
        }
        let team_id = self.repos.team_repo.insert(team_name.trim(), manager_id)?;
        tracing::info!(team_id, team_name, "团队已创建");
        Ok(team_id)
    }

    /// 将员工加入团队
    ///
    /// # 规则
    /// - 员工已在该团队时为幂等空操作
    /// - 成员数达到上限时拒绝 (TeamFull)
    /// - 加入成功后通知该员工
    pub fn add_member(&self, team_id: i64, employee_id: i64) -> ApiResult<()> {
        let team = self
            .repos
            .team_repo
            .find_by_id(team_id)?
            .ok_or(EngineError::TeamNotFound { team_id })?;
        let employee = self
            .repos
            .employee_repo
            .find_by_id(employee_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Employee(id={})不存在", employee_id)))?;

        if employee.team_id == Some(team_id) {
            return Ok(());
        }

        let member_count = self.repos.employee_repo.count_by_team(team_id)?;
        if member_count >= self.config.max_team_members {
            return Err(EngineError::TeamFull {
                team_id,
                max: self.config.max_team_members,
            }
            .into());
        }

        self.repos.employee_repo.update_team(employee_id, Some(team_id))?;
        self.sink.notify_silently(
            employee_id,
            &format!("你已加入团队 {}", team.team_name),
        );
        tracing::info!(team_id, employee_id, "成员已加入团队");
        Ok(())
    }

    /// 将员工移出团队
    ///
    /// # 规则
    /// 员工不在该团队时为幂等空操作。
    pub fn remove_member(&self, team_id: i64, employee_id: i64) -> ApiResult<()> {
        let team = self
            .repos
            .team_repo
            .find_by_id(team_id)?
            .ok_or(EngineError::TeamNotFound { team_id })?;
        let employee = self
            .repos
            .employee_repo
            .find_by_id(employee_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Employee(id={})不存在", employee_id)))?;

        if employee.team_id != Some(team_id) {
            return Ok(());
        }

        self.repos.employee_repo.update_team(employee_id, None)?;
        self.sink.notify_silently(
            employee_id,
            &format!("你已移出团队 {}", team.team_name),
        );
        tracing::info!(team_id, employee_id, "成员已移出团队");
        Ok(())
    }

    /// 查询团队时效统计
    pub fn team_stats(&self, team_id: i64) -> ApiResult<TeamStatsDto> {
        let team = self
            .repos
            .team_repo
            .find_by_id(team_id)?
            .ok_or(EngineError::TeamNotFound { team_id })?;
        let member_count = self.repos.employee_repo.count_by_team(team_id)?;

        Ok(TeamStatsDto {
            team_id: team.team_id,
            team_name: team.team_name,
            member_count,
            on_time_completions: team.on_time_completions,
            overdue_demands: team.overdue_demands,
            early_completion: team.early_completion,
        })
    }

    /// 查询全部团队统计
    pub fn list_team_stats(&self) -> ApiResult<Vec<TeamStatsDto>> {
        let teams = self.repos.team_repo.list_all()?;
        let mut stats = Vec::with_capacity(teams.len());
        for team in teams {
            let member_count = self.repos.employee_repo.count_by_team(team.team_id)?;
            stats.push(TeamStatsDto {
                team_id: team.team_id,
                team_name: team.team_name,
                member_count,
                on_time_completions: team.on_time_completions,
                overdue_demands: team.overdue_demands,
                early_completion: team.early_completion,
            });
        }
        Ok(stats)
    }
}
