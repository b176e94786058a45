// ==========================================
// 团队产能规划系统 - 产能 API
// ==========================================
// 职责: 产能变更请求的提交、审批与剩余产能查询
// 说明: 请求提交即校验，审批通过才落台账
// ==========================================

use serde::{Deserialize, Serialize};

use crate::api::error::{parse_date_param, ApiResult};
use crate::config::PlanningConfig;
use crate::domain::types::RequestStatus;
use crate::engine::aggregator::TeamCapacityAggregator;
use crate::engine::capacity_ledger::CapacityLedger;
use crate::engine::change_validator::CapacityChangeValidator;
use crate::engine::events::OptionalNotificationSink;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::simulator::FreeCapacityView;

// ==========================================
// DTO 定义
// ==========================================

/// 产能变更请求 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCapacityRequest {
    pub employee_id: i64,
    pub new_capacity: f64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub end_date: String,
}

/// 产能变更响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeCapacityResponse {
    pub request_id: String,
    pub message: String,
}

/// 待审批请求 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingCapacityRequestDto {
    pub request_id: String,
    pub employee_id: i64,
    pub new_capacity: f64,
    pub start_date: String,
    pub end_date: String,
}

// ==========================================
// CapacityApi
// ==========================================

/// 产能 API
///
/// 职责：
/// 1. 提交产能变更请求（提交即做全量校验）
/// 2. 审批产能变更（通过则写台账并刷新汇总）
/// 3. 查询团队单日剩余产能
pub struct CapacityApi {
    repos: PlanningRepositories,
    config: PlanningConfig,
    sink: OptionalNotificationSink,
}

impl CapacityApi {
    /// 创建新的 CapacityApi 实例
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

    /// 提交产能变更请求
    ///
    /// # 校验链
    /// 日期范围 → 产能值 → 跨度 → 提前期 → 所属团队 → 逐日冲突扫描
    pub fn change_capacity(
        &self,
        request: ChangeCapacityRequest,
    ) -> ApiResult<ChangeCapacityResponse> {
        let start_date = parse_date_param("start_date", &request.start_date)?;
        let end_date = parse_date_param("end_date", &request.end_date)?;

        let validator = CapacityChangeValidator::new(self.repos.clone(), self.config.clone());
        let request_id = validator.check_and_submit(
            request.employee_id,
            request.new_capacity,
            start_date,
            end_date,
        )?;

        Ok(ChangeCapacityResponse {
            request_id,
            message: "产能变更请求已登记，等待审批".to_string(),
        })
    }

    /// 审批产能变更请求
    ///
    /// # 参数
    /// - request_id: 请求 ID
    /// - approve: true=批准, false=拒绝
    ///
    /// # 返回
    /// - Ok(true): 请求已处理
    /// - Ok(false): 请求不存在（可能已被处理）
    ///
    /// # 失败语义
    /// 批准后落台账失败时，请求标记为 Rejected 并保留行，错误向上返回。
    pub fn approve_capacity_change(&self, request_id: &str, approve: bool) -> ApiResult<bool> {
        let request = match self.repos.capacity_request_repo.find_by_id(request_id)? {
            Some(r) => r,
            None => return Ok(false),
        };

        if !approve {
            self.repos
                .capacity_request_repo
                .update_status(request_id, RequestStatus::Rejected)?;
            self.sink.notify_silently(
                request.employee_id,
                &format!(
                    "产能变更请求已被拒绝（{} ~ {}）",
                    request.start_date, request.end_date
                ),
            );
            self.repos.capacity_request_repo.delete(request_id)?;
            tracing::info!(request_id, "产能变更请求已拒绝");
            return Ok(true);
        }

        let ledger = CapacityLedger::new(self.repos.clone(), self.config.clone());
        if let Err(e) = ledger.set_capacity_for_range(
            request.employee_id,
            request.new_capacity,
            request.start_date,
            request.end_date,
        ) {
            // 落台账失败: 请求转为 Rejected 但保留，便于排查
            self.repos
                .capacity_request_repo
                .update_status(request_id, RequestStatus::Rejected)?;
            self.sink.notify_silently(
                request.employee_id,
                &format!(
                    "产能变更请求批准失败（{} ~ {}）: {}",
                    request.start_date, request.end_date, e
                ),
            );
            tracing::warn!(request_id, error = %e, "产能变更批准后落账失败");
            return Err(e.into());
        }

        self.repos
            .capacity_request_repo
            .update_status(request_id, RequestStatus::Approved)?;
        self.sink.notify_silently(
            request.employee_id,
            &format!(
                "产能变更请求已批准（{} ~ {}，{} 小时/日）",
                request.start_date, request.end_date, request.new_capacity
            ),
        );
        self.repos.capacity_request_repo.delete(request_id)?;
        tracing::info!(request_id, "产能变更请求已批准");
        Ok(true)
    }

    /// 查询待审批请求列表
    pub fn list_pending_requests(&self) -> ApiResult<Vec<PendingCapacityRequestDto>> {
        let requests = self.repos.capacity_request_repo.list_pending()?;
        Ok(requests
            .into_iter()
            .map(|r| PendingCapacityRequestDto {
                request_id: r.request_id,
                employee_id: r.employee_id,
                new_capacity: r.new_capacity,
                start_date: r.start_date.format("%Y-%m-%d").to_string(),
                end_date: r.end_date.format("%Y-%m-%d").to_string(),
            })
            .collect())
    }

    /// 查询团队单日剩余可分配产能
    pub fn free_capacity(&self, team_id: i64, date: &str) -> ApiResult<f64> {
        let date = parse_date_param("date", date)?;
        let aggregator = TeamCapacityAggregator::new(self.repos.clone());
        Ok(aggregator.free_capacity(team_id, date)?)
    }
}
