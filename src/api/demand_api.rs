// ==========================================
// 团队产能规划系统 - 需求 API
// ==========================================
// 职责: 需求创建、分配、状态更新、交期可达性查询、编辑请求审批
// ==========================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::{parse_date_param, ApiError, ApiResult};
use crate::config::PlanningConfig;
use crate::domain::request::DemandEditRequest;
use crate::domain::types::{AllocationMode, DemandStatus, RequestStatus};
use crate::engine::aggregator::TeamCapacityAggregator;
use crate::engine::allocator::DemandAllocator;
use crate::engine::events::OptionalNotificationSink;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::simulator::{AllocationSimulator, SimulationOutcome};
use crate::engine::status::DemandStatusEngine;

// ==========================================
// DTO 定义
// ==========================================

/// 需求分配请求 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDemandRequest {
    pub demand_id: i64,
    pub team_id: i64,
    pub hours: f64,
    /// YYYY-MM-DD
    pub start_date: String,
}

/// 单日分配 DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyAllocationDto {
    pub date: String,
    pub hours: f64,
}

/// 需求分配响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDemandResponse {
    pub demand_id: i64,
    pub team_id: i64,
    pub start_date: String,
    pub estimated_end_date: String,
    pub daily_allocations: Vec<DailyAllocationDto>,
}

/// 交期可达性查询请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadlineQueryRequest {
    pub hours: f64,
    /// YYYY-MM-DD
    pub start_date: String,
    /// YYYY-MM-DD
    pub desired_end_date: String,
}

// ==========================================
// DemandApi
// ==========================================

/// 需求 API
///
/// 职责：
/// 1. 创建需求
/// 2. 分配需求到团队（原子操作）
/// 3. 需求状态更新（状态机）
/// 4. 查询可在指定交期内完成需求的团队
/// 5. 需求编辑请求的提交与审批
pub struct DemandApi {
    repos: PlanningRepositories,
    config: PlanningConfig,
    sink: OptionalNotificationSink,
}

impl DemandApi {
    /// 创建新的 DemandApi 实例
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

    /// 创建需求（初始 Pending、未分配）
    pub fn create_demand(
        &self,
        demand_name: Option<&str>,
        allocation_mode: AllocationMode,
    ) -> ApiResult<i64> {
        let demand_id = self.repos.demand_repo.insert(demand_name, allocation_mode)?;
        tracing::info!(demand_id, "需求已创建");
        Ok(demand_id)
    }

    /// 将需求分配给团队
    ///
    /// # 失败语义
    /// 任一校验或产能不足时整体失败，数据库无任何变化。
    pub fn assign_demand(&self, request: AssignDemandRequest) -> ApiResult<AssignDemandResponse> {
        let start_date = parse_date_param("start_date", &request.start_date)?;

        let allocator = DemandAllocator::new(self.repos.clone(), self.config.clone(), self.sink.clone());
        let result = allocator.assign(request.demand_id, request.team_id, request.hours, start_date)?;

        Ok(AssignDemandResponse {
            demand_id: result.demand_id,
            team_id: result.team_id,
            start_date: result.start_date.format("%Y-%m-%d").to_string(),
            estimated_end_date: result.estimated_end_date.format("%Y-%m-%d").to_string(),
            daily_allocations: result
                .slices
                .into_iter()
                .map(|s| DailyAllocationDto {
                    date: s.date.format("%Y-%m-%d").to_string(),
                    hours: s.hours,
                })
                .collect(),
        })
    }

    /// 更新需求完成状态
    ///
    /// # 参数
    /// - status: PENDING / IN_PROGRESS / FINISHED
    pub fn update_demand_status(&self, demand_id: i64, status: &str) -> ApiResult<()> {
        let new_status = DemandStatus::parse(status)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知的需求状态: {}", status)))?;

        let engine = DemandStatusEngine::new(self.repos.clone(), self.sink.clone());
        engine.update_status(demand_id, new_status)?;
        Ok(())
    }

    /// 查询可在指定交期内完成需求的团队 ID 列表
    ///
    /// # 说明
    /// 对每个团队做纯模拟，不产生任何写入。
    pub fn get_teams_meeting_deadline(
        &self,
        request: DeadlineQueryRequest,
    ) -> ApiResult<Vec<i64>> {
        if request.hours < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "需求工时非法: {} (必须非负)",
                request.hours
            )));
        }
        let start_date = parse_date_param("start_date", &request.start_date)?;
        let desired_end = parse_date_param("desired_end_date", &request.desired_end_date)?;
        if start_date > desired_end {
            return Err(ApiError::InvalidInput(format!(
                "起始日期 {} 晚于期望交期 {}",
                start_date, desired_end
            )));
        }

        let aggregator = TeamCapacityAggregator::new(self.repos.clone());
        let simulator = AllocationSimulator::new(self.config.max_simulation_days);

        let mut qualified = Vec::new();
        for team in self.repos.team_repo.list_all()? {
            let outcome = simulator.simulate(&aggregator, team.team_id, start_date, request.hours)?;
            if let SimulationOutcome::Feasible { end_date, .. } = outcome {
                if end_date <= desired_end {
                    qualified.push(team.team_id);
                }
            }
        }
        Ok(qualified)
    }

    /// 提交需求编辑请求（改名/改状态，等待审批）
    pub fn submit_edit_request(
        &self,
        demand_id: i64,
        employee_id: i64,
        new_name: Option<String>,
        new_status: Option<&str>,
    ) -> ApiResult<String> {
        // 需求必须存在
        self.repos
            .demand_repo
            .find_by_id(demand_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Demand(id={})不存在", demand_id)))?;

        let new_status = match new_status {
            Some(s) => Some(
                DemandStatus::parse(s)
                    .ok_or_else(|| ApiError::InvalidInput(format!("未知的需求状态: {}", s)))?,
            ),
            None => None,
        };
        if new_name.is_none() && new_status.is_none() {
            return Err(ApiError::InvalidInput(
                "编辑请求至少需要一个变更项".to_string(),
            ));
        }

        let request = DemandEditRequest {
            request_id: Uuid::new_v4().to_string(),
            demand_id,
            employee_id,
            new_name,
            new_status,
            status: RequestStatus::Pending,
        };
        self.repos.edit_request_repo.insert(&request)?;
        tracing::info!(request_id = %request.request_id, demand_id, "需求编辑请求已登记");
        Ok(request.request_id)
    }

    /// 审批需求编辑请求
    ///
    /// # 返回
    /// - Ok(true): 请求已处理
    /// - Ok(false): 请求不存在
    pub fn handle_edit_request(&self, request_id: &str, approve: bool) -> ApiResult<bool> {
        let request = match self.repos.edit_request_repo.find_by_id(request_id)? {
            Some(r) => r,
            None => return Ok(false),
        };

        if !approve {
            self.repos
                .edit_request_repo
                .update_status(request_id, RequestStatus::Rejected)?;
            self.sink
                .notify_silently(request.employee_id, "需求编辑请求已被拒绝");
            self.repos.edit_request_repo.delete(request_id)?;
            return Ok(true);
        }

        if let Some(name) = &request.new_name {
            let mut demand = self
                .repos
                .demand_repo
                .find_by_id(request.demand_id)?
                .ok_or_else(|| {
                    ApiError::NotFound(format!("Demand(id={})不存在", request.demand_id))
                })?;
            demand.demand_name = Some(name.clone());
            self.repos.demand_repo.update(&demand)?;
        }
        if let Some(status) = request.new_status {
            let engine = DemandStatusEngine::new(self.repos.clone(), self.sink.clone());
            engine.update_status(request.demand_id, status)?;
        }

        self.repos
            .edit_request_repo
            .update_status(request_id, RequestStatus::Approved)?;
        self.sink
            .notify_silently(request.employee_id, "需求编辑请求已批准");
        self.repos.edit_request_repo.delete(request_id)?;
        tracing::info!(request_id, "需求编辑请求已批准");
        Ok(true)
    }
}
