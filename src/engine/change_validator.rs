// ==========================================
// 团队产能规划系统 - 产能变更校验器
// ==========================================
// 职责: 校验并登记产能变更请求（提交即校验，审批后生效）
// 规则: 逐日冲突扫描，delta = 新产能 - 当日有效产能
// ==========================================

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::PlanningConfig;
use crate::domain::request::CapacityChangeRequest;
use crate::domain::types::RequestStatus;
use crate::engine::aggregator::TeamCapacityAggregator;
use crate::engine::capacity_ledger::CapacityLedger;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::PlanningRepositories;
use crate::engine::simulator::EPSILON;
use crate::repository::RepositoryError;

/// 产能变更校验器
///
/// 员工提交产能变更需满足: 日期范围合法、跨度受限、提前期充足、
/// 已加入团队，且变更后任意一天的团队产能不得低于已承诺工时。
pub struct CapacityChangeValidator {
    repos: PlanningRepositories,
    config: PlanningConfig,
}

impl CapacityChangeValidator {
    /// 创建校验器
    pub fn new(repos: PlanningRepositories, config: PlanningConfig) -> Self {
        Self { repos, config }
    }

    /// 校验并提交产能变更请求（以当前日期为基准）
    ///
    /// # 返回
    /// 登记成功的请求 ID
    pub fn check_and_submit(
        &self,
        employee_id: i64,
        new_capacity: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> EngineResult<String> {
        self.check_and_submit_at(
            employee_id,
            new_capacity,
            start_date,
            end_date,
            Utc::now().date_naive(),
        )
    }

    /// 校验并提交产能变更请求（显式基准日期，供测试使用）
    ///
    /// # 参数
    /// - today: 提前期校验的基准日期
    pub fn check_and_submit_at(
        &self,
        employee_id: i64,
        new_capacity: f64,
        start_date: NaiveDate,
        end_date: NaiveDate,
        today: NaiveDate,
    ) -> EngineResult<String> {
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

        let request = CapacityChangeRequest {
            request_id: Uuid::new_v4().to_string(),
            employee_id,
            new_capacity,
            start_date,
            end_date,
            status: RequestStatus::Pending,
        };
        if request.span_days() > self.config.max_request_span_days {
            return Err(EngineError::InvalidSpan {
                days: request.span_days(),
                max: self.config.max_request_span_days,
            });
        }

        if start_date < today + Duration::days(self.config.min_request_lead_days) {
            return Err(EngineError::TooSoon {
                start: start_date,
                min_lead: self.config.min_request_lead_days,
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
        let team_id = employee
            .team_id
            .ok_or(EngineError::NoTeam { employee_id })?;

        // 逐日冲突扫描: 变更后团队产能不得低于已承诺工时
        let ledger = CapacityLedger::new(self.repos.clone(), self.config.clone());
        let aggregator = TeamCapacityAggregator::new(self.repos.clone());
        let mut clash_dates: Vec<NaiveDate> = Vec::new();
        let mut date = start_date;
        while date <= end_date {
            let current = ledger.effective_capacity(&employee, date)?;
            let delta = new_capacity - current;
            let total = aggregator.total_capacity(team_id, date)?;
            let committed = aggregator.hours_committed(team_id, date)?;
            if total + delta < committed - EPSILON {
                clash_dates.push(date);
            }
            date += Duration::days(1);
        }
        if !clash_dates.is_empty() {
            return Err(EngineError::CapacityClash {
                dates: clash_dates,
            });
        }

        self.repos.capacity_request_repo.insert(&request)?;

        tracing::info!(
            request_id = %request.request_id,
            employee_id,
            new_capacity,
            %start_date,
            %end_date,
            "产能变更请求已登记"
        );
        Ok(request.request_id)
    }
}
