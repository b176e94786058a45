// ==========================================
// 团队产能规划系统 - 用户 API
// ==========================================
// 职责: 用户创建与角色档案同步
// 规则: is_manager 标志与 manager/employee 档案保持一致
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::engine::repositories::PlanningRepositories;

/// 新员工档案的默认日产能（小时）
const DEFAULT_STANDARD_DAILY_CAPACITY: f64 = 8.0;

/// 用户 API
///
/// 职责：
/// 1. 创建用户并按角色建立对应档案
/// 2. 角色切换时同步 manager/employee 档案
pub struct UserApi {
    repos: PlanningRepositories,
}

impl UserApi {
    /// 创建新的 UserApi 实例
    pub fn new(repos: PlanningRepositories) -> Self {
        Self { repos }
    }

    /// 创建用户
    ///
    /// # 说明
    /// 经理用户建立 manager 档案，普通用户建立 employee 档案
    /// （默认日产能 8 小时）。
    pub fn create_user(
        &self,
        username: &str,
        full_name: Option<&str>,
        is_manager: bool,
    ) -> ApiResult<i64> {
        if username.trim().is_empty() {
            return Err(ApiError::InvalidInput("用户名不能为空".to_string()));
        }

        let user_id = self
            .repos
            .user_repo
            .insert(username.trim(), full_name, is_manager)?;

        if is_manager {
            self.ensure_manager_profile(user_id)?;
        } else {
            self.ensure_employee_profile(user_id)?;
        }

        tracing::info!(user_id, username, is_manager, "用户已创建");
        Ok(user_id)
    }

    /// 切换用户角色并同步档案
    pub fn set_manager_role(&self, user_id: i64, is_manager: bool) -> ApiResult<()> {
        let user = self
            .repos
            .user_repo
            .find_by_id(user_id)?
            .ok_or_else(|| ApiError::NotFound(format!("User(id={})不存在", user_id)))?;

        self.repos.user_repo.update_is_manager(user_id, is_manager)?;
        if is_manager {
            self.ensure_manager_profile(user_id)?;
        } else {
            self.ensure_employee_profile(user_id)?;
        }
        tracing::info!(user_id, user = user.display_name(), is_manager, "用户角色已更新");
        Ok(())
    }

    /// 确保用户持有经理档案（并移除员工档案）
    fn ensure_manager_profile(&self, user_id: i64) -> ApiResult<()> {
        self.repos.manager_repo.insert_if_absent(user_id)?;
        self.repos.employee_repo.delete_by_user(user_id)?;
        Ok(())
    }

    /// 确保用户持有员工档案（并移除经理档案）
    fn ensure_employee_profile(&self, user_id: i64) -> ApiResult<()> {
        self.repos
            .employee_repo
            .insert_if_absent(user_id, DEFAULT_STANDARD_DAILY_CAPACITY)?;
        self.repos.manager_repo.delete_by_user(user_id)?;
        Ok(())
    }
}
