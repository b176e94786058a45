// ==========================================
// 团队产能规划系统 - 人员领域模型
// ==========================================
// 职责: 用户/经理/员工实体与按日产能覆盖
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// User - 登录账号
// ==========================================
// 角色档案 (Manager/Employee) 由角色变更操作显式同步,
// 不做隐式的"保存即联动"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub is_manager: bool,
}

impl User {
    /// 展示名称（全名优先，其次用户名）
    pub fn display_name(&self) -> &str {
        match &self.full_name {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

// ==========================================
// Manager - 经理档案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manager {
    pub manager_id: i64,
    pub user_id: i64,
}

// ==========================================
// Employee - 员工档案
// ==========================================
// 约束: 至多属于一个团队; standard_daily_capacity 为默认日产能,
// 可被 capacity_override 按日覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub employee_id: i64,
    pub user_id: i64,
    pub team_id: Option<i64>,
    pub standard_daily_capacity: f64,
}

// ==========================================
// CapacityOverride - 按日产能覆盖
// ==========================================
// 唯一: (employee_id, date); 仅覆盖该员工该日的有效产能
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityOverride {
    pub employee_id: i64,
    pub date: NaiveDate,
    pub capacity_hours: f64,
}
