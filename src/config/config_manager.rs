// ==========================================
// 团队产能规划系统 - 配置管理器
// ==========================================
// 职责: 规划参数加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// PlanningConfig - 规划参数集
// ==========================================

/// 规划参数集
///
/// 所有引擎共用的可配置参数，默认值在 Default 中给出。
#[derive(Debug, Clone)]
pub struct PlanningConfig {
    /// 单人单日产能上限（小时）
    pub daily_capacity_cap_hours: f64,
    /// 模拟推进天数上限（超过则判不可行）
    pub max_simulation_days: u32,
    /// 产能变更请求最小提前期（天）
    pub min_request_lead_days: i64,
    /// 产能变更请求最大跨度（天）
    pub max_request_span_days: i64,
    /// 团队成员数上限
    pub max_team_members: usize,
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            daily_capacity_cap_hours: 24.0,
            max_simulation_days: 30,
            min_request_lead_days: 7,
            max_request_span_days: 24,
            max_team_members: 6,
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================

/// 配置管理器
/// 职责: 从 config_kv 表加载规划参数，缺键时回落默认值
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_f64_or(&self, key: &str, default: f64) -> RepositoryResult<f64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(default))
    }

    fn get_i64_or(&self, key: &str, default: i64) -> RepositoryResult<i64> {
        Ok(self
            .get_config_value(key)?
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(default))
    }

    /// 加载完整规划参数集
    ///
    /// # 说明
    /// 缺键或解析失败时回落 Default 值，不报错。
    pub fn load(&self) -> RepositoryResult<PlanningConfig> {
        let defaults = PlanningConfig::default();
        Ok(PlanningConfig {
            daily_capacity_cap_hours: self.get_f64_or(
                config_keys::DAILY_CAPACITY_CAP_HOURS,
                defaults.daily_capacity_cap_hours,
            )?,
            max_simulation_days: self
                .get_i64_or(config_keys::MAX_SIMULATION_DAYS, defaults.max_simulation_days as i64)?
                .max(1) as u32,
            min_request_lead_days: self.get_i64_or(
                config_keys::MIN_REQUEST_LEAD_DAYS,
                defaults.min_request_lead_days,
            )?,
            max_request_span_days: self.get_i64_or(
                config_keys::MAX_REQUEST_SPAN_DAYS,
                defaults.max_request_span_days,
            )?,
            max_team_members: self
                .get_i64_or(config_keys::MAX_TEAM_MEMBERS, defaults.max_team_members as i64)?
                .max(1) as usize,
        })
    }

    /// 导出 global scope 的全量配置快照（JSON 字符串）
    ///
    /// # 用途
    /// 跨库迁移规划参数，或在调参前留档
    pub fn export_snapshot(&self) -> RepositoryResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        serde_json::to_string(&config_map)
            .map_err(|e| RepositoryError::InternalError(format!("配置快照序列化失败: {}", e)))
    }

    /// 导入配置快照（逐键 UPSERT，不删除快照外的已有键）
    pub fn import_snapshot(&self, snapshot_json: &str) -> RepositoryResult<()> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)
            .map_err(|e| RepositoryError::ValidationError(format!("配置快照解析失败: {}", e)))?;

        for (key, value) in &config_map {
            self.set_global_config_value(key, value)?;
        }
        tracing::info!(keys = config_map.len(), "配置快照已导入");
        Ok(())
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 产能
    pub const DAILY_CAPACITY_CAP_HOURS: &str = "daily_capacity_cap_hours";

    // 模拟
    pub const MAX_SIMULATION_DAYS: &str = "max_simulation_days";

    // 产能变更请求
    pub const MIN_REQUEST_LEAD_DAYS: &str = "min_request_lead_days";
    pub const MAX_REQUEST_SPAN_DAYS: &str = "max_request_span_days";

    // 团队
    pub const MAX_TEAM_MEMBERS: &str = "max_team_members";
}
