// ==========================================
// 团队产能规划系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户友好的错误消息
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 产能冲突（变更冲突或分配排不下）
    #[error("产能冲突: {0}")]
    CapacityConflict(String),

    #[error("无效的状态转换: from={from} to={to}")]
    InvalidStateTransition { from: String, to: String },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// 目的: 引擎层业务错误按类别归并，保留原始错误消息
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRange { .. }
            | EngineError::InvalidCapacity { .. }
            | EngineError::InvalidSpan { .. }
            | EngineError::TooSoon { .. }
            | EngineError::InvalidHours { .. } => ApiError::InvalidInput(err.to_string()),

            EngineError::NoTeam { .. }
            | EngineError::AlreadyAssigned { .. }
            | EngineError::InvalidState { .. }
            | EngineError::TeamFull { .. }
            | EngineError::NoTeamAssigned { .. } => ApiError::BusinessRuleViolation(err.to_string()),

            EngineError::CapacityClash { .. } | EngineError::CapacityExceeded { .. } => {
                ApiError::CapacityConflict(err.to_string())
            }

            EngineError::TeamNotFound { team_id } => {
                ApiError::NotFound(format!("Team(id={})不存在", team_id))
            }

            EngineError::InvalidStatusTransition { from, to } => {
                ApiError::InvalidStateTransition { from, to }
            }

            EngineError::Repository(e) => e.into(),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

/// 解析 YYYY-MM-DD 格式的日期字符串
pub fn parse_date_param(field: &str, value: &str) -> ApiResult<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::InvalidInput(format!("字段{}格式非法: {} (期望 YYYY-MM-DD)", field, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        let repo_err = RepositoryError::NotFound {
            entity: "Demand".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Demand"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }
    }

    #[test]
    fn test_engine_error_conversion() {
        let err = EngineError::AlreadyAssigned { demand_id: 7 };
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::BusinessRuleViolation(_)));

        let err = EngineError::TeamNotFound { team_id: 3 };
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::NotFound(_)));

        let err = EngineError::CapacityExceeded {
            team_id: 1,
            remaining_hours: 12.0,
            days_attempted: 30,
        };
        let api_err: ApiError = err.into();
        assert!(matches!(api_err, ApiError::CapacityConflict(_)));
    }

    #[test]
    fn test_parse_date_param() {
        assert!(parse_date_param("start_date", "2026-03-02").is_ok());
        assert!(parse_date_param("start_date", "02/03/2026").is_err());
        assert!(parse_date_param("start_date", "").is_err());
    }
}
