// ==========================================
// 团队产能规划系统 - 引擎层通知发布
// ==========================================
// 职责: 定义员工通知 trait，实现依赖倒置
// 说明: Engine 层定义 trait，仓储实现做默认适配器
// 约束: 通知为尽力而为 (fire-and-forget)，失败不影响主流程
// ==========================================

use std::error::Error;
use std::sync::Arc;

use crate::repository::NotificationRepository;

// ==========================================
// 通知发布 Trait
// ==========================================

/// 员工通知发布者 Trait
///
/// Engine 层定义，默认由 RepositoryNotificationSink 实现落库。
/// 通过 trait 解耦，单元测试可注入 NoOpNotificationSink。
pub trait NotificationSink: Send + Sync {
    /// 向单个员工发送通知
    ///
    /// # 参数
    /// - `employee_id`: 员工 ID
    /// - `message`: 通知内容
    fn notify(&self, employee_id: i64, message: &str) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作通知发布者
///
/// 用于不需要通知的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpNotificationSink;

impl NotificationSink for NoOpNotificationSink {
    fn notify(&self, employee_id: i64, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpNotificationSink: 跳过通知 - employee_id={}, message={}",
            employee_id,
            message
        );
        Ok(())
    }
}

/// 落库通知发布者
///
/// 将通知写入 notification 表
pub struct RepositoryNotificationSink {
    repo: Arc<NotificationRepository>,
}

impl RepositoryNotificationSink {
    /// 创建落库通知发布者
    pub fn new(repo: Arc<NotificationRepository>) -> Self {
        Self { repo }
    }
}

impl NotificationSink for RepositoryNotificationSink {
    fn notify(&self, employee_id: i64, message: &str) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.repo
            .insert(employee_id, message)
            .map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;
        Ok(())
    }
}

/// 可选的通知发布者包装
///
/// 简化 Option<Arc<dyn NotificationSink>> 的使用
#[derive(Clone)]
pub struct OptionalNotificationSink {
    inner: Option<Arc<dyn NotificationSink>>,
}

impl OptionalNotificationSink {
    /// 创建带发布者的实例
    pub fn with_sink(sink: Arc<dyn NotificationSink>) -> Self {
        Self { inner: Some(sink) }
    }

    /// 创建空实例（不发送通知）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发送通知，失败仅记录日志
    ///
    /// # 约束
    /// 通知失败不得影响主流程（分配/审批已提交成功）
    pub fn notify_silently(&self, employee_id: i64, message: &str) {
        if let Some(sink) = &self.inner {
            if let Err(e) = sink.notify(employee_id, message) {
                tracing::warn!(
                    "通知发送失败（已忽略）- employee_id={}, error={}",
                    employee_id,
                    e
                );
            }
        } else {
            tracing::debug!(
                "OptionalNotificationSink: 未配置发布者，跳过通知 - employee_id={}",
                employee_id
            );
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalNotificationSink {
    fn default() -> Self {
        Self::none()
    }
}
