// ==========================================
// 车间作业排产引擎 - 排产错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 所有错误立即向上传播,不做重试
// ==========================================

use chrono::NaiveDateTime;
use thiserror::Error;

/// 排产核心错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanningError {
    // ===== 日历错误 =====
    /// 日历没有任何班次覆盖查询时间点(或班次为空);正确加载的日历不应出现
    #[error("日历覆盖错误 (calendar={calendar}, timestamp={timestamp}): {message}")]
    CalendarCoverage {
        calendar: String,
        timestamp: NaiveDateTime,
        message: String,
    },

    // ===== 模型完整性错误 =====
    #[error("模型完整性错误: {0}")]
    ModelIntegrity(String),

    // ===== 请求错误 =====
    #[error("无效请求: {0}")]
    InvalidRequest(String),
}

impl PlanningError {
    /// 构造日历覆盖错误
    pub fn coverage(calendar: &str, timestamp: NaiveDateTime, message: impl Into<String>) -> Self {
        PlanningError::CalendarCoverage {
            calendar: calendar.to_string(),
            timestamp,
            message: message.into(),
        }
    }

    /// 构造"引用不存在"类的模型完整性错误
    pub fn missing(entity: &str, key: impl std::fmt::Display) -> Self {
        PlanningError::ModelIntegrity(format!("{} 不存在: {}", entity, key))
    }
}

/// Result 类型别名
pub type PlanningResult<T> = Result<T, PlanningError>;
