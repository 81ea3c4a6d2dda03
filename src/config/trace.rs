// ==========================================
// 车间作业排产引擎 - 追踪日志开关
// ==========================================
// 职责: 显式日志句柄,由调用方配置一次后传入引擎
// 红线: 不使用全局调试级别
// ==========================================

use serde::{Deserialize, Serialize};

/// 引擎追踪开关
///
/// 控制 trace 级别的高频日志 (二分查找收敛过程、班次遍历、逐跳请求),
/// 是否真正输出仍由 tracing 订阅者的过滤器决定
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceOptions {
    pub calendar_search: bool, // 班次二分查找
    pub calendar_walk: bool,   // 班次遍历 / 工时累计
    pub propagation: bool,     // 请求/承诺逐跳传播
}

impl TraceOptions {
    /// 全部关闭
    pub fn quiet() -> Self {
        Self::default()
    }

    /// 全部开启
    pub fn verbose() -> Self {
        Self {
            calendar_search: true,
            calendar_walk: true,
            propagation: true,
        }
    }
}
