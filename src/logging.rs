// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::TraceOptions;

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=jobshop_aps=trace
///
/// 未设置 RUST_LOG 且开启了任一追踪开关时，默认提升到 trace，
/// 否则引擎的 trace 日志会被过滤掉
///
/// # 示例
/// ```no_run
/// use jobshop_aps::{config::TraceOptions, logging};
/// logging::init(TraceOptions::quiet(), false);
/// ```
pub fn init(trace: TraceOptions, json: bool) {
    let default_level = if trace.calendar_search || trace.calendar_walk || trace.propagation {
        "jobshop_aps=trace,info"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // 日志写到 stderr，stdout 留给排产报告
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
