// ==========================================
// 车间作业排产引擎 - 配置层
// ==========================================
// 职责: 运行选项加载与覆写,引擎追踪开关
// 存储: 选项文件 (key|value) + 环境变量
// ==========================================

pub mod planning_config_trait;
pub mod run_options;
pub mod trace;

// 重导出核心配置类型
pub use planning_config_trait::{OutputFormat, PlanningConfigReader};
pub use run_options::{config_keys, ConfigError, RunOptions};
pub use trace::TraceOptions;
