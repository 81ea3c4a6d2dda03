// ==========================================
// 车间作业排产引擎 - 核心库
// ==========================================
// 系统定位: 有限能力排产 (日历可用性 + 请求/承诺供给传播)
// 数据来源: 平面 CSV 文件
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 排产图节点与值类型
pub mod domain;

// 引擎层 - 日历计算 / 供给传播 / 求解
pub mod engine;

// 导入层 - 平面文件加载
pub mod importer;

// 配置层 - 运行选项
pub mod config;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 结果报告
pub mod report;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    Calendar, CalendarShift, DateRange, Demand, Plan, PlanningError, PlanningModel,
    PlanningResult, Promise, ReleasedWorkOrder, Request, Sku, Task, TaskPlan, Workcenter,
};

// 引擎
pub use engine::{
    assign_partitions, CalendarEngine, PartitionMap, PlanSummary, PlanningEngine, SimpleSolver,
    WorkcenterQuery,
};

// 导入
pub use importer::{FlatFileLoader, LoadError};

// 配置
pub use config::{PlanningConfigReader, RunOptions, TraceOptions};

// 报告
pub use report::PlanReport;

// ==========================================
// 版本信息
// ==========================================

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "车间作业排产引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
