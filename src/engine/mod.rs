// ==========================================
// 车间作业排产引擎 - 引擎层
// ==========================================
// 职责: 日历换算、请求/承诺传播、已下达工单分配、分区标记、求解驱动
// 红线: 引擎不解析文件,所有失败立即向上传播
// ==========================================

pub mod calendar_engine;
pub mod partition;
pub mod propagation;
pub mod released_supply;
pub mod solver;
pub mod workcenter_query;

// 重导出核心引擎
pub use calendar_engine::CalendarEngine;
pub use partition::{assign_partitions, propagate_partition_id, PartitionGraph, PartitionMap};
pub use propagation::PlanningEngine;
pub use solver::{PlanSummary, SimpleSolver, StaticAnalysis};
pub use workcenter_query::{Placement, WorkcenterQuery};
