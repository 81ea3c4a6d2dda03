// ==========================================
// 车间作业排产引擎 - 领域模型层
// ==========================================
// 职责: 定义排产图节点、值类型、错误类型
// 红线: 不含算法逻辑,不含文件解析
// ==========================================

pub mod calendar;
pub mod demand;
pub mod error;
pub mod model;
pub mod plan;
pub mod request;
pub mod task;
pub mod task_plan;
pub mod types;
pub mod work_order;
pub mod workcenter;

// 重导出核心类型
pub use calendar::{Calendar, CalendarShift, DateRange, WORKING_EPSILON};
pub use demand::Demand;
pub use error::{PlanningError, PlanningResult};
pub use model::PlanningModel;
pub use plan::{param_keys, Plan, PlanParams};
pub use request::{Promise, Request};
pub use task::{Sku, Task, WorkcenterAssignment};
pub use task_plan::TaskPlan;
pub use types::{
    CalendarId, CalendarType, DemandId, Direction, NodeRef, PartitionId, PlanId, SkuId, TaskId,
    TaskPlanId, WorkOrderId, WorkcenterId,
};
pub use work_order::ReleasedWorkOrder;
pub use workcenter::Workcenter;
