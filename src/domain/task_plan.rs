// ==========================================
// 车间作业排产引擎 - 工序计划领域模型
// ==========================================
// 红线: 创建后不可变; 仅已下达工单分配时可修改数量/需求
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::calendar::DateRange;
use crate::domain::types::{PlanId, TaskId, WorkOrderId, WorkcenterId};

// ==========================================
// TaskPlan - 工序计划
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPlan {
    pub task: TaskId,                      // 所属工序
    pub plan: PlanId,                      // 所属方案
    pub workcenter: Option<WorkcenterId>,  // 负载的工作中心
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    quantity: i64,
    demand_id: Option<String>,             // 需求ID标签 (松耦合)
    pub work_order: Option<WorkOrderId>,   // 来源工单 (由已下达工单创建时)
}

impl TaskPlan {
    pub fn new(
        task: TaskId,
        plan: PlanId,
        workcenter: Option<WorkcenterId>,
        range: DateRange,
        quantity: i64,
        demand_id: Option<String>,
    ) -> Self {
        Self {
            task,
            plan,
            workcenter,
            start: range.start(),
            end: range.end(),
            quantity,
            demand_id,
            work_order: None,
        }
    }

    /// 由已下达工单派生的工序计划
    pub fn for_work_order(mut self, work_order: WorkOrderId) -> Self {
        self.work_order = Some(work_order);
        self
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn demand_id(&self) -> Option<&str> {
        self.demand_id.as_deref()
    }

    pub fn date_range(&self) -> DateRange {
        DateRange::new(self.start, self.end)
    }

    pub(crate) fn set_quantity(&mut self, quantity: i64) {
        self.quantity = quantity;
    }

    pub(crate) fn set_demand(&mut self, demand_id: Option<String>) {
        self.demand_id = demand_id;
    }
}
