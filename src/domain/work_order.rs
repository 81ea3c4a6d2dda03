// ==========================================
// 车间作业排产引擎 - 已下达工单领域模型
// ==========================================
// 用途: 已确认/在制的供给,在新建计划之前优先被请求消耗
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::types::{PlanId, TaskId, TaskPlanId, WorkcenterId};

// ==========================================
// ReleasedWorkOrder - 已下达工单
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleasedWorkOrder {
    // ===== 工单信息 =====
    pub work_order_id: String,             // 工单号 (唯一)
    pub lot_id: i32,                       // 初始批次号
    pub task: TaskId,
    pub plan: PlanId,
    pub workcenter: Option<WorkcenterId>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub quantity: i64,
    pub demand: Option<String>,            // 预先锁定的需求ID

    // ===== 分配状态 =====
    pub(crate) remainder: Option<TaskPlanId>,       // 未分配余量 (全部分配后为 None)
    pub(crate) allocated: Vec<TaskPlanId>,          // 已分配的工序计划
    pub(crate) lots: BTreeMap<TaskPlanId, i32>,     // 工序计划 -> 批次号
}

impl ReleasedWorkOrder {
    /// 创建工单 (余量工序计划由 PlanningModel 登记后回填)
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        work_order_id: impl Into<String>,
        lot_id: i32,
        task: TaskId,
        plan: PlanId,
        workcenter: Option<WorkcenterId>,
        start: NaiveDateTime,
        end: NaiveDateTime,
        quantity: i64,
        demand: Option<String>,
    ) -> Self {
        Self {
            work_order_id: work_order_id.into(),
            lot_id,
            task,
            plan,
            workcenter,
            start,
            end,
            quantity,
            demand,
            remainder: None,
            allocated: Vec::new(),
            lots: BTreeMap::new(),
        }
    }

    /// 未分配余量工序计划
    pub fn remainder(&self) -> Option<TaskPlanId> {
        self.remainder
    }

    /// 已分配的工序计划
    pub fn allocated(&self) -> &[TaskPlanId] {
        &self.allocated
    }

    /// 工序计划对应的批次号
    pub fn lot_of(&self, task_plan: TaskPlanId) -> Option<i32> {
        self.lots.get(&task_plan).copied()
    }

    /// 下一个批次号 = 现有最大批次号 + 1
    ///
    /// 无批次时返回 None (调用方视为模型完整性错误)
    pub fn next_lot_id(&self) -> Option<i32> {
        self.lots.values().max().map(|max| max + 1)
    }

    /// 工单是否已全部分配
    pub fn is_consumed(&self) -> bool {
        self.remainder.is_none()
    }
}
