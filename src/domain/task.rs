// ==========================================
// 车间作业排产引擎 - 物料与工序领域模型
// ==========================================
// 职责: SKU / Task (工序链节点)
// 红线: 每个工序至多一个前道、一个后道 (单链,非通用 BOM)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::types::{SkuId, TaskId, TaskPlanId, WorkOrderId, WorkcenterId};

// ==========================================
// Sku - 物料
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub name: String,                   // 物料编码 (唯一)
    pub description: String,            // 描述
    pub delivery_task: Option<TaskId>,  // 交付工序 (其产出满足该物料的需求)
}

impl Sku {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            delivery_task: None,
        }
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

// ==========================================
// WorkcenterAssignment - 工序可用的备选工作中心
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkcenterAssignment {
    pub workcenter: WorkcenterId,
    pub priority: i32, // 数值越小越优先
}

// ==========================================
// Task - 工序
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    // ===== 标识 =====
    pub task_id: String,     // 工序步号
    pub task_number: String, // 全局编号: "<sku>-<task_id>"
    pub sku: SkuId,          // 所属物料

    // ===== 工艺参数 (分钟) =====
    pub setup_time: i64,     // 准备时间
    pub time_per: i64,       // 单件加工时间
    pub min_lot_size: i64,   // 最小批量 (仅供参考,未强制)
    pub max_lot_size: i64,   // 最大批量 (仅供参考,未强制)

    // ===== 工序链 =====
    pub predecessor: Option<TaskId>,
    pub successor: Option<TaskId>,
    pub level: u32,          // 层级: 交付工序为 0,越上游越大

    // ===== 资源与计划 =====
    workcenters: Vec<WorkcenterAssignment>, // 按优先级升序
    pub task_plans: Vec<TaskPlanId>,        // 追加式日志
    pub work_orders: Vec<WorkOrderId>,      // 已下达工单
}

impl Task {
    pub fn new(
        task_id: impl Into<String>,
        sku: SkuId,
        sku_name: &str,
        setup_time: i64,
        time_per: i64,
        min_lot_size: i64,
        max_lot_size: i64,
    ) -> Self {
        let task_id = task_id.into();
        Self {
            task_number: Self::task_number_for(sku_name, &task_id),
            task_id,
            sku,
            setup_time,
            time_per,
            min_lot_size,
            max_lot_size,
            predecessor: None,
            successor: None,
            level: 0,
            workcenters: Vec::new(),
            task_plans: Vec::new(),
            work_orders: Vec::new(),
        }
    }

    /// 工序全局编号
    pub fn task_number_for(sku_name: &str, task_id: &str) -> String {
        format!("{}-{}", sku_name, task_id)
    }

    /// 基准提前期 (分钟): 准备时间 + 数量 × 单件时间
    ///
    /// # 错误
    /// - 乘加溢出 i64: InvalidRequest
    pub fn base_lead_time(&self, quantity: i64) -> PlanningResult<i64> {
        quantity
            .checked_mul(self.time_per)
            .and_then(|run| run.checked_add(self.setup_time))
            .ok_or_else(|| {
                PlanningError::InvalidRequest(format!(
                    "工序 {} 的提前期溢出 (数量 {}, 单件 {} 分钟)",
                    self.task_number, quantity, self.time_per
                ))
            })
    }

    /// 登记备选工作中心 (重复登记时更新优先级)
    ///
    /// 保持按优先级升序; 同优先级保持登记顺序
    pub(crate) fn add_workcenter(&mut self, workcenter: WorkcenterId, priority: i32) {
        self.workcenters.retain(|a| a.workcenter != workcenter);
        let pos = self
            .workcenters
            .iter()
            .position(|a| a.priority > priority)
            .unwrap_or(self.workcenters.len());
        self.workcenters
            .insert(pos, WorkcenterAssignment { workcenter, priority });
    }

    /// 备选工作中心 (按优先级升序)
    pub fn workcenters(&self) -> &[WorkcenterAssignment] {
        &self.workcenters
    }

    pub fn has_workcenters(&self) -> bool {
        !self.workcenters.is_empty()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.task_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_lead_time() {
        let task = Task::new("10", SkuId(0), "FG", 30, 5, 1, 100);
        assert_eq!(task.task_number, "FG-10");
        assert_eq!(task.base_lead_time(10).unwrap(), 80);
        assert_eq!(task.base_lead_time(0).unwrap(), 30);
    }

    #[test]
    fn test_base_lead_time_overflow() {
        let task = Task::new("10", SkuId(0), "FG", 30, i64::MAX / 2, 1, 100);
        assert!(matches!(
            task.base_lead_time(3),
            Err(PlanningError::InvalidRequest(_))
        ));

        let task = Task::new("10", SkuId(0), "FG", i64::MAX, 1, 1, 100);
        assert!(task.base_lead_time(1).is_err());
    }

    #[test]
    fn test_workcenters_sorted_by_priority() {
        let mut task = Task::new("10", SkuId(0), "FG", 0, 1, 1, 1);
        task.add_workcenter(WorkcenterId(5), 3);
        task.add_workcenter(WorkcenterId(6), 1);
        task.add_workcenter(WorkcenterId(7), 3);
        task.add_workcenter(WorkcenterId(8), 2);

        let order: Vec<usize> = task.workcenters().iter().map(|a| a.workcenter.0).collect();
        assert_eq!(order, vec![6, 8, 5, 7]);

        // 重复登记更新优先级
        task.add_workcenter(WorkcenterId(5), 0);
        assert_eq!(task.workcenters()[0].workcenter, WorkcenterId(5));
        assert_eq!(task.workcenters().len(), 4);
    }
}
