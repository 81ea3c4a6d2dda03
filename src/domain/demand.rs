// ==========================================
// 车间作业排产引擎 - 客户需求领域模型
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::types::{PlanId, SkuId, TaskPlanId};

// ==========================================
// Demand - 客户需求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    // ===== 需求信息 =====
    pub demand_id: String,       // 需求ID (唯一)
    pub customer_id: String,     // 客户ID
    pub sku: SkuId,              // 需求物料
    pub due_date: NaiveDateTime, // 交期
    pub quantity: i64,           // 需求数量
    pub priority: i64,           // 优先级 (数值越小越先排)
    pub plan: PlanId,            // 所属方案

    // ===== 排产结果 =====
    pub delivery_task_plans: Vec<TaskPlanId>, // 交付该需求的工序计划
    pub plan_date: Option<NaiveDateTime>,     // 计划完工 (未排产为 None)
    pub plan_quantity: i64,                   // 计划数量
}

impl Demand {
    pub fn new(
        demand_id: impl Into<String>,
        customer_id: impl Into<String>,
        sku: SkuId,
        due_date: NaiveDateTime,
        quantity: i64,
        priority: i64,
        plan: PlanId,
    ) -> Self {
        Self {
            demand_id: demand_id.into(),
            customer_id: customer_id.into(),
            sku,
            due_date,
            quantity,
            priority,
            plan,
            delivery_task_plans: Vec::new(),
            plan_date: None,
            plan_quantity: 0,
        }
    }

    /// 是否已排产
    pub fn is_planned(&self) -> bool {
        self.plan_date.is_some()
    }

    /// 计划完工是否晚于交期
    pub fn is_late(&self) -> bool {
        self.plan_date.map(|d| d > self.due_date).unwrap_or(false)
    }
}
