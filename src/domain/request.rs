// ==========================================
// 车间作业排产引擎 - 请求 / 承诺
// ==========================================
// Request: 向上游发出的需求 (每一跳新建,不可变)
// Promise: 向下游返回的答复,携带实际创建的工序计划
// 红线: 承诺可与请求的数量/时间不同,隐式接受,无协商回路
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::types::{PlanId, TaskPlanId};

// ==========================================
// Request - 供给请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    demand_id: String,
    quantity: i64,
    need_by: NaiveDateTime,
    plan: PlanId,
}

impl Request {
    /// 创建请求
    ///
    /// # 返回
    /// - Err(InvalidRequest): 数量 <= 0
    pub fn new(
        demand_id: impl Into<String>,
        quantity: i64,
        need_by: NaiveDateTime,
        plan: PlanId,
    ) -> PlanningResult<Self> {
        let demand_id = demand_id.into();
        if quantity <= 0 {
            return Err(PlanningError::InvalidRequest(format!(
                "需求 {} 请求数量必须大于 0, 实际 {}",
                demand_id, quantity
            )));
        }
        Ok(Self {
            demand_id,
            quantity,
            need_by,
            plan,
        })
    }

    /// 派生出一个上游请求 (需求与方案不变)
    pub fn upstream(&self, quantity: i64, need_by: NaiveDateTime) -> PlanningResult<Self> {
        Request::new(self.demand_id.clone(), quantity, need_by, self.plan)
    }

    pub fn demand_id(&self) -> &str {
        &self.demand_id
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn need_by(&self) -> NaiveDateTime {
        self.need_by
    }

    pub fn plan(&self) -> PlanId {
        self.plan
    }
}

// ==========================================
// Promise - 供给承诺
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    demand_id: String,
    task_plans: Vec<TaskPlanId>,
}

impl Promise {
    pub fn new(demand_id: impl Into<String>, task_plans: Vec<TaskPlanId>) -> Self {
        Self {
            demand_id: demand_id.into(),
            task_plans,
        }
    }

    /// 空承诺 (未分配任何供给)
    pub fn empty(demand_id: impl Into<String>) -> Self {
        Self::new(demand_id, Vec::new())
    }

    pub fn demand_id(&self) -> &str {
        &self.demand_id
    }

    pub fn task_plans(&self) -> &[TaskPlanId] {
        &self.task_plans
    }

    pub fn is_empty(&self) -> bool {
        self.task_plans.is_empty()
    }

    /// 合并另一承诺的工序计划 (追加在末尾)
    pub fn extend(&mut self, other: Promise) {
        self.task_plans.extend(other.task_plans);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn due() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_request_rejects_non_positive_quantity() {
        assert!(matches!(
            Request::new("D1", 0, due(), PlanId(0)),
            Err(PlanningError::InvalidRequest(_))
        ));
        assert!(matches!(
            Request::new("D1", -5, due(), PlanId(0)),
            Err(PlanningError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_upstream_keeps_demand_and_plan() {
        let req = Request::new("D1", 10, due(), PlanId(2)).unwrap();
        let earlier = due() - chrono::Duration::hours(3);
        let up = req.upstream(10, earlier).unwrap();
        assert_eq!(up.demand_id(), "D1");
        assert_eq!(up.plan(), PlanId(2));
        assert_eq!(up.need_by(), earlier);
    }

    #[test]
    fn test_promise_extend() {
        let mut p = Promise::new("D1", vec![TaskPlanId(1)]);
        p.extend(Promise::new("D1", vec![TaskPlanId(2), TaskPlanId(3)]));
        assert_eq!(
            p.task_plans(),
            &[TaskPlanId(1), TaskPlanId(2), TaskPlanId(3)]
        );
        assert!(Promise::empty("D2").is_empty());
    }
}
