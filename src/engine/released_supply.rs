// ==========================================
// 车间作业排产引擎 - 已下达工单分配
// ==========================================
// 职责: 在新建计划前拦截请求,消耗或拆分已下达工单的未分配余量
// 规则:
// 1) 工单已锁定同一需求: 余量整体交付,工单余量清空
// 2) 工单未锁定: 承诺量 = min(余量, 请求量);
//    整单消耗则余量整体锁定给需求,否则拆批 (新批次号 = 最大批次号 + 1)
// 3) 工单已锁定其他需求: 不分配
// 红线: 先到先得,不做预留优先级
// ==========================================

use crate::domain::calendar::DateRange;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::model::PlanningModel;
use crate::domain::request::{Promise, Request};
use crate::domain::task_plan::TaskPlan;
use crate::domain::types::{TaskPlanId, WorkOrderId};
use crate::perf;

/// 用已下达工单响应请求
///
/// # 返回
/// - 承诺 (不分配时为空承诺)
///
/// # 错误
/// - 拆批时工单没有任何批次: ModelIntegrity
pub fn allocate(
    model: &mut PlanningModel,
    work_order: WorkOrderId,
    request: &Request,
) -> PlanningResult<Promise> {
    let demand_id = request.demand_id();
    let wo = model.work_order(work_order);

    if wo.plan != request.plan() {
        return Ok(Promise::empty(demand_id));
    }
    let Some(remainder) = wo.remainder() else {
        return Ok(Promise::empty(demand_id));
    };

    match wo.demand.as_deref() {
        Some(pegged) if pegged == demand_id => {
            tracing::debug!(
                work_order = %wo.work_order_id,
                demand_id,
                quantity = model.task_plan(remainder).quantity(),
                "工单已锁定该需求,余量整体交付"
            );
            let wo = model.work_order_mut(work_order);
            wo.allocated.push(remainder);
            wo.remainder = None;
            Ok(Promise::new(demand_id, vec![remainder]))
        }
        Some(pegged) => {
            tracing::debug!(
                work_order = %wo.work_order_id,
                demand_id,
                pegged_to = pegged,
                "工单已锁定其他需求,不分配"
            );
            Ok(Promise::empty(demand_id))
        }
        None => allocate_unpegged(model, work_order, remainder, request),
    }
}

fn allocate_unpegged(
    model: &mut PlanningModel,
    work_order: WorkOrderId,
    remainder: TaskPlanId,
    request: &Request,
) -> PlanningResult<Promise> {
    let demand_id = request.demand_id();
    let available = model.task_plan(remainder).quantity();
    let promise_qty = available.min(request.quantity());
    if promise_qty <= 0 {
        return Ok(Promise::empty(demand_id));
    }

    if promise_qty == available {
        model
            .task_plan_mut(remainder)
            .set_demand(Some(demand_id.to_string()));
        let wo = model.work_order_mut(work_order);
        wo.allocated.push(remainder);
        wo.remainder = None;
        tracing::debug!(
            work_order = %wo.work_order_id,
            demand_id,
            quantity = promise_qty,
            "工单余量整体锁定给需求"
        );
        return Ok(Promise::new(demand_id, vec![remainder]));
    }

    let wo = model.work_order(work_order);
    let lot_id = wo.next_lot_id().ok_or_else(|| {
        PlanningError::ModelIntegrity(format!("工单 {} 没有批次,无法拆批", wo.work_order_id))
    })?;
    let split = TaskPlan::new(
        wo.task,
        wo.plan,
        wo.workcenter,
        DateRange::new(wo.start, wo.end),
        promise_qty,
        Some(demand_id.to_string()),
    )
    .for_work_order(work_order);

    model
        .task_plan_mut(remainder)
        .set_quantity(available - promise_qty);
    let split_id = model.add_task_plan(split);
    perf::record_task_plan();

    let wo = model.work_order_mut(work_order);
    wo.lots.insert(split_id, lot_id);
    wo.allocated.push(split_id);
    tracing::debug!(
        work_order = %wo.work_order_id,
        demand_id,
        quantity = promise_qty,
        remaining = available - promise_qty,
        lot_id,
        "工单拆批"
    );
    Ok(Promise::new(demand_id, vec![split_id]))
}
