// ==========================================
// 车间作业排产引擎 - 请求/承诺传播
// ==========================================
// 职责: 需求 -> 交付工序 -> 前道工序 的递归请求/承诺交换
// 流程:
// 1) 需求向交付工序发出请求 (数量 = 需求数量, 需求时间 = 交期)
// 2) 工序先用已下达工单满足请求,剩余数量再新建计划:
//    倒推确定本工序时间 -> 有前道则以本工序开工时间向前道请求
//    -> 以前道最晚完工时间正推本工序
// 3) 承诺携带实际创建的工序计划逐级返回
// 红线: 选定的工作中心通过返回值传递,工序上不保存"当前工作中心"
// ==========================================

use chrono::NaiveDateTime;
use tracing::instrument;

use crate::config::TraceOptions;
use crate::domain::calendar::DateRange;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::model::PlanningModel;
use crate::domain::request::{Promise, Request};
use crate::domain::task_plan::TaskPlan;
use crate::domain::types::{DemandId, PlanId, TaskId, TaskPlanId, WorkcenterId};
use crate::engine::calendar_engine::{calc_end, calc_start, check_duration, CalendarEngine};
use crate::engine::released_supply;
use crate::engine::workcenter_query::WorkcenterQuery;
use crate::perf;

// ==========================================
// PlanningEngine - 传播引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct PlanningEngine {
    workcenters: WorkcenterQuery,
    trace: TraceOptions,
}

impl PlanningEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `trace`: 追踪开关,同时传给日历引擎
    pub fn new(trace: TraceOptions) -> Self {
        Self {
            workcenters: WorkcenterQuery::new(CalendarEngine::new(trace)),
            trace,
        }
    }

    // ==========================================
    // 需求
    // ==========================================

    /// 为需求排产
    ///
    /// 结果回写到需求: 交付工序计划、计划完工 (最晚完工)、计划数量
    #[instrument(skip(self, model))]
    pub fn plan_demand(&self, model: &mut PlanningModel, demand: DemandId) -> PlanningResult<Promise> {
        let d = model.demand(demand);
        let delivery = model.sku(d.sku).delivery_task.ok_or_else(|| {
            PlanningError::ModelIntegrity(format!(
                "物料 {} 缺少交付工序 (需求 {})",
                model.sku(d.sku).name,
                d.demand_id
            ))
        })?;
        let request = Request::new(d.demand_id.clone(), d.quantity, d.due_date, d.plan)?;

        let promise = self.request_task(model, delivery, &request)?;

        let plan_date = promise
            .task_plans()
            .iter()
            .map(|&tp| model.task_plan(tp).end)
            .max();
        let plan_quantity: i64 = promise
            .task_plans()
            .iter()
            .map(|&tp| model.task_plan(tp).quantity())
            .sum();

        let d = model.demand_mut(demand);
        d.delivery_task_plans = promise.task_plans().to_vec();
        d.plan_date = plan_date;
        d.plan_quantity = plan_quantity;

        tracing::debug!(
            demand_id = %d.demand_id,
            due = %d.due_date,
            quantity = d.quantity,
            plan_date = ?d.plan_date,
            plan_quantity,
            "需求排产完成"
        );
        Ok(promise)
    }

    // ==========================================
    // 工序
    // ==========================================

    /// 工序响应请求
    ///
    /// 先按登记顺序用同方案的已下达工单满足,剩余数量新建计划;
    /// 已下达工单的计划排在承诺最前
    pub fn request_task(
        &self,
        model: &mut PlanningModel,
        task: TaskId,
        request: &Request,
    ) -> PlanningResult<Promise> {
        if self.trace.propagation {
            tracing::trace!(
                task = %model.task(task).task_number,
                demand_id = request.demand_id(),
                quantity = request.quantity(),
                need_by = %request.need_by(),
                "收到请求"
            );
        }

        let mut promise = Promise::empty(request.demand_id());
        let mut outstanding = request.quantity();

        let work_orders = model.task(task).work_orders.clone();
        for wo in work_orders {
            if outstanding <= 0 {
                break;
            }
            let ask = request.upstream(outstanding, request.need_by())?;
            let released = released_supply::allocate(model, wo, &ask)?;
            let promised: i64 = released
                .task_plans()
                .iter()
                .map(|&tp| model.task_plan(tp).quantity())
                .sum();
            outstanding -= promised;
            promise.extend(released);
        }

        if outstanding <= 0 {
            tracing::debug!(
                task = %model.task(task).task_number,
                demand_id = request.demand_id(),
                "请求由已下达工单全部满足"
            );
            return Ok(promise);
        }

        let remaining = request.upstream(outstanding, request.need_by())?;
        let planned = self.plan_new_work(model, task, &remaining)?;
        promise.extend(planned);
        Ok(promise)
    }

    /// 新建计划: 倒推本工序,有前道则向前道请求并正推
    fn plan_new_work(
        &self,
        model: &mut PlanningModel,
        task: TaskId,
        request: &Request,
    ) -> PlanningResult<Promise> {
        let (workcenter, range) = self.resolve_end_before(model, task, request)?;

        let predecessor = model.task(task).predecessor;
        match predecessor {
            Some(pred) => {
                let upstream = request.upstream(request.quantity(), range.start())?;
                let pred_promise = self.request_task(model, pred, &upstream)?;
                self.plan_from_promise(model, task, request, &pred_promise)
            }
            None => {
                let tp = self.create_task_plan(model, task, request, workcenter, range, request.quantity());
                Ok(Promise::new(request.demand_id(), vec![tp]))
            }
        }
    }

    /// 汇总前道承诺后正推本工序
    ///
    /// 数量 = 前道计划数量之和, 最早开工 = 前道计划最晚完工
    pub fn plan_from_promise(
        &self,
        model: &mut PlanningModel,
        task: TaskId,
        request: &Request,
        pred_promise: &Promise,
    ) -> PlanningResult<Promise> {
        let quantity: i64 = pred_promise
            .task_plans()
            .iter()
            .map(|&tp| model.task_plan(tp).quantity())
            .sum();
        let earliest = pred_promise
            .task_plans()
            .iter()
            .map(|&tp| model.task_plan(tp).end)
            .max()
            .ok_or_else(|| {
                PlanningError::InvalidRequest(format!(
                    "工序 {} 的前道承诺为空 (需求 {})",
                    model.task(task).task_number,
                    request.demand_id()
                ))
            })?;
        if quantity <= 0 {
            return Err(PlanningError::InvalidRequest(format!(
                "工序 {} 的前道承诺数量为 {}",
                model.task(task).task_number,
                quantity
            )));
        }

        let (workcenter, range) = self.resolve_start_after(model, task, request.plan(), earliest, quantity)?;
        let tp = self.create_task_plan(model, task, request, workcenter, range, quantity);
        Ok(Promise::new(request.demand_id(), vec![tp]))
    }

    // ==========================================
    // 时间换算
    // ==========================================

    fn resolve_end_before(
        &self,
        model: &PlanningModel,
        task: TaskId,
        request: &Request,
    ) -> PlanningResult<(Option<WorkcenterId>, DateRange)> {
        let t = model.task(task);
        let lead_time = t.base_lead_time(request.quantity())?;
        check_duration(lead_time)?;
        let due = request.need_by();

        if let Some(p) = self
            .workcenters
            .select_end_before(model, task, request.plan(), due, lead_time)?
        {
            return Ok((Some(p.workcenter), p.range));
        }

        // 无工作中心: 不考虑日历,开工不早于计划期起点
        let plan = model.plan(request.plan());
        let mut start = calc_start(due, lead_time)?;
        let mut end = due;
        if start < plan.start {
            start = plan.start;
            end = calc_end(start, lead_time)?;
            tracing::debug!(
                task = %t.task_number,
                %due,
                clamped_start = %start,
                end = %end,
                "开工早于计划期起点,钳制后完工推迟"
            );
        }
        Ok((None, DateRange::new(start, end)))
    }

    fn resolve_start_after(
        &self,
        model: &PlanningModel,
        task: TaskId,
        plan: PlanId,
        earliest: NaiveDateTime,
        quantity: i64,
    ) -> PlanningResult<(Option<WorkcenterId>, DateRange)> {
        let t = model.task(task);
        let lead_time = t.base_lead_time(quantity)?;
        check_duration(lead_time)?;

        if let Some(p) = self
            .workcenters
            .select_start_after(model, task, plan, earliest, lead_time)?
        {
            return Ok((Some(p.workcenter), p.range));
        }

        // 无工作中心: 不考虑日历,完工不晚于计划期终点
        let plan = model.plan(plan);
        let mut start = earliest;
        let mut end = calc_end(start, lead_time)?;
        if end > plan.end {
            end = plan.end;
            start = calc_start(end, lead_time)?;
            tracing::debug!(
                task = %t.task_number,
                %earliest,
                start = %start,
                clamped_end = %end,
                "完工晚于计划期终点,钳制后开工提前"
            );
        }
        Ok((None, DateRange::new(start, end)))
    }

    fn create_task_plan(
        &self,
        model: &mut PlanningModel,
        task: TaskId,
        request: &Request,
        workcenter: Option<WorkcenterId>,
        range: DateRange,
        quantity: i64,
    ) -> TaskPlanId {
        let id = model.add_task_plan(TaskPlan::new(
            task,
            request.plan(),
            workcenter,
            range,
            quantity,
            Some(request.demand_id().to_string()),
        ));
        perf::record_task_plan();

        tracing::debug!(
            task = %model.task(task).task_number,
            workcenter = workcenter.map(|w| model.workcenter(w).name.as_str()).unwrap_or("-"),
            demand_id = request.demand_id(),
            quantity,
            range = %range,
            "新建工序计划"
        );
        id
    }
}
