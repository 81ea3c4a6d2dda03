// ==========================================
// 车间作业排产引擎 - 排产模型 (节点注册表)
// ==========================================
// 职责: 集中持有全部图节点,节点间以 ID 互相引用
// 红线: 图构建阶段即校验引用完整性 (fail fast),排产阶段不再校验
// ==========================================

use std::collections::HashMap;

use crate::domain::calendar::{Calendar, DateRange};
use crate::domain::demand::Demand;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::plan::Plan;
use crate::domain::task::{Sku, Task};
use crate::domain::task_plan::TaskPlan;
use crate::domain::types::{
    CalendarId, DemandId, PlanId, SkuId, TaskId, TaskPlanId, WorkOrderId, WorkcenterId,
};
use crate::domain::work_order::ReleasedWorkOrder;
use crate::domain::workcenter::Workcenter;

// ==========================================
// PlanningModel - 排产模型
// ==========================================
#[derive(Debug, Default)]
pub struct PlanningModel {
    plans: Vec<Plan>,
    calendars: Vec<Calendar>,
    skus: Vec<Sku>,
    tasks: Vec<Task>,
    workcenters: Vec<Workcenter>,
    demands: Vec<Demand>,
    task_plans: Vec<TaskPlan>,
    work_orders: Vec<ReleasedWorkOrder>,

    // ===== 业务键索引 =====
    plan_index: HashMap<String, PlanId>,
    calendar_index: HashMap<String, CalendarId>,
    sku_index: HashMap<String, SkuId>,
    task_index: HashMap<String, TaskId>,
    workcenter_index: HashMap<String, WorkcenterId>,
    demand_index: HashMap<String, DemandId>,
    work_order_index: HashMap<String, WorkOrderId>,
}

fn duplicate(entity: &str, key: &str) -> PlanningError {
    PlanningError::ModelIntegrity(format!("{} 重复: {}", entity, key))
}

impl PlanningModel {
    pub fn new() -> Self {
        Self::default()
    }

    // ==========================================
    // 方案
    // ==========================================

    pub fn add_plan(&mut self, plan: Plan) -> PlanningResult<PlanId> {
        if self.plan_index.contains_key(&plan.plan_id) {
            return Err(duplicate("方案", &plan.plan_id));
        }
        if plan.end <= plan.start {
            return Err(PlanningError::ModelIntegrity(format!(
                "方案 {} 计划期无效: [{} - {}]",
                plan.plan_id, plan.start, plan.end
            )));
        }
        let id = PlanId(self.plans.len());
        self.plan_index.insert(plan.plan_id.clone(), id);
        self.plans.push(plan);
        Ok(id)
    }

    pub fn plan(&self, id: PlanId) -> &Plan {
        &self.plans[id.0]
    }

    pub fn plan_mut(&mut self, id: PlanId) -> &mut Plan {
        &mut self.plans[id.0]
    }

    pub fn find_plan(&self, plan_id: &str) -> Option<PlanId> {
        self.plan_index.get(plan_id).copied()
    }

    pub fn plan_ids(&self) -> impl Iterator<Item = PlanId> {
        (0..self.plans.len()).map(PlanId)
    }

    // ==========================================
    // 日历
    // ==========================================

    pub fn add_calendar(&mut self, calendar: Calendar) -> PlanningResult<CalendarId> {
        if self.calendar_index.contains_key(&calendar.name) {
            return Err(duplicate("日历", &calendar.name));
        }
        let id = CalendarId(self.calendars.len());
        self.calendar_index.insert(calendar.name.clone(), id);
        self.calendars.push(calendar);
        Ok(id)
    }

    pub fn calendar(&self, id: CalendarId) -> &Calendar {
        &self.calendars[id.0]
    }

    pub fn calendar_mut(&mut self, id: CalendarId) -> &mut Calendar {
        &mut self.calendars[id.0]
    }

    pub fn find_calendar(&self, name: &str) -> Option<CalendarId> {
        self.calendar_index.get(name).copied()
    }

    pub fn calendar_ids(&self) -> impl Iterator<Item = CalendarId> {
        (0..self.calendars.len()).map(CalendarId)
    }

    // ==========================================
    // 物料
    // ==========================================

    pub fn add_sku(&mut self, sku: Sku) -> PlanningResult<SkuId> {
        if self.sku_index.contains_key(&sku.name) {
            return Err(duplicate("物料", &sku.name));
        }
        let id = SkuId(self.skus.len());
        self.sku_index.insert(sku.name.clone(), id);
        self.skus.push(sku);
        Ok(id)
    }

    pub fn sku(&self, id: SkuId) -> &Sku {
        &self.skus[id.0]
    }

    pub fn find_sku(&self, name: &str) -> Option<SkuId> {
        self.sku_index.get(name).copied()
    }

    pub fn sku_ids(&self) -> impl Iterator<Item = SkuId> {
        (0..self.skus.len()).map(SkuId)
    }

    /// 设置物料的交付工序 (工序必须属于该物料)
    pub fn set_delivery_task(&mut self, sku: SkuId, task: TaskId) -> PlanningResult<()> {
        self.check_sku(sku)?;
        self.check_task(task)?;
        if self.tasks[task.0].sku != sku {
            return Err(PlanningError::ModelIntegrity(format!(
                "工序 {} 不属于物料 {}, 不能作为其交付工序",
                self.tasks[task.0].task_number, self.skus[sku.0].name
            )));
        }
        self.skus[sku.0].delivery_task = Some(task);
        Ok(())
    }

    // ==========================================
    // 工作中心
    // ==========================================

    pub fn add_workcenter(&mut self, workcenter: Workcenter) -> PlanningResult<WorkcenterId> {
        if self.workcenter_index.contains_key(&workcenter.name) {
            return Err(duplicate("工作中心", &workcenter.name));
        }
        if workcenter.calendar.0 >= self.calendars.len() {
            return Err(PlanningError::missing("日历", workcenter.calendar));
        }
        let id = WorkcenterId(self.workcenters.len());
        self.workcenter_index.insert(workcenter.name.clone(), id);
        self.workcenters.push(workcenter);
        Ok(id)
    }

    pub fn workcenter(&self, id: WorkcenterId) -> &Workcenter {
        &self.workcenters[id.0]
    }

    pub fn workcenter_mut(&mut self, id: WorkcenterId) -> &mut Workcenter {
        &mut self.workcenters[id.0]
    }

    pub fn find_workcenter(&self, name: &str) -> Option<WorkcenterId> {
        self.workcenter_index.get(name).copied()
    }

    pub fn workcenter_ids(&self) -> impl Iterator<Item = WorkcenterId> {
        (0..self.workcenters.len()).map(WorkcenterId)
    }

    /// 工作中心绑定的日历
    pub fn workcenter_calendar(&self, id: WorkcenterId) -> &Calendar {
        self.calendar(self.workcenters[id.0].calendar)
    }

    // ==========================================
    // 工序
    // ==========================================

    /// 新增工序
    ///
    /// # 参数
    /// - `task_id`: 工序步号 (同一物料内唯一)
    /// - `sku`: 所属物料
    /// - `setup_time` / `time_per`: 准备时间 / 单件时间 (分钟)
    /// - `min_lot_size` / `max_lot_size`: 批量范围 (仅供参考)
    #[allow(clippy::too_many_arguments)]
    pub fn add_task(
        &mut self,
        task_id: &str,
        sku: SkuId,
        setup_time: i64,
        time_per: i64,
        min_lot_size: i64,
        max_lot_size: i64,
    ) -> PlanningResult<TaskId> {
        self.check_sku(sku)?;
        if setup_time < 0 || time_per < 0 {
            return Err(PlanningError::ModelIntegrity(format!(
                "工序 {}-{} 工时不能为负: setup={}, per={}",
                self.skus[sku.0].name, task_id, setup_time, time_per
            )));
        }
        let task = Task::new(
            task_id,
            sku,
            &self.skus[sku.0].name,
            setup_time,
            time_per,
            min_lot_size,
            max_lot_size,
        );
        if self.task_index.contains_key(&task.task_number) {
            return Err(duplicate("工序", &task.task_number));
        }
        let id = TaskId(self.tasks.len());
        self.task_index.insert(task.task_number.clone(), id);
        self.tasks.push(task);
        Ok(id)
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id.0]
    }

    /// 按全局编号 ("<sku>-<task_id>") 查找工序
    pub fn find_task(&self, task_number: &str) -> Option<TaskId> {
        self.task_index.get(task_number).copied()
    }

    /// 按物料 + 步号查找工序
    pub fn find_task_for(&self, sku_name: &str, task_id: &str) -> Option<TaskId> {
        self.find_task(&Task::task_number_for(sku_name, task_id))
    }

    pub fn task_ids(&self) -> impl Iterator<Item = TaskId> {
        (0..self.tasks.len()).map(TaskId)
    }

    /// 建立前后道关系: `predecessor` -> `successor`
    ///
    /// 两端必须存在,且各自尚未连接到其他工序,不能成环
    pub fn link_tasks(&mut self, successor: TaskId, predecessor: TaskId) -> PlanningResult<()> {
        self.check_task(successor)?;
        self.check_task(predecessor)?;
        if successor == predecessor {
            return Err(PlanningError::ModelIntegrity(format!(
                "工序 {} 不能作为自身的前道",
                self.tasks[successor.0].task_number
            )));
        }
        if let Some(existing) = self.tasks[successor.0].predecessor {
            if existing != predecessor {
                return Err(PlanningError::ModelIntegrity(format!(
                    "工序 {} 已有前道 {}",
                    self.tasks[successor.0].task_number, self.tasks[existing.0].task_number
                )));
            }
        }
        if let Some(existing) = self.tasks[predecessor.0].successor {
            if existing != successor {
                return Err(PlanningError::ModelIntegrity(format!(
                    "工序 {} 已有后道 {}",
                    self.tasks[predecessor.0].task_number, self.tasks[existing.0].task_number
                )));
            }
        }
        // 成环检查: 从前道沿链向上游走,不能遇到后道
        let mut cursor = Some(predecessor);
        while let Some(current) = cursor {
            if current == successor {
                return Err(PlanningError::ModelIntegrity(format!(
                    "工序链成环: {} <- {}",
                    self.tasks[successor.0].task_number, self.tasks[predecessor.0].task_number
                )));
            }
            cursor = self.tasks[current.0].predecessor;
        }
        self.tasks[successor.0].predecessor = Some(predecessor);
        self.tasks[predecessor.0].successor = Some(successor);
        Ok(())
    }

    /// 为工序登记备选工作中心
    pub fn assign_workcenter(
        &mut self,
        task: TaskId,
        workcenter: WorkcenterId,
        priority: i32,
    ) -> PlanningResult<()> {
        self.check_task(task)?;
        self.check_workcenter(workcenter)?;
        self.tasks[task.0].add_workcenter(workcenter, priority);
        Ok(())
    }

    pub(crate) fn set_task_level(&mut self, task: TaskId, level: u32) {
        self.tasks[task.0].level = level;
    }

    // ==========================================
    // 需求
    // ==========================================

    pub fn add_demand(&mut self, demand: Demand) -> PlanningResult<DemandId> {
        if self.demand_index.contains_key(&demand.demand_id) {
            return Err(duplicate("需求", &demand.demand_id));
        }
        self.check_sku(demand.sku)?;
        self.check_plan(demand.plan)?;
        let id = DemandId(self.demands.len());
        self.demand_index.insert(demand.demand_id.clone(), id);
        self.demands.push(demand);
        Ok(id)
    }

    pub fn demand(&self, id: DemandId) -> &Demand {
        &self.demands[id.0]
    }

    pub fn demand_mut(&mut self, id: DemandId) -> &mut Demand {
        &mut self.demands[id.0]
    }

    pub fn find_demand(&self, demand_id: &str) -> Option<DemandId> {
        self.demand_index.get(demand_id).copied()
    }

    pub fn demand_ids(&self) -> impl Iterator<Item = DemandId> {
        (0..self.demands.len()).map(DemandId)
    }

    // ==========================================
    // 工序计划
    // ==========================================

    /// 登记工序计划,同时追加到所属工序与工作中心的日志
    pub fn add_task_plan(&mut self, task_plan: TaskPlan) -> TaskPlanId {
        let id = TaskPlanId(self.task_plans.len());
        self.tasks[task_plan.task.0].task_plans.push(id);
        if let Some(w) = task_plan.workcenter {
            self.workcenters[w.0].task_plans.push(id);
        }
        self.task_plans.push(task_plan);
        id
    }

    pub fn task_plan(&self, id: TaskPlanId) -> &TaskPlan {
        &self.task_plans[id.0]
    }

    pub(crate) fn task_plan_mut(&mut self, id: TaskPlanId) -> &mut TaskPlan {
        &mut self.task_plans[id.0]
    }

    pub fn task_plan_ids(&self) -> impl Iterator<Item = TaskPlanId> {
        (0..self.task_plans.len()).map(TaskPlanId)
    }

    pub fn task_plan_count(&self) -> usize {
        self.task_plans.len()
    }

    // ==========================================
    // 已下达工单
    // ==========================================

    /// 登记已下达工单
    ///
    /// 同时创建其未分配余量工序计划 (批次号 = 工单初始批次号),
    /// 登记到工序 / 工作中心日志
    pub fn add_work_order(&mut self, mut work_order: ReleasedWorkOrder) -> PlanningResult<WorkOrderId> {
        if self.work_order_index.contains_key(&work_order.work_order_id) {
            return Err(duplicate("工单", &work_order.work_order_id));
        }
        self.check_task(work_order.task)?;
        self.check_plan(work_order.plan)?;
        if let Some(w) = work_order.workcenter {
            self.check_workcenter(w)?;
        }
        if work_order.quantity <= 0 {
            return Err(PlanningError::ModelIntegrity(format!(
                "工单 {} 数量必须大于 0",
                work_order.work_order_id
            )));
        }
        if let Some(demand_id) = &work_order.demand {
            if !self.demand_index.contains_key(demand_id) {
                return Err(PlanningError::missing("需求", demand_id));
            }
        }

        let id = WorkOrderId(self.work_orders.len());
        let range = DateRange::new(work_order.start, work_order.end);
        let remainder = self.add_task_plan(
            TaskPlan::new(
                work_order.task,
                work_order.plan,
                work_order.workcenter,
                range,
                work_order.quantity,
                work_order.demand.clone(),
            )
            .for_work_order(id),
        );
        work_order.remainder = Some(remainder);
        work_order.lots.insert(remainder, work_order.lot_id);

        self.tasks[work_order.task.0].work_orders.push(id);
        self.work_order_index
            .insert(work_order.work_order_id.clone(), id);
        self.work_orders.push(work_order);
        Ok(id)
    }

    pub fn work_order(&self, id: WorkOrderId) -> &ReleasedWorkOrder {
        &self.work_orders[id.0]
    }

    pub(crate) fn work_order_mut(&mut self, id: WorkOrderId) -> &mut ReleasedWorkOrder {
        &mut self.work_orders[id.0]
    }

    pub fn find_work_order(&self, work_order_id: &str) -> Option<WorkOrderId> {
        self.work_order_index.get(work_order_id).copied()
    }

    pub fn work_order_ids(&self) -> impl Iterator<Item = WorkOrderId> {
        (0..self.work_orders.len()).map(WorkOrderId)
    }

    // ==========================================
    // 整体校验
    // ==========================================

    /// 校验加载方约定
    ///
    /// 1) 有需求的物料必须有交付工序
    /// 2) 工作中心日历非空
    /// 3) 前后道关系双向一致
    pub fn validate(&self) -> PlanningResult<()> {
        for demand in &self.demands {
            let sku = &self.skus[demand.sku.0];
            if sku.delivery_task.is_none() {
                return Err(PlanningError::ModelIntegrity(format!(
                    "物料 {} 缺少交付工序 (需求 {})",
                    sku.name, demand.demand_id
                )));
            }
        }

        for workcenter in &self.workcenters {
            if self.calendars[workcenter.calendar.0].is_empty() {
                return Err(PlanningError::ModelIntegrity(format!(
                    "工作中心 {} 的日历 {} 没有班次",
                    workcenter.name, self.calendars[workcenter.calendar.0].name
                )));
            }
        }

        for (idx, task) in self.tasks.iter().enumerate() {
            if let Some(pred) = task.predecessor {
                if self.tasks[pred.0].successor != Some(TaskId(idx)) {
                    return Err(PlanningError::ModelIntegrity(format!(
                        "工序 {} 与前道 {} 的关系不一致",
                        task.task_number, self.tasks[pred.0].task_number
                    )));
                }
            }
            if let Some(succ) = task.successor {
                if self.tasks[succ.0].predecessor != Some(TaskId(idx)) {
                    return Err(PlanningError::ModelIntegrity(format!(
                        "工序 {} 与后道 {} 的关系不一致",
                        task.task_number, self.tasks[succ.0].task_number
                    )));
                }
            }
        }
        Ok(())
    }

    // ==========================================
    // 引用检查
    // ==========================================

    fn check_plan(&self, id: PlanId) -> PlanningResult<()> {
        if id.0 < self.plans.len() {
            Ok(())
        } else {
            Err(PlanningError::missing("方案", id))
        }
    }

    fn check_sku(&self, id: SkuId) -> PlanningResult<()> {
        if id.0 < self.skus.len() {
            Ok(())
        } else {
            Err(PlanningError::missing("物料", id))
        }
    }

    fn check_task(&self, id: TaskId) -> PlanningResult<()> {
        if id.0 < self.tasks.len() {
            Ok(())
        } else {
            Err(PlanningError::missing("工序", id))
        }
    }

    fn check_workcenter(&self, id: WorkcenterId) -> PlanningResult<()> {
        if id.0 < self.workcenters.len() {
            Ok(())
        } else {
            Err(PlanningError::missing("工作中心", id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::CalendarShift;
    use crate::domain::types::CalendarType;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn base_model() -> (PlanningModel, SkuId, TaskId, TaskId, TaskId) {
        let mut model = PlanningModel::new();
        model.add_plan(Plan::new("P1", dt(1, 0), dt(20, 0))).unwrap();
        let sku = model.add_sku(Sku::new("FG", "成品")).unwrap();
        let t10 = model.add_task("10", sku, 0, 1, 1, 1).unwrap();
        let t20 = model.add_task("20", sku, 0, 1, 1, 1).unwrap();
        let t30 = model.add_task("30", sku, 0, 1, 1, 1).unwrap();
        (model, sku, t10, t20, t30)
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let (mut model, sku, _, _, _) = base_model();
        assert!(model.add_sku(Sku::new("FG", "dup")).is_err());
        assert!(model.add_task("10", sku, 0, 1, 1, 1).is_err());
        assert!(model.add_plan(Plan::new("P1", dt(1, 0), dt(2, 0))).is_err());
    }

    #[test]
    fn test_link_tasks_consistency() {
        let (mut model, _, t10, t20, t30) = base_model();
        model.link_tasks(t30, t20).unwrap();
        model.link_tasks(t20, t10).unwrap();
        assert_eq!(model.task(t30).predecessor, Some(t20));
        assert_eq!(model.task(t10).successor, Some(t20));

        // 已有前道
        assert!(model.link_tasks(t30, t10).is_err());
        // 成环
        let (mut model2, _, a, b, _) = base_model();
        model2.link_tasks(b, a).unwrap();
        assert!(model2.link_tasks(a, b).is_err());
        assert!(model2.link_tasks(a, a).is_err());
    }

    #[test]
    fn test_missing_references_fail_fast() {
        let (mut model, _, t10, _, _) = base_model();
        assert!(matches!(
            model.assign_workcenter(t10, WorkcenterId(9), 1),
            Err(PlanningError::ModelIntegrity(_))
        ));
        assert!(matches!(
            model.add_workcenter(Workcenter::new("W1", CalendarId(3), 1, 1)),
            Err(PlanningError::ModelIntegrity(_))
        ));
        assert!(matches!(
            model.link_tasks(t10, TaskId(42)),
            Err(PlanningError::ModelIntegrity(_))
        ));
    }

    #[test]
    fn test_validate_requires_delivery_task() {
        let (mut model, sku, _, _, t30) = base_model();
        let plan = model.find_plan("P1").unwrap();
        model
            .add_demand(Demand::new("D1", "C1", sku, dt(10, 0), 5, 1, plan))
            .unwrap();
        assert!(model.validate().is_err());

        model.set_delivery_task(sku, t30).unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_calendar() {
        let (mut model, _, _, _, _) = base_model();
        let cal = model
            .add_calendar(Calendar::new("EMPTY", CalendarType::Efficiency))
            .unwrap();
        model.add_workcenter(Workcenter::new("W1", cal, 1, 1)).unwrap();
        assert!(model.validate().is_err());

        model
            .calendar_mut(cal)
            .add_shift(CalendarShift::new(1, dt(1, 0), dt(20, 0), 1, 1.0))
            .unwrap();
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_work_order_registers_remainder() {
        let (mut model, _, t10, _, _) = base_model();
        let plan = model.find_plan("P1").unwrap();
        let wo = model
            .add_work_order(ReleasedWorkOrder::new(
                "WO1", 1, t10, plan, None, dt(2, 0), dt(3, 0), 100, None,
            ))
            .unwrap();

        let remainder = model.work_order(wo).remainder().unwrap();
        assert_eq!(model.task_plan(remainder).quantity(), 100);
        assert_eq!(model.task_plan(remainder).work_order, Some(wo));
        assert_eq!(model.task(t10).task_plans, vec![remainder]);
        assert_eq!(model.task(t10).work_orders, vec![wo]);
        assert_eq!(model.work_order(wo).lot_of(remainder), Some(1));
    }
}
