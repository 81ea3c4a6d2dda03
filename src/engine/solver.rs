// ==========================================
// 车间作业排产引擎 - 求解驱动
// ==========================================
// 职责: 静态分析 (需求过滤 + 层级计算) 与按需求逐个排产
// 顺序: 需求按优先级升序,同优先级按需求ID
// ==========================================

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::instrument;

use crate::config::TraceOptions;
use crate::domain::error::PlanningResult;
use crate::domain::model::PlanningModel;
use crate::domain::types::{DemandId, PlanId, TaskId, WorkcenterId};
use crate::engine::propagation::PlanningEngine;
use crate::perf::PerfGuard;

/// 静态分析结果
#[derive(Debug, Clone, Default)]
pub struct StaticAnalysis {
    pub demands: Vec<DemandId>,               // 该方案的需求 (排产顺序)
    pub task_levels: BTreeMap<TaskId, u32>,   // 涉及工序的层级
    pub workcenter_levels: BTreeMap<WorkcenterId, u32>,
}

/// 单方案排产汇总
#[derive(Debug, Clone, Serialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub demand_count: usize,
    pub planned_count: usize,
    pub late_count: usize,
    pub task_plan_count: usize,
}

// ==========================================
// SimpleSolver - 逐需求求解器
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SimpleSolver {
    engine: PlanningEngine,
}

impl SimpleSolver {
    pub fn new(trace: TraceOptions) -> Self {
        Self {
            engine: PlanningEngine::new(trace),
        }
    }

    pub fn engine(&self) -> &PlanningEngine {
        &self.engine
    }

    /// 方案的需求,按优先级升序、需求ID 排序
    pub fn plan_demands(model: &PlanningModel, plan: PlanId) -> Vec<DemandId> {
        let mut demands: Vec<DemandId> = model
            .demand_ids()
            .filter(|&d| model.demand(d).plan == plan)
            .collect();
        demands.sort_by(|&a, &b| {
            let (da, db) = (model.demand(a), model.demand(b));
            da.priority
                .cmp(&db.priority)
                .then_with(|| da.demand_id.cmp(&db.demand_id))
        });
        demands
    }

    /// 静态分析
    ///
    /// 1) 过滤该方案的需求
    /// 2) 工序层级 = 距交付工序的上游跳数 (交付工序为 0)
    /// 3) 工作中心层级 = 可能负载它的工序的最大层级
    pub fn run_static_analysis(&self, model: &mut PlanningModel, plan: PlanId) -> StaticAnalysis {
        let demands = Self::plan_demands(model, plan);

        let mut task_levels: BTreeMap<TaskId, u32> = BTreeMap::new();
        let mut seen_skus = HashSet::new();
        for &d in &demands {
            let sku = model.demand(d).sku;
            if !seen_skus.insert(sku) {
                continue;
            }
            let mut current = model.sku(sku).delivery_task;
            let mut level = 0u32;
            while let Some(task) = current {
                let entry = task_levels.entry(task).or_insert(level);
                *entry = (*entry).max(level);
                current = model.task(task).predecessor;
                level += 1;
            }
        }

        let mut workcenter_levels: BTreeMap<WorkcenterId, u32> = BTreeMap::new();
        for (&task, &level) in &task_levels {
            model.set_task_level(task, level);
            for alt in model.task(task).workcenters() {
                let entry = workcenter_levels.entry(alt.workcenter).or_insert(level);
                *entry = (*entry).max(level);
            }
        }
        for (&wc, &level) in &workcenter_levels {
            model.workcenter_mut(wc).level = level;
        }

        tracing::info!(
            plan = %model.plan(plan).plan_id,
            demands = demands.len(),
            tasks = task_levels.len(),
            workcenters = workcenter_levels.len(),
            "静态分析完成"
        );

        StaticAnalysis {
            demands,
            task_levels,
            workcenter_levels,
        }
    }

    /// 为方案排产: 按优先级逐个需求执行请求/承诺传播
    ///
    /// # 错误
    /// - 任一需求排产失败立即返回,不重试
    #[instrument(skip(self, model))]
    pub fn generate_plan(&self, model: &mut PlanningModel, plan: PlanId) -> PlanningResult<PlanSummary> {
        let _perf = PerfGuard::new("generate_plan");
        let demands = Self::plan_demands(model, plan);
        let before = model.task_plan_count();

        for &d in &demands {
            self.engine.plan_demand(model, d)?;
        }

        let planned_count = demands.iter().filter(|&&d| model.demand(d).is_planned()).count();
        let late_count = demands.iter().filter(|&&d| model.demand(d).is_late()).count();
        let summary = PlanSummary {
            plan_id: model.plan(plan).plan_id.clone(),
            demand_count: demands.len(),
            planned_count,
            late_count,
            task_plan_count: model.task_plan_count() - before,
        };

        tracing::info!(
            plan = %summary.plan_id,
            demands = summary.demand_count,
            planned = summary.planned_count,
            late = summary.late_count,
            task_plans = summary.task_plan_count,
            "方案排产完成"
        );
        Ok(summary)
    }

    /// 静态分析 + 排产
    pub fn solve(&self, model: &mut PlanningModel, plan: PlanId) -> PlanningResult<PlanSummary> {
        self.run_static_analysis(model, plan);
        self.generate_plan(model, plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calendar::{Calendar, CalendarShift};
    use crate::domain::demand::Demand;
    use crate::domain::plan::Plan;
    use crate::domain::task::Sku;
    use crate::domain::types::CalendarType;
    use crate::domain::workcenter::Workcenter;
    use chrono::{NaiveDate, NaiveDateTime};

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn three_step_model() -> (PlanningModel, PlanId, [TaskId; 3], WorkcenterId) {
        let mut model = PlanningModel::new();
        let plan = model.add_plan(Plan::new("P1", dt(1, 0), dt(20, 0))).unwrap();
        let other = model.add_plan(Plan::new("P2", dt(1, 0), dt(20, 0))).unwrap();
        let mut cal = Calendar::new("OPEN", CalendarType::Efficiency);
        cal.add_shift(CalendarShift::new(1, dt(1, 0), dt(20, 0), 1, 1.0))
            .unwrap();
        let cal = model.add_calendar(cal).unwrap();
        let wc = model.add_workcenter(Workcenter::new("WC", cal, 1, 1)).unwrap();

        let sku = model.add_sku(Sku::new("A", "")).unwrap();
        let t10 = model.add_task("10", sku, 0, 10, 1, 10).unwrap();
        let t20 = model.add_task("20", sku, 0, 10, 1, 10).unwrap();
        let t30 = model.add_task("30", sku, 0, 10, 1, 10).unwrap();
        model.link_tasks(t20, t10).unwrap();
        model.link_tasks(t30, t20).unwrap();
        model.set_delivery_task(sku, t30).unwrap();
        model.assign_workcenter(t10, wc, 1).unwrap();
        model.assign_workcenter(t30, wc, 1).unwrap();

        for (id, prio, p) in [("D2", 2, plan), ("D1", 2, plan), ("D0", 1, plan), ("DX", 0, other)] {
            model
                .add_demand(Demand::new(id, "C", sku, dt(10, 0), 3, prio, p))
                .unwrap();
        }
        (model, plan, [t10, t20, t30], wc)
    }

    #[test]
    fn test_static_analysis_levels_and_order() {
        let (mut model, plan, [t10, t20, t30], wc) = three_step_model();
        let solver = SimpleSolver::new(TraceOptions::quiet());
        let analysis = solver.run_static_analysis(&mut model, plan);

        let ids: Vec<&str> = analysis
            .demands
            .iter()
            .map(|&d| model.demand(d).demand_id.as_str())
            .collect();
        assert_eq!(ids, vec!["D0", "D1", "D2"]);
        assert_eq!(model.task(t30).level, 0);
        assert_eq!(model.task(t20).level, 1);
        assert_eq!(model.task(t10).level, 2);
        assert_eq!(model.workcenter(wc).level, 2);
        assert_eq!(analysis.workcenter_levels.get(&wc), Some(&2));
    }

    #[test]
    fn test_generate_plan_plans_only_selected_plan() {
        let (mut model, plan, _, _) = three_step_model();
        let solver = SimpleSolver::new(TraceOptions::quiet());
        let summary = solver.solve(&mut model, plan).unwrap();

        assert_eq!(summary.plan_id, "P1");
        assert_eq!(summary.demand_count, 3);
        assert_eq!(summary.planned_count, 3);
        assert_eq!(summary.late_count, 0);
        assert_eq!(summary.task_plan_count, 9);

        let dx = model.find_demand("DX").unwrap();
        assert!(!model.demand(dx).is_planned());
    }
}
