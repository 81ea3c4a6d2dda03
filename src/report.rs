// ==========================================
// 车间作业排产引擎 - 结果报告
// ==========================================
// 输出: 文本 (Plans / Demands / TaskPlans / WorkcenterPlans) 或 JSON
// 范围: 方案列表为全部方案,其余各节只含所选方案
// ==========================================

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::model::PlanningModel;
use crate::domain::types::{PlanId, TaskPlanId};
use crate::engine::solver::{PlanSummary, SimpleSolver};

const DATE_FMT: &str = "%Y-%m-%d %H:%M";

// ==========================================
// 报告记录
// ==========================================

#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub plan_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemandRecord {
    pub demand_id: String,
    pub customer_id: String,
    pub sku: String,
    pub priority: i64,
    pub due_date: NaiveDateTime,
    pub quantity: i64,
    pub plan_date: Option<NaiveDateTime>,
    pub plan_quantity: i64,
    pub late: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskPlanRecord {
    pub task: String,
    pub workcenter: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub quantity: i64,
    pub demand_id: Option<String>,
    pub work_order: Option<String>,
    pub lot_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanGroup {
    pub name: String,
    pub task_plans: Vec<TaskPlanRecord>,
}

// ==========================================
// PlanReport - 单方案报告
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub plan_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<PlanSummary>,
    pub plans: Vec<PlanRecord>,
    pub demands: Vec<DemandRecord>,
    pub task_plans: Vec<PlanGroup>,
    pub workcenter_plans: Vec<PlanGroup>,
}

impl PlanReport {
    /// 从模型构建报告
    pub fn build(model: &PlanningModel, plan: PlanId, summary: Option<PlanSummary>) -> Self {
        let mut plan_ids: Vec<PlanId> = model.plan_ids().collect();
        plan_ids.sort_by(|&a, &b| model.plan(a).plan_id.cmp(&model.plan(b).plan_id));
        let plans = plan_ids
            .into_iter()
            .map(|p| {
                let plan = model.plan(p);
                PlanRecord {
                    plan_id: plan.plan_id.clone(),
                    start: plan.start,
                    end: plan.end,
                    params: plan
                        .params
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone()))
                        .collect(),
                }
            })
            .collect();

        let demands = SimpleSolver::plan_demands(model, plan)
            .into_iter()
            .map(|d| {
                let demand = model.demand(d);
                DemandRecord {
                    demand_id: demand.demand_id.clone(),
                    customer_id: demand.customer_id.clone(),
                    sku: model.sku(demand.sku).name.clone(),
                    priority: demand.priority,
                    due_date: demand.due_date,
                    quantity: demand.quantity,
                    plan_date: demand.plan_date,
                    plan_quantity: demand.plan_quantity,
                    late: demand.is_late(),
                }
            })
            .collect();

        let task_plans = model
            .task_ids()
            .map(|t| {
                let task = model.task(t);
                PlanGroup {
                    name: task.task_number.clone(),
                    task_plans: records(model, plan, &task.task_plans),
                }
            })
            .filter(|g| !g.task_plans.is_empty())
            .collect();

        let workcenter_plans = model
            .workcenter_ids()
            .map(|w| {
                let wc = model.workcenter(w);
                PlanGroup {
                    name: wc.name.clone(),
                    task_plans: records(model, plan, &wc.task_plans),
                }
            })
            .filter(|g| !g.task_plans.is_empty())
            .collect();

        Self {
            plan_id: model.plan(plan).plan_id.clone(),
            summary,
            plans,
            demands,
            task_plans,
            workcenter_plans,
        }
    }

    /// JSON 输出
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// 文本输出
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "==== Plans ====");
        for p in &self.plans {
            let marker = if p.plan_id == self.plan_id { "*" } else { " " };
            let _ = writeln!(
                out,
                "{} {} [ {} - {} ]",
                marker,
                p.plan_id,
                p.start.format(DATE_FMT),
                p.end.format(DATE_FMT)
            );
            for (k, v) in &p.params {
                let _ = writeln!(out, "      {} = {}", k, v);
            }
        }

        if let Some(s) = &self.summary {
            let _ = writeln!(
                out,
                "\nPlan {}: {} demands, {} planned, {} late, {} task plans created",
                s.plan_id, s.demand_count, s.planned_count, s.late_count, s.task_plan_count
            );
        }

        let _ = writeln!(out, "\n==== Demands ====");
        for d in &self.demands {
            let planned = d
                .plan_date
                .map(|t| t.format(DATE_FMT).to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = writeln!(
                out,
                "{:<12} prio {:<4} {:<12} due {} qty {:<6} planned {} qty {:<6}{}",
                d.demand_id,
                d.priority,
                d.sku,
                d.due_date.format(DATE_FMT),
                d.quantity,
                planned,
                d.plan_quantity,
                if d.late { " LATE" } else { "" }
            );
        }

        let _ = writeln!(out, "\n==== TaskPlans ====");
        render_groups(&mut out, &self.task_plans, false);

        let _ = writeln!(out, "\n==== WorkcenterPlans ====");
        render_groups(&mut out, &self.workcenter_plans, true);

        out
    }
}

/// 所选方案的工序计划,按开工时间排序
fn records(model: &PlanningModel, plan: PlanId, ids: &[TaskPlanId]) -> Vec<TaskPlanRecord> {
    let mut selected: Vec<TaskPlanId> = ids
        .iter()
        .copied()
        .filter(|&id| model.task_plan(id).plan == plan)
        .collect();
    selected.sort_by_key(|&id| (model.task_plan(id).start, id));

    selected
        .into_iter()
        .map(|id| {
            let tp = model.task_plan(id);
            let (work_order, lot_id) = match tp.work_order {
                Some(wo) => {
                    let order = model.work_order(wo);
                    (Some(order.work_order_id.clone()), order.lot_of(id))
                }
                None => (None, None),
            };
            TaskPlanRecord {
                task: model.task(tp.task).task_number.clone(),
                workcenter: tp.workcenter.map(|w| model.workcenter(w).name.clone()),
                start: tp.start,
                end: tp.end,
                quantity: tp.quantity(),
                demand_id: tp.demand_id().map(|d| d.to_string()),
                work_order,
                lot_id,
            }
        })
        .collect()
}

fn render_groups(out: &mut String, groups: &[PlanGroup], show_task: bool) {
    for g in groups {
        let _ = writeln!(out, "{}", g.name);
        for tp in &g.task_plans {
            let owner = if show_task {
                tp.task.clone()
            } else {
                tp.workcenter.clone().unwrap_or_else(|| "-".to_string())
            };
            let source = match (&tp.work_order, tp.lot_id) {
                (Some(wo), Some(lot)) => format!(" [{} lot {}]", wo, lot),
                (Some(wo), None) => format!(" [{}]", wo),
                _ => String::new(),
            };
            let _ = writeln!(
                out,
                "    {} - {}  {:<14} qty {:<6} demand {}{}",
                tp.start.format(DATE_FMT),
                tp.end.format(DATE_FMT),
                owner,
                tp.quantity,
                tp.demand_id.as_deref().unwrap_or("-"),
                source
            );
        }
    }
}
