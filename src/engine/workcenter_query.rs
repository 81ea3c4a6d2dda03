// ==========================================
// 车间作业排产引擎 - 工作中心查询与备选选择
// ==========================================
// 职责: 在工序的备选工作中心上做日历换算,并按方案策略选定工作中心
// 策略:
// - RESOURCE_CONSTRAINED = false: 只用优先级数值最小的工作中心
// - RESOURCE_CONSTRAINED = true: 按优先级遍历,倒推取首个按期完工者,
//   无按期者取完工最早者;正推取完工最早者
// 红线: 不做同一工作中心上的计划重叠检查 (不是产能模拟)
// ==========================================

use chrono::NaiveDateTime;

use crate::domain::calendar::DateRange;
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::model::PlanningModel;
use crate::domain::types::{PlanId, TaskId, WorkcenterId};
use crate::engine::calendar_engine::CalendarEngine;

/// 选定结果: 工作中心 + 时间区间
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub workcenter: WorkcenterId,
    pub range: DateRange,
}

// ==========================================
// WorkcenterQuery - 工作中心查询
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct WorkcenterQuery {
    calendar_engine: CalendarEngine,
}

impl WorkcenterQuery {
    pub fn new(calendar_engine: CalendarEngine) -> Self {
        Self { calendar_engine }
    }

    /// 在工作中心日历上倒推: 不晚于 `due` 完工
    pub fn query_end_before(
        &self,
        model: &PlanningModel,
        workcenter: WorkcenterId,
        due: NaiveDateTime,
        lead_time: i64,
    ) -> PlanningResult<DateRange> {
        let calendar = model.workcenter_calendar(workcenter);
        let range = self.calendar_engine.compute_end_before(calendar, due, lead_time)?;
        tracing::debug!(
            workcenter = %model.workcenter(workcenter).name,
            %due,
            lead_time,
            range = %range,
            "工作中心倒推"
        );
        Ok(range)
    }

    /// 在工作中心日历上正推: 不早于 `start` 开工
    pub fn query_start_after(
        &self,
        model: &PlanningModel,
        workcenter: WorkcenterId,
        start: NaiveDateTime,
        lead_time: i64,
    ) -> PlanningResult<DateRange> {
        let calendar = model.workcenter_calendar(workcenter);
        let range = self.calendar_engine.compute_start_after(calendar, start, lead_time)?;
        tracing::debug!(
            workcenter = %model.workcenter(workcenter).name,
            %start,
            lead_time,
            range = %range,
            "工作中心正推"
        );
        Ok(range)
    }

    /// 倒推选择备选工作中心
    ///
    /// # 返回
    /// - Ok(None): 工序没有备选工作中心 (调用方走不考虑日历的换算)
    pub fn select_end_before(
        &self,
        model: &PlanningModel,
        task: TaskId,
        plan: PlanId,
        due: NaiveDateTime,
        lead_time: i64,
    ) -> PlanningResult<Option<Placement>> {
        let alternates = model.task(task).workcenters();
        let Some(first) = alternates.first() else {
            return Ok(None);
        };

        if !model.plan(plan).is_resource_constrained() {
            let range = self.query_end_before(model, first.workcenter, due, lead_time)?;
            return Ok(Some(Placement {
                workcenter: first.workcenter,
                range,
            }));
        }

        let mut best: Option<Placement> = None;
        for alt in alternates {
            let range = self.query_end_before(model, alt.workcenter, due, lead_time)?;
            let candidate = Placement {
                workcenter: alt.workcenter,
                range,
            };
            if range.end() <= due {
                tracing::debug!(
                    task = %model.task(task).task_number,
                    workcenter = %model.workcenter(alt.workcenter).name,
                    priority = alt.priority,
                    "备选工作中心按期完工"
                );
                return Ok(Some(candidate));
            }
            if best.map_or(true, |b| range.end() < b.range.end()) {
                best = Some(candidate);
            }
        }

        if let Some(b) = &best {
            tracing::debug!(
                task = %model.task(task).task_number,
                workcenter = %model.workcenter(b.workcenter).name,
                end = %b.range.end(),
                %due,
                "无按期完工的备选,取完工最早者"
            );
        }
        best.map(Some).ok_or_else(|| no_alternate(model, task))
    }

    /// 正推选择备选工作中心
    ///
    /// # 返回
    /// - Ok(None): 工序没有备选工作中心
    pub fn select_start_after(
        &self,
        model: &PlanningModel,
        task: TaskId,
        plan: PlanId,
        start: NaiveDateTime,
        lead_time: i64,
    ) -> PlanningResult<Option<Placement>> {
        let alternates = model.task(task).workcenters();
        let Some(first) = alternates.first() else {
            return Ok(None);
        };

        if !model.plan(plan).is_resource_constrained() {
            let range = self.query_start_after(model, first.workcenter, start, lead_time)?;
            return Ok(Some(Placement {
                workcenter: first.workcenter,
                range,
            }));
        }

        let mut best: Option<Placement> = None;
        for alt in alternates {
            let range = self.query_start_after(model, alt.workcenter, start, lead_time)?;
            // 同完工时间保留优先级更高者
            if best.map_or(true, |b| range.end() < b.range.end()) {
                best = Some(Placement {
                    workcenter: alt.workcenter,
                    range,
                });
            }
        }
        best.map(Some).ok_or_else(|| no_alternate(model, task))
    }
}

fn no_alternate(model: &PlanningModel, task: TaskId) -> PlanningError {
    PlanningError::ModelIntegrity(format!(
        "工序 {} 没有可用的备选工作中心",
        model.task(task).task_number
    ))
}
