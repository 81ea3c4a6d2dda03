// ==========================================
// 车间作业排产引擎 - 平面文件加载器
// ==========================================
// 格式: 逗号分隔, 无表头, `#` 开头为注释, 字段去首尾空白
// 日期: YYYY-MM-DDTHH:MM:SS 或 YYYY-MM-DD HH:MM:SS
// 顺序: 方案 -> 方案参数 -> 物料 -> 日历 -> 班次 -> 工作中心 -> 工序
//       -> 需求 -> 前后道 -> 工序/工作中心关联 -> 已下达工单 -> 整体校验
// ==========================================

use std::collections::BTreeMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use crate::domain::calendar::{Calendar, CalendarShift};
use crate::domain::demand::Demand;
use crate::domain::error::PlanningError;
use crate::domain::model::PlanningModel;
use crate::domain::plan::Plan;
use crate::domain::task::Sku;
use crate::domain::types::{CalendarId, CalendarType, PlanId, SkuId, TaskId, WorkcenterId};
use crate::domain::work_order::ReleasedWorkOrder;
use crate::domain::workcenter::Workcenter;
use crate::importer::error::{LoadError, LoadResult};

/// 数据文件名
pub mod files {
    pub const PLAN: &str = "plan.csv";
    pub const PLAN_PARAMETER: &str = "planparameter.csv";
    pub const SKU: &str = "sku.csv";
    pub const CALENDAR: &str = "calendar.csv";
    pub const CALENDAR_SHIFT: &str = "calendarshift.csv";
    pub const WORKCENTER: &str = "workcenter.csv";
    pub const TASK: &str = "task.csv";
    pub const DEMAND: &str = "demand.csv";
    pub const TASK_PRECEDENCE: &str = "taskprecedence.csv";
    pub const TASK_WORKCENTER: &str = "taskworkcenterassn.csv";
    pub const RELEASED_WORK_ORDER: &str = "releasedworkorder.csv"; // 可选
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// 加载统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub plans: usize,
    pub skus: usize,
    pub calendars: usize,
    pub workcenters: usize,
    pub tasks: usize,
    pub demands: usize,
    pub work_orders: usize,
}

impl LoadSummary {
    pub fn from_model(model: &PlanningModel) -> Self {
        Self {
            plans: model.plan_ids().count(),
            skus: model.sku_ids().count(),
            calendars: model.calendar_ids().count(),
            workcenters: model.workcenter_ids().count(),
            tasks: model.task_ids().count(),
            demands: model.demand_ids().count(),
            work_orders: model.work_order_ids().count(),
        }
    }
}

/// 交付工序标记: Y/y/1/T/t
pub fn is_delivery_flag(value: &str) -> bool {
    matches!(value.trim(), "Y" | "y" | "1" | "T" | "t")
}

/// 解析日期时间
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}

// ==========================================
// Row - 带文件/行号上下文的记录
// ==========================================
struct Row {
    file: &'static str,
    line: u64,
    record: StringRecord,
}

impl Row {
    fn opt(&self, idx: usize) -> Option<&str> {
        self.record.get(idx).filter(|v| !v.is_empty())
    }

    fn str(&self, idx: usize, field: &str) -> LoadResult<&str> {
        self.opt(idx).ok_or_else(|| LoadError::MissingField {
            file: self.file.to_string(),
            line: self.line,
            field: field.to_string(),
        })
    }

    fn parse<T>(&self, idx: usize, field: &str) -> LoadResult<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.str(idx, field)?;
        raw.parse::<T>().map_err(|e| LoadError::TypeConversionError {
            file: self.file.to_string(),
            line: self.line,
            field: field.to_string(),
            value: raw.to_string(),
            message: e.to_string(),
        })
    }

    fn date(&self, idx: usize, field: &str) -> LoadResult<NaiveDateTime> {
        let raw = self.str(idx, field)?;
        parse_datetime(raw).ok_or_else(|| LoadError::DateFormatError {
            file: self.file.to_string(),
            line: self.line,
            field: field.to_string(),
            value: raw.to_string(),
        })
    }

    fn unknown(&self, entity: &str, key: impl Into<String>) -> LoadError {
        LoadError::UnknownReference {
            file: self.file.to_string(),
            line: self.line,
            entity: entity.to_string(),
            key: key.into(),
        }
    }

    fn model_err(&self, source: PlanningError) -> LoadError {
        LoadError::Model {
            file: self.file.to_string(),
            line: self.line,
            source,
        }
    }
}

// ==========================================
// FlatFileLoader - 平面文件加载器
// ==========================================
pub struct FlatFileLoader {
    data_dir: PathBuf,
}

impl FlatFileLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// 加载全部文件并校验模型
    pub fn load(&self) -> LoadResult<PlanningModel> {
        let mut model = PlanningModel::new();

        self.load_plans(&mut model)?;
        self.load_plan_parameters(&mut model)?;
        self.load_skus(&mut model)?;
        self.load_calendars(&mut model)?;
        self.load_calendar_shifts(&mut model)?;
        self.load_workcenters(&mut model)?;
        self.load_tasks(&mut model)?;
        self.load_demands(&mut model)?;
        self.load_task_precedences(&mut model)?;
        self.load_task_workcenters(&mut model)?;
        self.load_released_work_orders(&mut model)?;

        model.validate()?;

        let summary = LoadSummary::from_model(&model);
        tracing::info!(
            data_dir = %self.data_dir.display(),
            plans = summary.plans,
            skus = summary.skus,
            calendars = summary.calendars,
            workcenters = summary.workcenters,
            tasks = summary.tasks,
            demands = summary.demands,
            work_orders = summary.work_orders,
            "数据加载完成"
        );
        Ok(model)
    }

    fn read_rows(&self, file: &'static str, required: bool) -> LoadResult<Vec<Row>> {
        let path = self.data_dir.join(file);
        if !path.exists() {
            if required {
                return Err(LoadError::FileNotFound(path.display().to_string()));
            }
            tracing::debug!(file, "可选文件不存在,跳过");
            return Ok(Vec::new());
        }

        let csv_err = |e: csv::Error| LoadError::CsvParseError {
            file: file.to_string(),
            message: e.to_string(),
        };
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .comment(Some(b'#'))
            .trim(Trim::All)
            .flexible(true)
            .from_path(&path)
            .map_err(csv_err)?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(csv_err)?;
            // 跳过完全空白的行
            if record.iter().all(|v| v.is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            rows.push(Row { file, line, record });
        }
        tracing::debug!(file, rows = rows.len(), "读取文件");
        Ok(rows)
    }

    // ===== 引用查找 =====

    fn plan_ref(model: &PlanningModel, row: &Row, idx: usize) -> LoadResult<PlanId> {
        let key = row.str(idx, "planid")?;
        model.find_plan(key).ok_or_else(|| row.unknown("方案", key))
    }

    fn sku_ref(model: &PlanningModel, row: &Row, idx: usize) -> LoadResult<SkuId> {
        let key = row.str(idx, "sku")?;
        model.find_sku(key).ok_or_else(|| row.unknown("物料", key))
    }

    fn calendar_ref(model: &PlanningModel, row: &Row, idx: usize) -> LoadResult<CalendarId> {
        let key = row.str(idx, "calendar")?;
        model.find_calendar(key).ok_or_else(|| row.unknown("日历", key))
    }

    fn workcenter_ref(model: &PlanningModel, row: &Row, idx: usize) -> LoadResult<WorkcenterId> {
        let key = row.str(idx, "workcenter")?;
        model
            .find_workcenter(key)
            .ok_or_else(|| row.unknown("工作中心", key))
    }

    fn task_ref(
        model: &PlanningModel,
        row: &Row,
        task_idx: usize,
        sku_idx: usize,
    ) -> LoadResult<TaskId> {
        let task_id = row.str(task_idx, "taskid")?;
        let sku = row.str(sku_idx, "sku")?;
        model
            .find_task_for(sku, task_id)
            .ok_or_else(|| row.unknown("工序", format!("{}-{}", sku, task_id)))
    }

    // ===== 各文件 =====

    /// plan.csv: planid, start, end
    fn load_plans(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::PLAN, true)? {
            let plan = Plan::new(
                row.str(0, "planid")?,
                row.date(1, "start")?,
                row.date(2, "end")?,
            );
            model.add_plan(plan).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// planparameter.csv: planid, key, value
    fn load_plan_parameters(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::PLAN_PARAMETER, true)? {
            let plan = Self::plan_ref(model, &row, 0)?;
            let key = row.str(1, "key")?;
            let value = row.opt(2).unwrap_or("");
            model.plan_mut(plan).set_param(key, value);
        }
        Ok(())
    }

    /// sku.csv: name, description
    fn load_skus(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::SKU, true)? {
            let sku = Sku::new(row.str(0, "name")?, row.opt(1).unwrap_or(""));
            model.add_sku(sku).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// calendar.csv: name, type
    fn load_calendars(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::CALENDAR, true)? {
            let calendar_type = CalendarType::parse(row.opt(1).unwrap_or("EFFICIENCY"));
            let calendar = Calendar::new(row.str(0, "name")?, calendar_type);
            model.add_calendar(calendar).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// calendarshift.csv: calendar, shiftid, start, end, priority, value
    ///
    /// 同一日历的班次按开始时间排序后依次登记
    fn load_calendar_shifts(&self, model: &mut PlanningModel) -> LoadResult<()> {
        let mut by_calendar: BTreeMap<CalendarId, Vec<(Row, CalendarShift)>> = BTreeMap::new();
        for row in self.read_rows(files::CALENDAR_SHIFT, true)? {
            let calendar = Self::calendar_ref(model, &row, 0)?;
            let shift = CalendarShift::new(
                row.parse(1, "shiftid")?,
                row.date(2, "start")?,
                row.date(3, "end")?,
                row.parse(4, "priority")?,
                row.parse(5, "value")?,
            );
            by_calendar.entry(calendar).or_default().push((row, shift));
        }

        for (calendar, mut shifts) in by_calendar {
            shifts.sort_by_key(|(_, s)| s.start);
            for (row, shift) in shifts {
                model
                    .calendar_mut(calendar)
                    .add_shift(shift)
                    .map_err(|e| row.model_err(e))?;
            }
        }
        Ok(())
    }

    /// workcenter.csv: name, calendar, max_setups_per_shift, criticality_index
    fn load_workcenters(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::WORKCENTER, true)? {
            let calendar = Self::calendar_ref(model, &row, 1)?;
            let workcenter = Workcenter::new(
                row.str(0, "name")?,
                calendar,
                row.parse(2, "max_setups_per_shift")?,
                row.parse(3, "criticality_index")?,
            );
            model.add_workcenter(workcenter).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// task.csv: taskid, sku, setup, per_unit, min_lot, max_lot, delivery_flag
    fn load_tasks(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::TASK, true)? {
            let sku = Self::sku_ref(model, &row, 1)?;
            let task = model
                .add_task(
                    row.str(0, "taskid")?,
                    sku,
                    row.parse(2, "setup_time")?,
                    row.parse(3, "per_unit_time")?,
                    row.parse(4, "min_lot_size")?,
                    row.parse(5, "max_lot_size")?,
                )
                .map_err(|e| row.model_err(e))?;
            if row.opt(6).map(is_delivery_flag).unwrap_or(false) {
                model
                    .set_delivery_task(sku, task)
                    .map_err(|e| row.model_err(e))?;
            }
        }
        Ok(())
    }

    /// demand.csv: planid, demandid, customer, sku, duedate, qty, priority
    fn load_demands(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::DEMAND, true)? {
            let plan = Self::plan_ref(model, &row, 0)?;
            let sku = Self::sku_ref(model, &row, 3)?;
            let demand = Demand::new(
                row.str(1, "demandid")?,
                row.opt(2).unwrap_or(""),
                sku,
                row.date(4, "duedate")?,
                row.parse(5, "quantity")?,
                row.parse(6, "priority")?,
                plan,
            );
            model.add_demand(demand).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// taskprecedence.csv: taskid, sku, predecessor_taskid
    fn load_task_precedences(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::TASK_PRECEDENCE, true)? {
            let successor = Self::task_ref(model, &row, 0, 1)?;
            let predecessor = Self::task_ref(model, &row, 2, 1)?;
            model
                .link_tasks(successor, predecessor)
                .map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// taskworkcenterassn.csv: taskid, sku, workcenter, priority
    fn load_task_workcenters(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::TASK_WORKCENTER, true)? {
            let task = Self::task_ref(model, &row, 0, 1)?;
            let workcenter = Self::workcenter_ref(model, &row, 2)?;
            let priority = row.parse(3, "priority")?;
            model
                .assign_workcenter(task, workcenter, priority)
                .map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }

    /// releasedworkorder.csv (可选):
    /// woid, lotid, planid, taskid, sku, workcenter?, start, end, qty, demandid?
    fn load_released_work_orders(&self, model: &mut PlanningModel) -> LoadResult<()> {
        for row in self.read_rows(files::RELEASED_WORK_ORDER, false)? {
            let plan = Self::plan_ref(model, &row, 2)?;
            let task = Self::task_ref(model, &row, 3, 4)?;
            let workcenter = match row.opt(5) {
                Some(_) => Some(Self::workcenter_ref(model, &row, 5)?),
                None => None,
            };
            let work_order = ReleasedWorkOrder::new(
                row.str(0, "woid")?,
                row.parse(1, "lotid")?,
                task,
                plan,
                workcenter,
                row.date(6, "start")?,
                row.date(7, "end")?,
                row.parse(8, "quantity")?,
                row.opt(9).map(|d| d.to_string()),
            );
            model.add_work_order(work_order).map_err(|e| row.model_err(e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_flag() {
        for v in ["Y", "y", "1", "T", "t", " Y "] {
            assert!(is_delivery_flag(v), "{}", v);
        }
        for v in ["N", "0", "yes", ""] {
            assert!(!is_delivery_flag(v), "{}", v);
        }
    }

    #[test]
    fn test_parse_datetime_formats() {
        let a = parse_datetime("2024-01-02T08:30:00").unwrap();
        let b = parse_datetime("2024-01-02 08:30:00").unwrap();
        assert_eq!(a, b);
        assert!(parse_datetime("2024/01/02 08:30").is_none());
    }
}
