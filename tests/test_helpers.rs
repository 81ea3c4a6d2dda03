// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 构造测试日历、排产模型、平面数据目录
// ==========================================

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use jobshop_aps::domain::types::{CalendarType, PlanId, SkuId, TaskId, WorkcenterId};
use jobshop_aps::{Calendar, CalendarShift, Demand, Plan, PlanningModel, Sku, Workcenter};

/// 2024-01-d HH:MM
pub fn dt(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

/// 白班日历: 每天 08:00-16:00 工作,其余时间为假日
///
/// 从 1 日 00:00 到 (days+1) 日 00:00,每天三个班次:
/// 下标 3k 为 00-08 (假日), 3k+1 为 08-16 (工作), 3k+2 为 16-24 (假日)
pub fn day_shift_calendar(name: &str, days: u32) -> Calendar {
    let mut cal = Calendar::new(name, CalendarType::Efficiency);
    let mut shift_id = 1;
    for d in 1..=days {
        let next_midnight = dt(d, 0, 0) + chrono::Duration::days(1);
        for (start, end, value) in [
            (dt(d, 0, 0), dt(d, 8, 0), 0.0),
            (dt(d, 8, 0), dt(d, 16, 0), 1.0),
            (dt(d, 16, 0), next_midnight, 0.0),
        ] {
            cal.add_shift(CalendarShift::new(shift_id, start, end, 1, value))
                .unwrap();
            shift_id += 1;
        }
    }
    cal
}

/// 单班次日历
pub fn open_calendar(name: &str, start: NaiveDateTime, end: NaiveDateTime, value: f64) -> Calendar {
    let mut cal = Calendar::new(name, CalendarType::Efficiency);
    cal.add_shift(CalendarShift::new(1, start, end, 1, value))
        .unwrap();
    cal
}

/// 两道工序的模型: WIDGET-10 -> WIDGET-20 (交付)
pub struct ChainModel {
    pub model: PlanningModel,
    pub plan: PlanId,
    pub sku: SkuId,
    pub first: TaskId,
    pub last: TaskId,
    pub workcenter: Option<WorkcenterId>,
}

impl ChainModel {
    /// 方案期间为 1 日到 10 日,单件时间 1 分钟,无准备时间
    ///
    /// `with_workcenter` 为 true 时两道工序都指派到白班工作中心 WC1
    pub fn new(with_workcenter: bool) -> Self {
        let mut model = PlanningModel::new();
        let plan = model.add_plan(Plan::new("P1", dt(1, 0, 0), dt(10, 0, 0))).unwrap();
        let sku = model.add_sku(Sku::new("WIDGET", "测试物料")).unwrap();
        let first = model.add_task("10", sku, 0, 1, 1, 1000).unwrap();
        let last = model.add_task("20", sku, 0, 1, 1, 1000).unwrap();
        model.link_tasks(last, first).unwrap();
        model.set_delivery_task(sku, last).unwrap();

        let workcenter = if with_workcenter {
            let cal = model.add_calendar(day_shift_calendar("DAY", 9)).unwrap();
            let wc = model.add_workcenter(Workcenter::new("WC1", cal, 1, 1)).unwrap();
            model.assign_workcenter(first, wc, 1).unwrap();
            model.assign_workcenter(last, wc, 1).unwrap();
            Some(wc)
        } else {
            None
        };

        Self {
            model,
            plan,
            sku,
            first,
            last,
            workcenter,
        }
    }

    /// 登记一个需求
    pub fn add_demand(&mut self, demand_id: &str, due: NaiveDateTime, quantity: i64, priority: i64) {
        self.model
            .add_demand(Demand::new(
                demand_id, "CUST", self.sku, due, quantity, priority, self.plan,
            ))
            .unwrap();
    }
}

// ==========================================
// 平面数据目录
// ==========================================

/// 写入一个完整的最小数据目录 (两道工序 + 白班日历 + 两个需求)
pub fn write_sample_data_dir(dir: &Path) {
    write_file(
        dir,
        "plan.csv",
        "# planid, start, end\nP1, 2024-01-01T00:00:00, 2024-01-04T00:00:00\n",
    );
    write_file(dir, "planparameter.csv", "P1, RESOURCE_CONSTRAINED, true\n");
    write_file(dir, "sku.csv", "WIDGET, 测试物料\n");
    write_file(dir, "calendar.csv", "DAY, EFFICIENCY\n");
    write_file(
        dir,
        "calendarshift.csv",
        "# 乱序登记,加载时按开始时间排序\n\
         DAY, 2, 2024-01-01 08:00:00, 2024-01-01 16:00:00, 1, 1.0\n\
         DAY, 1, 2024-01-01 00:00:00, 2024-01-01 08:00:00, 1, 0\n\
         DAY, 3, 2024-01-01 16:00:00, 2024-01-02 08:00:00, 1, 0\n\
         DAY, 4, 2024-01-02 08:00:00, 2024-01-02 16:00:00, 1, 1.0\n\
         DAY, 5, 2024-01-02 16:00:00, 2024-01-04 00:00:00, 1, 0\n",
    );
    write_file(dir, "workcenter.csv", "WC1, DAY, 1, 1\n");
    write_file(
        dir,
        "task.csv",
        "10, WIDGET, 0, 1, 1, 1000, N\n20, WIDGET, 0, 1, 1, 1000, Y\n",
    );
    write_file(
        dir,
        "demand.csv",
        "P1, D1, CUST, WIDGET, 2024-01-02T12:00:00, 60, 1\n\
         P1, D2, CUST, WIDGET, 2024-01-02T16:00:00, 30, 2\n",
    );
    write_file(dir, "taskprecedence.csv", "20, WIDGET, 10\n");
    write_file(
        dir,
        "taskworkcenterassn.csv",
        "10, WIDGET, WC1, 1\n20, WIDGET, WC1, 1\n",
    );
}

pub fn write_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}
