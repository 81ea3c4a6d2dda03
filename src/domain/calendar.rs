// ==========================================
// 车间作业排产引擎 - 日历领域模型
// ==========================================
// 职责: 日历 / 班次 / 日期区间 (纯数据)
// 红线: 班次按开始时间升序、首尾相接、无重叠
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::types::CalendarType;

/// 判定工作班次的效率下限 (值大于该阈值即为工作班次)
pub const WORKING_EPSILON: f64 = 0.000001;

// ==========================================
// CalendarShift - 日历班次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarShift {
    pub shift_id: i32,        // 班次ID (日历内唯一)
    pub start: NaiveDateTime, // 开始时间 (含)
    pub end: NaiveDateTime,   // 结束时间 (不含)
    pub priority: i32,        // 优先级 (当前算法未使用)
    pub value: f64,           // 效率值 [0,1], 0 = 假日
}

impl CalendarShift {
    pub fn new(
        shift_id: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        priority: i32,
        value: f64,
    ) -> Self {
        Self {
            shift_id,
            start,
            end,
            priority,
            value,
        }
    }

    /// 是否为工作班次
    pub fn is_working(&self) -> bool {
        self.value > WORKING_EPSILON
    }

    /// 时间点是否落在 [start, end) 内
    pub fn contains(&self, timestamp: NaiveDateTime) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// 班次时长 (分钟)
    pub fn length_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

// ==========================================
// Calendar - 日历
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct Calendar {
    pub name: String,
    pub calendar_type: CalendarType,
    shifts: Vec<CalendarShift>,
    #[serde(skip)]
    shift_ids: HashSet<i32>,
}

impl Calendar {
    pub fn new(name: impl Into<String>, calendar_type: CalendarType) -> Self {
        Self {
            name: name.into(),
            calendar_type,
            shifts: Vec::new(),
            shift_ids: HashSet::new(),
        }
    }

    /// 追加班次
    ///
    /// 新班次必须紧接上一个班次的结束时间开始,且结束晚于开始
    ///
    /// # 返回
    /// - Ok(()): 追加成功
    /// - Err(ModelIntegrity): 班次重叠 / 有空档 / ID 重复 / 区间为空
    pub fn add_shift(&mut self, shift: CalendarShift) -> PlanningResult<()> {
        if shift.end <= shift.start {
            return Err(PlanningError::ModelIntegrity(format!(
                "日历 {} 班次 {} 区间无效: [{} - {})",
                self.name, shift.shift_id, shift.start, shift.end
            )));
        }
        if self.shift_ids.contains(&shift.shift_id) {
            return Err(PlanningError::ModelIntegrity(format!(
                "日历 {} 班次ID重复: {}",
                self.name, shift.shift_id
            )));
        }
        if let Some(last) = self.shifts.last() {
            if last.end != shift.start {
                return Err(PlanningError::ModelIntegrity(format!(
                    "日历 {} 班次不连续: 上一班次结束于 {}, 班次 {} 开始于 {}",
                    self.name, last.end, shift.shift_id, shift.start
                )));
            }
        }
        self.shift_ids.insert(shift.shift_id);
        self.shifts.push(shift);
        Ok(())
    }

    pub fn shifts(&self) -> &[CalendarShift] {
        &self.shifts
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    /// 日历终点 (最后一个班次结束时间)
    pub fn horizon_end(&self) -> Option<NaiveDateTime> {
        self.shifts.last().map(|s| s.end)
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-Calendar-{}", self.calendar_type, self.name)
    }
}

// ==========================================
// DateRange - 日期区间 (不可变)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// 区间跨度 (分钟)
    pub fn span_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {} - {} ]", self.start, self.end)
    }
}
