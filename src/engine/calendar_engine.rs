// ==========================================
// 车间作业排产引擎 - 日历引擎
// ==========================================
// 职责: 把名义工时换算成符合日历的时间区间
// 输入: 日历 (有序、无缝、不重叠的班次序列) + 锚点时间 + 工时 (分钟)
// 输出: DateRange
// 红线: 班次覆盖不到的时间戳返回 CalendarCoverage 错误,不做静默兜底
// ==========================================
// 边界约定:
// - 倒推查询: 恰好落在班次边界的时间属于在此结束的班次 (日历终点属于最后一班)
// - 正推查询: 恰好落在班次边界的时间属于在此开始的班次 (日历终点映射到最后一班)
// - 日历耗尽时换向重算一次,换向后仍耗尽则报 CalendarCoverage
// ==========================================

use chrono::{Duration, NaiveDateTime};

use crate::config::TraceOptions;
use crate::domain::calendar::{Calendar, CalendarShift, DateRange};
use crate::domain::error::{PlanningError, PlanningResult};
use crate::domain::types::Direction;
use crate::perf;

// ==========================================
// CalendarEngine - 日历引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarEngine {
    trace: TraceOptions,
}

impl CalendarEngine {
    /// 构造函数
    ///
    /// # 参数
    /// - `trace`: 追踪开关 (二分查找 / 班次遍历)
    pub fn new(trace: TraceOptions) -> Self {
        Self { trace }
    }

    // ==========================================
    // 班次定位
    // ==========================================

    /// 二分查找包含时间戳的班次 (左闭右开 `[start, end)`)
    ///
    /// # 错误
    /// - 日历为空,或时间戳不在任何班次内: CalendarCoverage
    pub fn locate_shift(&self, calendar: &Calendar, timestamp: NaiveDateTime) -> PlanningResult<usize> {
        perf::record_shift_lookup();
        let shifts = calendar.shifts();
        if shifts.is_empty() {
            return Err(PlanningError::coverage(&calendar.name, timestamp, "日历无班次"));
        }

        let mut lo = 0usize;
        let mut hi = shifts.len();
        while lo < hi {
            let mid = (lo + hi) / 2;
            let shift = &shifts[mid];
            if self.trace.calendar_search {
                tracing::trace!(
                    calendar = %calendar.name,
                    lo,
                    hi,
                    mid,
                    shift_start = %shift.start,
                    shift_end = %shift.end,
                    "班次二分查找"
                );
            }
            if timestamp < shift.start {
                hi = mid;
            } else if timestamp >= shift.end {
                lo = mid + 1;
            } else {
                if self.trace.calendar_search {
                    tracing::trace!(calendar = %calendar.name, %timestamp, index = mid, "定位到班次");
                }
                return Ok(mid);
            }
        }

        Err(PlanningError::coverage(
            &calendar.name,
            timestamp,
            "时间戳不在任何班次内",
        ))
    }

    /// 倒推定位: 边界时间属于在此结束的班次
    pub fn locate_shift_backward(
        &self,
        calendar: &Calendar,
        timestamp: NaiveDateTime,
    ) -> PlanningResult<usize> {
        let shifts = calendar.shifts();
        if calendar.horizon_end() == Some(timestamp) {
            return Ok(shifts.len() - 1);
        }
        let idx = self.locate_shift(calendar, timestamp)?;
        if idx > 0 && shifts[idx].start == timestamp {
            Ok(idx - 1)
        } else {
            Ok(idx)
        }
    }

    /// 正推定位: 边界时间属于在此开始的班次,日历终点映射到最后一班
    pub fn locate_shift_forward(
        &self,
        calendar: &Calendar,
        timestamp: NaiveDateTime,
    ) -> PlanningResult<usize> {
        if calendar.horizon_end() == Some(timestamp) {
            return Ok(calendar.shifts().len() - 1);
        }
        self.locate_shift(calendar, timestamp)
    }

    /// 从 `index` 起按方向查找最近的工作班次 (含 `index` 本身)
    ///
    /// # 返回
    /// - Some(idx): 工作班次下标
    /// - None: 该方向上已无工作班次 (调用方需自行钳制到日历边界)
    pub fn nearest_working_shift(
        shifts: &[CalendarShift],
        index: usize,
        direction: Direction,
    ) -> Option<usize> {
        match direction {
            Direction::Backward => {
                let upper = index.min(shifts.len().checked_sub(1)?);
                (0..=upper).rev().find(|&i| shifts[i].is_working())
            }
            Direction::Forward => (index..shifts.len()).find(|&i| shifts[i].is_working()),
        }
    }

    // ==========================================
    // 有效时间调整
    // ==========================================

    /// 不晚于 `timestamp` 的最近可工作时刻
    ///
    /// 若所在班次为工作班次则原样返回,否则返回前一个工作班次的结束时间;
    /// 前方已无工作班次时钳制到日历起点
    pub fn valid_on_or_before(
        &self,
        calendar: &Calendar,
        timestamp: NaiveDateTime,
    ) -> PlanningResult<NaiveDateTime> {
        let shifts = calendar.shifts();
        let idx = self.locate_shift_backward(calendar, timestamp)?;
        match Self::nearest_working_shift(shifts, idx, Direction::Backward) {
            Some(w) if w == idx => Ok(timestamp),
            Some(w) => Ok(shifts[w].end),
            None => Ok(shifts[0].start),
        }
    }

    /// 不早于 `timestamp` 的最近可工作时刻
    ///
    /// 若所在班次为工作班次则原样返回,否则返回下一个工作班次的开始时间;
    /// 后方已无工作班次时钳制到日历终点
    pub fn valid_on_or_after(
        &self,
        calendar: &Calendar,
        timestamp: NaiveDateTime,
    ) -> PlanningResult<NaiveDateTime> {
        let shifts = calendar.shifts();
        let idx = self.locate_shift_forward(calendar, timestamp)?;
        match Self::nearest_working_shift(shifts, idx, Direction::Forward) {
            Some(w) if w == idx => Ok(timestamp),
            Some(w) => Ok(shifts[w].start),
            None => Ok(shifts[shifts.len() - 1].end),
        }
    }

    // ==========================================
    // 工时换算
    // ==========================================

    /// 倒推: 在 `due_date` 之前 (含) 完工,所需工作时间为 `duration_minutes`
    ///
    /// # 返回
    /// - DateRange(开工, 有效完工)
    ///
    /// # 错误
    /// - duration_minutes <= 0: InvalidRequest
    /// - 倒推越过首班后改为从日历起点正推,仍放不下: CalendarCoverage
    pub fn compute_end_before(
        &self,
        calendar: &Calendar,
        due_date: NaiveDateTime,
        duration_minutes: i64,
    ) -> PlanningResult<DateRange> {
        check_duration(duration_minutes)?;
        self.end_before(calendar, due_date, duration_minutes, true)
    }

    /// 正推: 在 `start_date` 之后 (含) 开工,所需工作时间为 `duration_minutes`
    ///
    /// # 返回
    /// - DateRange(有效开工, 完工)
    ///
    /// # 错误
    /// - duration_minutes <= 0: InvalidRequest
    /// - 正推越过末班后改为从日历终点倒推,仍放不下: CalendarCoverage
    pub fn compute_start_after(
        &self,
        calendar: &Calendar,
        start_date: NaiveDateTime,
        duration_minutes: i64,
    ) -> PlanningResult<DateRange> {
        check_duration(duration_minutes)?;
        self.start_after(calendar, start_date, duration_minutes, true)
    }

    fn end_before(
        &self,
        calendar: &Calendar,
        due_date: NaiveDateTime,
        duration_minutes: i64,
        allow_fallback: bool,
    ) -> PlanningResult<DateRange> {
        let shifts = calendar.shifts();
        let valid_end = self.valid_on_or_before(calendar, due_date)?;
        let mut idx = self.locate_shift_backward(calendar, valid_end)?;
        let mut current_end = valid_end;
        let mut remaining = duration_minutes;

        loop {
            let shift = &shifts[idx];
            let available = working_minutes(shift, shift.start, current_end);
            if self.trace.calendar_walk {
                tracing::trace!(
                    calendar = %calendar.name,
                    shift_id = shift.shift_id,
                    from = %shift.start,
                    to = %current_end,
                    available,
                    remaining,
                    "倒推班次"
                );
            }

            if available >= remaining {
                let start = calc_start(current_end, wall_minutes(remaining, shift.value))?;
                return Ok(DateRange::new(start, valid_end));
            }

            remaining -= available;
            if idx == 0 {
                return self.exhausted(calendar, Direction::Backward, due_date, duration_minutes, allow_fallback);
            }
            idx -= 1;
            current_end = shifts[idx].end;
        }
    }

    fn start_after(
        &self,
        calendar: &Calendar,
        start_date: NaiveDateTime,
        duration_minutes: i64,
        allow_fallback: bool,
    ) -> PlanningResult<DateRange> {
        let shifts = calendar.shifts();
        let valid_start = self.valid_on_or_after(calendar, start_date)?;
        let mut idx = self.locate_shift_forward(calendar, valid_start)?;
        let mut current_start = valid_start;
        let mut remaining = duration_minutes;

        loop {
            let shift = &shifts[idx];
            let available = working_minutes(shift, current_start, shift.end);
            if self.trace.calendar_walk {
                tracing::trace!(
                    calendar = %calendar.name,
                    shift_id = shift.shift_id,
                    from = %current_start,
                    to = %shift.end,
                    available,
                    remaining,
                    "正推班次"
                );
            }

            if available >= remaining {
                let end = calc_end(current_start, wall_minutes(remaining, shift.value))?;
                return Ok(DateRange::new(valid_start, end));
            }

            remaining -= available;
            idx += 1;
            if idx == shifts.len() {
                return self.exhausted(calendar, Direction::Forward, start_date, duration_minutes, allow_fallback);
            }
            current_start = shifts[idx].start;
        }
    }

    /// 日历耗尽: 换向重算一次
    fn exhausted(
        &self,
        calendar: &Calendar,
        direction: Direction,
        anchor: NaiveDateTime,
        duration_minutes: i64,
        allow_fallback: bool,
    ) -> PlanningResult<DateRange> {
        if !allow_fallback {
            return Err(PlanningError::coverage(
                &calendar.name,
                anchor,
                format!("日历可用工时不足 {} 分钟", duration_minutes),
            ));
        }

        let shifts = calendar.shifts();
        match direction {
            Direction::Backward => {
                let first_start = shifts[0].start;
                tracing::debug!(
                    calendar = %calendar.name,
                    due = %anchor,
                    duration_minutes,
                    fallback_start = %first_start,
                    "倒推越过日历起点,改为从起点正推"
                );
                self.start_after(calendar, first_start, duration_minutes, false)
            }
            Direction::Forward => {
                let last_end = shifts[shifts.len() - 1].end;
                tracing::debug!(
                    calendar = %calendar.name,
                    start = %anchor,
                    duration_minutes,
                    fallback_end = %last_end,
                    "正推越过日历终点,改为从终点倒推"
                );
                self.end_before(calendar, last_end, duration_minutes, false)
            }
        }
    }
}

// ==========================================
// 不考虑日历的换算
// ==========================================

/// 名义开工 = 完工 - 工时
///
/// # 错误
/// - 结果超出可表示的时间范围: InvalidRequest
pub fn calc_start(end: NaiveDateTime, minutes: i64) -> PlanningResult<NaiveDateTime> {
    Duration::try_minutes(minutes)
        .and_then(|d| end.checked_sub_signed(d))
        .ok_or_else(|| out_of_range(end, minutes.saturating_neg()))
}

/// 名义完工 = 开工 + 工时
///
/// # 错误
/// - 结果超出可表示的时间范围: InvalidRequest
pub fn calc_end(start: NaiveDateTime, minutes: i64) -> PlanningResult<NaiveDateTime> {
    Duration::try_minutes(minutes)
        .and_then(|d| start.checked_add_signed(d))
        .ok_or_else(|| out_of_range(start, minutes))
}

fn out_of_range(anchor: NaiveDateTime, minutes: i64) -> PlanningError {
    PlanningError::InvalidRequest(format!(
        "时间 {} 偏移 {} 分钟后超出可表示范围",
        anchor, minutes
    ))
}

pub(crate) fn check_duration(duration_minutes: i64) -> PlanningResult<()> {
    if duration_minutes <= 0 {
        return Err(PlanningError::InvalidRequest(format!(
            "工时必须大于 0 (实际 {} 分钟)",
            duration_minutes
        )));
    }
    Ok(())
}

/// 班次片段内可用工时 = ceil(分钟数 × 效率),非工作班次为 0
fn working_minutes(shift: &CalendarShift, from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    if !shift.is_working() {
        return 0;
    }
    let minutes = (to - from).num_minutes();
    (minutes as f64 * shift.value).ceil() as i64
}

/// 提供 `minutes` 工作时间所需的墙钟分钟数 = ceil(分钟数 / 效率)
fn wall_minutes(minutes: i64, value: f64) -> i64 {
    (minutes as f64 / value).ceil() as i64
}
