// ==========================================
// CalendarEngine 集成测试
// ==========================================
// 测试目标: 白班日历上的倒推 / 正推工时换算
// 覆盖范围: 跨假日、假日内交期、边界归属、换向回退、日历耗尽
// ==========================================

mod test_helpers;

use jobshop_aps::config::TraceOptions;
use jobshop_aps::domain::types::CalendarType;
use jobshop_aps::{logging, Calendar, CalendarEngine, CalendarShift, DateRange, PlanningError};
use test_helpers::{day_shift_calendar, dt};

fn engine() -> CalendarEngine {
    logging::init_test();
    CalendarEngine::new(TraceOptions::verbose())
}

// ==========================================
// 倒推
// ==========================================

#[test]
fn test_backward_skips_overnight_holiday() {
    let cal = day_shift_calendar("DAY", 5);
    let range = engine().compute_end_before(&cal, dt(3, 10, 0), 240).unwrap();
    assert_eq!(range, DateRange::new(dt(2, 14, 0), dt(3, 10, 0)));
}

#[test]
fn test_backward_due_in_holiday_moves_to_previous_shift_end() {
    let cal = day_shift_calendar("DAY", 5);
    let range = engine().compute_end_before(&cal, dt(2, 20, 0), 60).unwrap();
    assert_eq!(range, DateRange::new(dt(2, 15, 0), dt(2, 16, 0)));
}

#[test]
fn test_backward_half_efficiency_doubles_wall_time() {
    let mut cal = Calendar::new("HALF", CalendarType::Efficiency);
    cal.add_shift(CalendarShift::new(1, dt(1, 8, 0), dt(1, 16, 0), 1, 0.5))
        .unwrap();

    // 交期恰为日历终点
    let range = engine().compute_end_before(&cal, dt(1, 16, 0), 120).unwrap();
    assert_eq!(range, DateRange::new(dt(1, 12, 0), dt(1, 16, 0)));
}

#[test]
fn test_backward_exhaustion_falls_back_to_forward_from_start() {
    let cal = day_shift_calendar("DAY", 5);
    let range = engine().compute_end_before(&cal, dt(1, 10, 0), 240).unwrap();

    // 放不进交期之前,改为从日历起点正推,完工晚于交期
    assert_eq!(range, DateRange::new(dt(1, 8, 0), dt(1, 12, 0)));
    assert!(range.end() > dt(1, 10, 0));
}

// ==========================================
// 正推
// ==========================================

#[test]
fn test_forward_start_in_holiday_moves_to_next_shift_start() {
    let cal = day_shift_calendar("DAY", 5);
    let range = engine().compute_start_after(&cal, dt(1, 20, 0), 60).unwrap();
    assert_eq!(range, DateRange::new(dt(2, 8, 0), dt(2, 9, 0)));
}

#[test]
fn test_forward_exhaustion_falls_back_to_backward_from_end() {
    let cal = day_shift_calendar("DAY", 5);
    let range = engine().compute_start_after(&cal, dt(5, 14, 0), 240).unwrap();
    assert_eq!(range, DateRange::new(dt(5, 12, 0), dt(5, 16, 0)));
}

#[test]
fn test_backward_then_forward_round_trip() {
    let cal = day_shift_calendar("DAY", 5);
    let e = engine();
    let back = e.compute_end_before(&cal, dt(3, 10, 0), 240).unwrap();
    let fwd = e.compute_start_after(&cal, back.start(), 240).unwrap();
    assert_eq!(fwd, back);
}

#[test]
fn test_whole_calendar_too_short_is_coverage_error() {
    let cal = day_shift_calendar("DAY", 5);
    let total = 5 * 480;
    let e = engine();

    assert!(matches!(
        e.compute_end_before(&cal, dt(4, 12, 0), total + 1),
        Err(PlanningError::CalendarCoverage { .. })
    ));
    assert!(matches!(
        e.compute_start_after(&cal, dt(2, 12, 0), total + 1),
        Err(PlanningError::CalendarCoverage { .. })
    ));

    // 恰好用满整个日历
    let range = e.compute_start_after(&cal, dt(1, 0, 0), total).unwrap();
    assert_eq!(range, DateRange::new(dt(1, 8, 0), dt(5, 16, 0)));
}

#[test]
fn test_non_positive_duration_rejected() {
    let cal = day_shift_calendar("DAY", 2);
    assert!(matches!(
        engine().compute_end_before(&cal, dt(2, 12, 0), 0),
        Err(PlanningError::InvalidRequest(_))
    ));
    assert!(matches!(
        engine().compute_start_after(&cal, dt(1, 12, 0), -5),
        Err(PlanningError::InvalidRequest(_))
    ));
}

// ==========================================
// 班次定位
// ==========================================

#[test]
fn test_boundary_belongs_to_direction() {
    let cal = day_shift_calendar("DAY", 5);
    let e = engine();

    // 2 日 08:00: 倒推属于在此结束的假日班次,正推属于在此开始的工作班次
    assert_eq!(e.locate_shift_backward(&cal, dt(2, 8, 0)).unwrap(), 3);
    assert_eq!(e.locate_shift_forward(&cal, dt(2, 8, 0)).unwrap(), 4);
    assert_eq!(e.locate_shift(&cal, dt(2, 8, 0)).unwrap(), 4);

    // 日历终点: 两个方向都映射到最后一班
    assert_eq!(e.locate_shift_backward(&cal, dt(6, 0, 0)).unwrap(), 14);
    assert_eq!(e.locate_shift_forward(&cal, dt(6, 0, 0)).unwrap(), 14);
}

#[test]
fn test_locate_outside_calendar_fails() {
    let cal = day_shift_calendar("DAY", 5);
    let e = engine();

    assert!(matches!(
        e.locate_shift(&cal, dt(6, 0, 0)),
        Err(PlanningError::CalendarCoverage { .. })
    ));
    let before = dt(1, 0, 0) - chrono::Duration::minutes(1);
    assert!(matches!(
        e.locate_shift(&cal, before),
        Err(PlanningError::CalendarCoverage { .. })
    ));

    let empty = Calendar::new("EMPTY", CalendarType::Efficiency);
    assert!(e.locate_shift(&empty, dt(1, 0, 0)).is_err());
}

#[test]
fn test_valid_time_clamps_to_calendar_edges() {
    let cal = day_shift_calendar("DAY", 5);
    let e = engine();

    // 工作班次内原样返回
    assert_eq!(e.valid_on_or_before(&cal, dt(3, 9, 30)).unwrap(), dt(3, 9, 30));
    assert_eq!(e.valid_on_or_after(&cal, dt(3, 9, 30)).unwrap(), dt(3, 9, 30));

    // 首个工作班次之前 / 末个工作班次之后
    assert_eq!(e.valid_on_or_before(&cal, dt(1, 5, 0)).unwrap(), dt(1, 0, 0));
    assert_eq!(e.valid_on_or_after(&cal, dt(5, 20, 0)).unwrap(), dt(6, 0, 0));
}
