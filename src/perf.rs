// ==========================================
// 车间作业排产引擎 - 性能统计
// ==========================================
// 职责: 线程内计数班次定位与新建工序计划,由 PerfGuard 汇总输出
// 红线: 计数只在 PerfGuard 存活期间累加
// ==========================================

use std::cell::Cell;
use std::time::Instant;

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SHIFT_LOOKUP_COUNT: Cell<u64> = Cell::new(0);
    static TASK_PLAN_COUNT: Cell<u64> = Cell::new(0);
}

fn bump(counter: &'static std::thread::LocalKey<Cell<u64>>) {
    let active = PERF_DEPTH.with(|d| d.get() > 0);
    if !active {
        return;
    }
    counter.with(|c| c.set(c.get().saturating_add(1)));
}

/// 记录一次班次定位 (二分查找)
pub fn record_shift_lookup() {
    bump(&SHIFT_LOOKUP_COUNT);
}

/// 记录一条新建的任务计划
pub fn record_task_plan() {
    bump(&TASK_PLAN_COUNT);
}

/// 性能统计 Guard：记录 elapsed_ms + 班次定位次数 + 新建任务计划数
///
/// 使用方式：
/// ```ignore
/// let _perf = jobshop_aps::perf::PerfGuard::new("generate_plan");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    lookup_start: u64,
    task_plan_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        let lookup_start = SHIFT_LOOKUP_COUNT.with(|c| c.get());
        let task_plan_start = TASK_PLAN_COUNT.with(|c| c.get());
        Self {
            op,
            start: Instant::now(),
            lookup_start,
            task_plan_start,
        }
    }

    /// 自 Guard 创建以来的班次定位次数
    pub fn shift_lookups(&self) -> u64 {
        SHIFT_LOOKUP_COUNT
            .with(|c| c.get())
            .saturating_sub(self.lookup_start)
    }

    /// 自 Guard 创建以来新建的任务计划数
    pub fn task_plans(&self) -> u64 {
        TASK_PLAN_COUNT
            .with(|c| c.get())
            .saturating_sub(self.task_plan_start)
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let shift_lookups = self.shift_lookups();
        let task_plans = self.task_plans();

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            shift_lookups,
            task_plans,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_only_inside_guard() {
        // Guard 之外不计数
        record_shift_lookup();

        let guard = PerfGuard::new("unit");
        record_shift_lookup();
        record_shift_lookup();
        record_task_plan();
        assert_eq!(guard.shift_lookups(), 2);
        assert_eq!(guard.task_plans(), 1);
    }
}
