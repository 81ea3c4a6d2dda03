// ==========================================
// 分区标记集成测试
// ==========================================
// 测试目标: 连通分量编号与冲突检查
// 覆盖范围: 共享日历不连通、共享工作中心连通、排产结果并入所属分区
// ==========================================

mod test_helpers;

use jobshop_aps::config::TraceOptions;
use jobshop_aps::domain::types::{CalendarId, NodeRef, PlanId, SkuId, TaskId, WorkcenterId};
use jobshop_aps::engine::propagate_partition_id;
use jobshop_aps::{
    assign_partitions, Demand, Plan, PlanningModel, SimpleSolver, Sku, Workcenter,
};
use test_helpers::{day_shift_calendar, dt};

struct TwoProducts {
    model: PlanningModel,
    plan: PlanId,
    calendar: CalendarId,
    skus: [SkuId; 2],
    tasks: [TaskId; 2],
    workcenters: [WorkcenterId; 2],
}

/// 两个单工序物料,各自一个工作中心,两个工作中心共用一张日历
fn two_products() -> TwoProducts {
    let mut model = PlanningModel::new();
    let plan = model.add_plan(Plan::new("P1", dt(1, 0, 0), dt(6, 0, 0))).unwrap();
    let calendar = model.add_calendar(day_shift_calendar("DAY", 5)).unwrap();
    let wa = model.add_workcenter(Workcenter::new("WA", calendar, 1, 1)).unwrap();
    let wb = model.add_workcenter(Workcenter::new("WB", calendar, 1, 1)).unwrap();
    let a = model.add_sku(Sku::new("A", "")).unwrap();
    let b = model.add_sku(Sku::new("B", "")).unwrap();
    let ta = model.add_task("10", a, 0, 1, 1, 100).unwrap();
    let tb = model.add_task("10", b, 0, 1, 1, 100).unwrap();
    model.set_delivery_task(a, ta).unwrap();
    model.set_delivery_task(b, tb).unwrap();
    model.assign_workcenter(ta, wa, 1).unwrap();
    model.assign_workcenter(tb, wb, 1).unwrap();
    TwoProducts {
        model,
        plan,
        calendar,
        skus: [a, b],
        tasks: [ta, tb],
        workcenters: [wa, wb],
    }
}

#[test]
fn test_shared_calendar_does_not_join_partitions() {
    let tp = two_products();
    let map = assign_partitions(&tp.model);

    // 每个分区: 物料 + 工序 + 工作中心
    assert_eq!(map.partition_count(), 2);
    assert_eq!(map.len(), 6);
    assert_eq!(map.get(NodeRef::Sku(tp.skus[0])), map.get(NodeRef::Task(tp.tasks[0])));
    assert_eq!(
        map.get(NodeRef::Task(tp.tasks[0])),
        map.get(NodeRef::Workcenter(tp.workcenters[0]))
    );
    assert_ne!(map.get(NodeRef::Sku(tp.skus[0])), map.get(NodeRef::Sku(tp.skus[1])));
    assert_eq!(tp.model.calendar(tp.calendar).name, "DAY");
}

#[test]
fn test_shared_alternate_joins_partitions() {
    let mut tp = two_products();
    tp.model
        .assign_workcenter(tp.tasks[1], tp.workcenters[0], 2)
        .unwrap();

    let map = assign_partitions(&tp.model);
    assert_eq!(map.partition_count(), 1);
    assert_eq!(map.members(0).len(), 6);
}

#[test]
fn test_planning_results_join_their_product_partition() {
    let mut tp = two_products();
    for (id, sku) in [("DA", tp.skus[0]), ("DB", tp.skus[1])] {
        tp.model
            .add_demand(Demand::new(id, "C", sku, dt(3, 12, 0), 30, 1, tp.plan))
            .unwrap();
    }
    SimpleSolver::new(TraceOptions::quiet())
        .solve(&mut tp.model, tp.plan)
        .unwrap();

    let map = assign_partitions(&tp.model);
    assert_eq!(map.partition_count(), 2);

    let da = tp.model.find_demand("DA").unwrap();
    let pa = map.get(NodeRef::Sku(tp.skus[0]));
    assert_eq!(map.get(NodeRef::Demand(da)), pa);
    for &plan in &tp.model.demand(da).delivery_task_plans {
        assert_eq!(map.get(NodeRef::TaskPlan(plan)), pa);
    }
    // 物料 + 工序 + 工作中心 + 需求 + 工序计划
    assert_eq!(map.members(pa.unwrap()).len(), 5);

    let summary = map.log_string();
    assert_eq!(summary.lines().count(), 2);
    assert!(summary.contains("Partition 0 (5): "));
}

#[test]
fn test_retag_with_check_skips_same_partition() {
    let tp = two_products();
    let mut map = assign_partitions(&tp.model);
    let start = NodeRef::Task(tp.tasks[1]);
    let existing = map.get(start).unwrap();
    let before = map.clone();

    // 同编号重复传播: 不改任何标记
    assert_eq!(
        propagate_partition_id(&tp.model, &mut map, start, existing, true),
        0
    );
    assert_eq!(map, before);

    // 不同编号: 整个分量改标,另一分量不受影响
    assert_eq!(propagate_partition_id(&tp.model, &mut map, start, 9, true), 3);
    assert_eq!(map.get(NodeRef::Sku(tp.skus[1])), Some(9));
    assert_eq!(map.get(NodeRef::Workcenter(tp.workcenters[1])), Some(9));
    assert_ne!(map.get(NodeRef::Sku(tp.skus[0])), Some(9));
}

#[test]
fn test_retag_without_check_revisits_whole_component() {
    let tp = two_products();
    let mut map = assign_partitions(&tp.model);
    let start = NodeRef::Task(tp.tasks[1]);
    let existing = map.get(start).unwrap();

    assert_eq!(
        propagate_partition_id(&tp.model, &mut map, start, existing, false),
        3
    );
    assert_eq!(map.partition_count(), 2);

    propagate_partition_id(&tp.model, &mut map, start, 9, false);
    assert_eq!(map.members(9).len(), 3);
    assert_eq!(map.partition_count(), 2);
}
