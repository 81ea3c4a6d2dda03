// ==========================================
// 车间作业排产引擎 - 分区标记
// ==========================================
// 职责: 沿直接关系广度优先传播分区编号,把排产图拆成互不相交的子图
// 节点: 物料 / 工序 / 工作中心 / 需求 / 工序计划 / 已下达工单
// 红线: 日历与方案是只读共享上下文,不参与分区
// ==========================================

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::fmt::Write as _;

use crate::domain::model::PlanningModel;
use crate::domain::types::{NodeRef, PartitionId};

// ==========================================
// PartitionGraph - 邻接视图
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PartitionGraph {
    edges: BTreeMap<NodeRef, BTreeSet<NodeRef>>,
}

impl PartitionGraph {
    /// 从模型构建无向邻接视图
    ///
    /// 边: 前后道、工序-备选工作中心、工序-所属物料、物料-交付工序、需求-物料、
    /// 工序计划-工序/工作中心/需求/工单、工单-工序/工作中心
    pub fn from_model(model: &PlanningModel) -> Self {
        let mut graph = Self::default();

        for id in model.sku_ids() {
            let node = NodeRef::Sku(id);
            graph.add_node(node);
            if let Some(t) = model.sku(id).delivery_task {
                graph.add_edge(node, NodeRef::Task(t));
            }
        }
        for id in model.workcenter_ids() {
            graph.add_node(NodeRef::Workcenter(id));
        }
        for id in model.task_ids() {
            let node = NodeRef::Task(id);
            let task = model.task(id);
            graph.add_edge(node, NodeRef::Sku(task.sku));
            if let Some(p) = task.predecessor {
                graph.add_edge(node, NodeRef::Task(p));
            }
            if let Some(s) = task.successor {
                graph.add_edge(node, NodeRef::Task(s));
            }
            for alt in task.workcenters() {
                graph.add_edge(node, NodeRef::Workcenter(alt.workcenter));
            }
        }
        for id in model.demand_ids() {
            let node = NodeRef::Demand(id);
            let demand = model.demand(id);
            graph.add_edge(node, NodeRef::Sku(demand.sku));
            for &tp in &demand.delivery_task_plans {
                graph.add_edge(node, NodeRef::TaskPlan(tp));
            }
        }
        for id in model.task_plan_ids() {
            let node = NodeRef::TaskPlan(id);
            let tp = model.task_plan(id);
            graph.add_edge(node, NodeRef::Task(tp.task));
            if let Some(w) = tp.workcenter {
                graph.add_edge(node, NodeRef::Workcenter(w));
            }
            if let Some(wo) = tp.work_order {
                graph.add_edge(node, NodeRef::WorkOrder(wo));
            }
            if let Some(d) = tp.demand_id().and_then(|d| model.find_demand(d)) {
                graph.add_edge(node, NodeRef::Demand(d));
            }
        }
        for id in model.work_order_ids() {
            let node = NodeRef::WorkOrder(id);
            let wo = model.work_order(id);
            graph.add_edge(node, NodeRef::Task(wo.task));
            if let Some(w) = wo.workcenter {
                graph.add_edge(node, NodeRef::Workcenter(w));
            }
        }
        graph
    }

    fn add_node(&mut self, node: NodeRef) {
        self.edges.entry(node).or_default();
    }

    fn add_edge(&mut self, a: NodeRef, b: NodeRef) {
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
    }

    /// 全部节点 (按节点顺序)
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef> + '_ {
        self.edges.keys().copied()
    }

    /// 直接相邻的节点
    pub fn neighbors(&self, node: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        self.edges.get(&node).into_iter().flatten().copied()
    }

    /// 从 `start` 起广度优先标记分区
    ///
    /// # 参数
    /// - `check`: 为 true 时跳过已标记为 `pid` 的节点 (不改标记也不再向外扩展);
    ///   为 false 时可达节点一律改标为 `pid`
    ///
    /// # 返回
    /// - 本次改标的节点数
    pub fn propagate(
        &self,
        map: &mut PartitionMap,
        start: NodeRef,
        pid: PartitionId,
        check: bool,
    ) -> usize {
        let mut visited: HashSet<NodeRef> = HashSet::new();
        let mut queue = VecDeque::from([start]);
        visited.insert(start);
        let mut tagged = 0usize;

        while let Some(node) = queue.pop_front() {
            if check && map.get(node) == Some(pid) {
                continue;
            }
            map.tags.insert(node, pid);
            tagged += 1;

            for next in self.neighbors(node) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        tagged
    }
}

// ==========================================
// PartitionMap - 分区标记结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionMap {
    tags: BTreeMap<NodeRef, PartitionId>,
}

impl PartitionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, node: NodeRef) -> Option<PartitionId> {
        self.tags.get(&node).copied()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// 分区数
    pub fn partition_count(&self) -> usize {
        self.tags.values().collect::<BTreeSet<_>>().len()
    }

    /// 分区成员 (按节点顺序)
    pub fn members(&self, pid: PartitionId) -> Vec<NodeRef> {
        self.tags
            .iter()
            .filter(|(_, &p)| p == pid)
            .map(|(&n, _)| n)
            .collect()
    }

    /// 分区摘要,每个分区一行
    pub fn log_string(&self) -> String {
        let mut by_partition: BTreeMap<PartitionId, Vec<NodeRef>> = BTreeMap::new();
        for (&node, &pid) in &self.tags {
            by_partition.entry(pid).or_default().push(node);
        }

        let mut out = String::new();
        for (pid, nodes) in by_partition {
            let names: Vec<String> = nodes.iter().map(|n| n.to_string()).collect();
            let _ = writeln!(out, "Partition {} ({}): {}", pid, nodes.len(), names.join(", "));
        }
        out
    }
}

/// 从 `start` 起传播分区编号 (每次调用都会按当前模型重建邻接视图)
pub fn propagate_partition_id(
    model: &PlanningModel,
    map: &mut PartitionMap,
    start: NodeRef,
    pid: PartitionId,
    check: bool,
) -> usize {
    PartitionGraph::from_model(model).propagate(map, start, pid, check)
}

/// 按节点顺序为每个连通分量编号 (从 0 开始)
pub fn assign_partitions(model: &PlanningModel) -> PartitionMap {
    let graph = PartitionGraph::from_model(model);
    let mut map = PartitionMap::new();
    let mut next: PartitionId = 0;

    for node in graph.nodes() {
        if map.get(node).is_some() {
            continue;
        }
        let size = graph.propagate(&mut map, node, next, true);
        tracing::debug!(partition = next, start = %node, size, "分区标记");
        next += 1;
    }

    tracing::info!(partitions = next, nodes = map.len(), "分区标记完成");
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::Sku;
    use crate::domain::types::{SkuId, TaskId};

    fn two_chains() -> (PlanningModel, TaskId, TaskId, TaskId) {
        let mut model = PlanningModel::new();
        let a = model.add_sku(Sku::new("A", "")).unwrap();
        let b = model.add_sku(Sku::new("B", "")).unwrap();
        let a10 = model.add_task("10", a, 0, 1, 1, 1).unwrap();
        let a20 = model.add_task("20", a, 0, 1, 1, 1).unwrap();
        let b10 = model.add_task("10", b, 0, 1, 1, 1).unwrap();
        model.link_tasks(a20, a10).unwrap();
        model.set_delivery_task(a, a20).unwrap();
        model.set_delivery_task(b, b10).unwrap();
        (model, a10, a20, b10)
    }

    #[test]
    fn test_assign_partitions_separates_chains() {
        let (model, a10, a20, b10) = two_chains();
        let map = assign_partitions(&model);
        assert_eq!(map.partition_count(), 2);
        assert_eq!(map.get(NodeRef::Task(a10)), map.get(NodeRef::Task(a20)));
        assert_ne!(map.get(NodeRef::Task(a10)), map.get(NodeRef::Task(b10)));
        assert_eq!(map.get(NodeRef::Sku(SkuId(0))), Some(0));
        assert_eq!(map.members(1).len(), 2);
        assert!(map.log_string().starts_with("Partition 0 (3): "));
    }

    #[test]
    fn test_check_skips_nodes_already_tagged() {
        let (model, a10, _, _) = two_chains();
        let mut map = PartitionMap::new();
        assert_eq!(propagate_partition_id(&model, &mut map, NodeRef::Task(a10), 7, true), 3);

        // 起点已是 7: 什么都不做
        assert_eq!(propagate_partition_id(&model, &mut map, NodeRef::Sku(SkuId(0)), 7, true), 0);
        assert_eq!(map.members(7).len(), 3);

        // 不同编号: 整个分量改标
        assert_eq!(propagate_partition_id(&model, &mut map, NodeRef::Sku(SkuId(0)), 8, true), 3);
        assert_eq!(map.get(NodeRef::Task(a10)), Some(8));
        assert!(map.members(7).is_empty());
    }

    #[test]
    fn test_without_check_retags_every_reachable_node() {
        let (model, a10, a20, b10) = two_chains();
        let mut map = assign_partitions(&model);
        let n = propagate_partition_id(&model, &mut map, NodeRef::Task(a20), 0, false);
        assert_eq!(n, 3);
        assert_eq!(map.get(NodeRef::Task(a10)), Some(0));
        assert_eq!(map.get(NodeRef::Task(b10)), Some(1));
    }
}
