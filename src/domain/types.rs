// ==========================================
// 车间作业排产引擎 - 领域类型定义
// ==========================================
// 职责: 节点标识符、方向、日历类型等基础值类型
// 红线: 节点之间只通过 ID 互相引用,不持有对象引用
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 节点标识符 (Arena Index)
// ==========================================
// 各类节点在 PlanningModel 中的下标,Copy 语义
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub usize);

        impl $name {
            pub fn index(self) -> usize {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

define_id!(CalendarId, "CAL");
define_id!(PlanId, "PLAN");
define_id!(SkuId, "SKU");
define_id!(TaskId, "TASK");
define_id!(WorkcenterId, "WRK");
define_id!(DemandId, "DMD");
define_id!(TaskPlanId, "TP");
define_id!(WorkOrderId, "WO");

/// 分区编号
pub type PartitionId = usize;

// ==========================================
// 日历查询方向 (Direction)
// ==========================================
// Backward: 由交期倒推 (尽可能晚)
// Forward: 由开工时间正推 (尽可能早)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Backward,
    Forward,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Backward => write!(f, "BACKWARD"),
            Direction::Forward => write!(f, "FORWARD"),
        }
    }
}

// ==========================================
// 日历类型 (Calendar Type)
// ==========================================
// 目前只定义了效率日历的语义
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalendarType {
    Efficiency,    // 效率日历 (值为可用工时比例)
    Other(String), // 其他类型,仅保留名称
}

impl CalendarType {
    /// 从字符串解析日历类型
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "EFFICIENCY" | "EFFICIENCY_CALENDAR" => CalendarType::Efficiency,
            other => CalendarType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for CalendarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarType::Efficiency => write!(f, "EFFICIENCY"),
            CalendarType::Other(name) => write!(f, "{}", name),
        }
    }
}

// ==========================================
// 分区图节点 (Partition Node)
// ==========================================
// 日历与方案属于只读共享上下文,不参与分区
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NodeRef {
    Sku(SkuId),
    Task(TaskId),
    Workcenter(WorkcenterId),
    Demand(DemandId),
    TaskPlan(TaskPlanId),
    WorkOrder(WorkOrderId),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Sku(id) => write!(f, "{}", id),
            NodeRef::Task(id) => write!(f, "{}", id),
            NodeRef::Workcenter(id) => write!(f, "{}", id),
            NodeRef::Demand(id) => write!(f, "{}", id),
            NodeRef::TaskPlan(id) => write!(f, "{}", id),
            NodeRef::WorkOrder(id) => write!(f, "{}", id),
        }
    }
}
