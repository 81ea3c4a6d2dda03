// ==========================================
// 车间作业排产引擎 - 工作中心领域模型
// ==========================================
// 职责: 工作中心 (绑定一个效率日历)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::types::{CalendarId, TaskPlanId};

// ==========================================
// Workcenter - 工作中心
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workcenter {
    pub name: String,               // 工作中心编码 (唯一)
    pub calendar: CalendarId,       // 效率/可用性日历
    pub max_setups_per_shift: i32,  // 每班最大换型次数 (当前算法未使用)
    pub criticality_index: i32,     // 关键度
    pub level: u32,                 // 层级: 可能负载它的工序的最大层级
    pub task_plans: Vec<TaskPlanId>, // 追加式日志,不用于冲突检测
}

impl Workcenter {
    pub fn new(
        name: impl Into<String>,
        calendar: CalendarId,
        max_setups_per_shift: i32,
        criticality_index: i32,
    ) -> Self {
        Self {
            name: name.into(),
            calendar,
            max_setups_per_shift,
            criticality_index,
            level: 0,
            task_plans: Vec::new(),
        }
    }
}

impl fmt::Display for Workcenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
