// ==========================================
// 车间作业排产引擎 - 排产方案领域模型
// ==========================================
// 职责: 方案 (计划期间) 与方案参数
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 方案参数键
pub mod param_keys {
    /// 是否启用资源约束下的备选工作中心选择 ("true"/"false")
    pub const RESOURCE_CONSTRAINED: &str = "RESOURCE_CONSTRAINED";
}

// ==========================================
// PlanParams - 方案参数 (key/value)
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanParams {
    params: BTreeMap<String, String>,
}

impl PlanParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取参数原始字符串值
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(|v| v.as_str())
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// 按布尔值读取参数
    ///
    /// 仅 "true"(不区分大小写) 为真; 缺失或其他文本一律为假
    pub fn get_bool(&self, key: &str) -> bool {
        self.get_param(key)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.params.iter()
    }
}

// ==========================================
// Plan - 排产方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub plan_id: String,        // 方案ID
    pub start: NaiveDateTime,   // 计划期起点
    pub end: NaiveDateTime,     // 计划期终点
    pub params: PlanParams,     // 方案参数
}

impl Plan {
    pub fn new(plan_id: impl Into<String>, start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            plan_id: plan_id.into(),
            start,
            end,
            params: PlanParams::new(),
        }
    }

    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.params.get_param(key)
    }

    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.set_param(key, value);
    }

    /// 是否启用资源约束模式
    pub fn is_resource_constrained(&self) -> bool {
        self.params.get_bool(param_keys::RESOURCE_CONSTRAINED)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [ {} - {} ]", self.plan_id, self.start, self.end)?;
        for (key, value) in self.params.iter() {
            write!(f, "\n  {}: {}", key, value)?;
        }
        Ok(())
    }
}
