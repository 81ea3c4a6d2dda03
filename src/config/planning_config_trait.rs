// ==========================================
// 车间作业排产引擎 - 运行配置读取 Trait
// ==========================================
// 职责: 定义驱动程序所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use std::path::PathBuf;

use crate::config::trace::TraceOptions;

/// 结果输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// 从字符串解析 (不区分大小写)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

// ==========================================
// PlanningConfigReader Trait
// ==========================================
// 实现者: RunOptions（从选项文件 + 环境变量读取）
pub trait PlanningConfigReader {
    /// 获取数据目录
    ///
    /// # 默认值
    /// - ./data
    fn data_dir(&self) -> PathBuf;

    /// 获取默认方案ID
    ///
    /// # 返回
    /// - None: 未指定,由驱动程序选择排序后的第一个方案
    fn default_plan(&self) -> Option<String>;

    /// 获取输出格式
    ///
    /// # 默认值
    /// - Text
    fn output_format(&self) -> OutputFormat;

    /// 获取引擎追踪开关
    ///
    /// # 默认值
    /// - 全部关闭
    fn trace_options(&self) -> TraceOptions;
}
