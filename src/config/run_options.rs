// ==========================================
// 车间作业排产引擎 - 运行选项
// ==========================================
// 存储: 选项文件, 每行 `key|value`, `#` 开头为注释
// 覆写: 环境变量 JOBSHOP_DATADIR / JOBSHOP_DEFAULT_PLAN / JOBSHOP_OUTPUT_FORMAT
// ==========================================

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::planning_config_trait::{OutputFormat, PlanningConfigReader};
use crate::config::trace::TraceOptions;

/// 配置键
pub mod config_keys {
    pub const DATADIR: &str = "datadir";
    pub const DEFAULT_PLAN: &str = "default_plan";
    pub const OUTPUT_FORMAT: &str = "output_format";

    // 追踪开关
    pub const TRACE_CALENDAR_SEARCH: &str = "trace_calendar_search";
    pub const TRACE_CALENDAR_WALK: &str = "trace_calendar_walk";
    pub const TRACE_PROPAGATION: &str = "trace_propagation";
}

/// 环境变量覆写: (环境变量, 配置键)
const ENV_OVERRIDES: [(&str, &str); 3] = [
    ("JOBSHOP_DATADIR", config_keys::DATADIR),
    ("JOBSHOP_DEFAULT_PLAN", config_keys::DEFAULT_PLAN),
    ("JOBSHOP_OUTPUT_FORMAT", config_keys::OUTPUT_FORMAT),
];

const DEFAULT_DATADIR: &str = "./data";

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("选项文件读取失败 ({path}): {message}")]
    FileReadError { path: String, message: String },

    #[error("选项文件格式错误 (行 {line}): 期望 key|value, 实际 {content}")]
    MalformedLine { line: usize, content: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    InvalidValue {
        key: String,
        value: String,
        message: String,
    },
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

// ==========================================
// RunOptions - 运行选项
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    options: HashMap<String, String>,
}

impl RunOptions {
    /// 默认选项 (全部取默认值)
    pub fn new() -> Self {
        Self::default()
    }

    /// 从选项文件加载
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::FileReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// 解析选项文本
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut options = HashMap::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('|').ok_or_else(|| ConfigError::MalformedLine {
                line: idx + 1,
                content: line.to_string(),
            })?;
            let key = key.trim();
            if key.is_empty() || value.contains('|') {
                return Err(ConfigError::MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            }
            options.insert(key.to_string(), value.trim().to_string());
        }

        let opts = Self { options };
        opts.validate()?;
        Ok(opts)
    }

    /// 应用环境变量覆写
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// 应用覆写 (查找函数可注入,便于测试)
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for (env_name, key) in ENV_OVERRIDES {
            if let Some(value) = lookup(env_name) {
                let value = value.trim();
                if !value.is_empty() {
                    tracing::debug!(key, env = env_name, value, "环境变量覆写配置");
                    self.options.insert(key.to_string(), value.to_string());
                }
            }
        }
        self.validate()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(parse_bool).unwrap_or(default)
    }

    /// 校验取值: 输出格式与布尔开关必须可解析
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(v) = self.get(config_keys::OUTPUT_FORMAT) {
            if OutputFormat::parse(v).is_none() {
                return Err(ConfigError::InvalidValue {
                    key: config_keys::OUTPUT_FORMAT.to_string(),
                    value: v.to_string(),
                    message: "仅支持 text / json".to_string(),
                });
            }
        }
        for key in [
            config_keys::TRACE_CALENDAR_SEARCH,
            config_keys::TRACE_CALENDAR_WALK,
            config_keys::TRACE_PROPAGATION,
        ] {
            if let Some(v) = self.get(key) {
                if parse_bool(v).is_none() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: v.to_string(),
                        message: "期望布尔值".to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl PlanningConfigReader for RunOptions {
    fn data_dir(&self) -> PathBuf {
        PathBuf::from(self.get(config_keys::DATADIR).unwrap_or(DEFAULT_DATADIR))
    }

    fn default_plan(&self) -> Option<String> {
        self.get(config_keys::DEFAULT_PLAN)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    fn output_format(&self) -> OutputFormat {
        self.get(config_keys::OUTPUT_FORMAT)
            .and_then(OutputFormat::parse)
            .unwrap_or(OutputFormat::Text)
    }

    fn trace_options(&self) -> TraceOptions {
        TraceOptions {
            calendar_search: self.get_bool_or(config_keys::TRACE_CALENDAR_SEARCH, false),
            calendar_walk: self.get_bool_or(config_keys::TRACE_CALENDAR_WALK, false),
            propagation: self.get_bool_or(config_keys::TRACE_PROPAGATION, false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = RunOptions::new();
        assert_eq!(opts.data_dir(), PathBuf::from("./data"));
        assert_eq!(opts.default_plan(), None);
        assert_eq!(opts.output_format(), OutputFormat::Text);
        assert_eq!(opts.trace_options(), TraceOptions::quiet());
    }

    #[test]
    fn test_parse_options_file() {
        let content = "# 注释\n\
                       datadir | /tmp/jobshop\n\
                       \n\
                       default_plan|PLAN-A\n\
                       output_format|JSON\n\
                       trace_calendar_search|yes\n";
        let opts = RunOptions::parse(content).unwrap();
        assert_eq!(opts.data_dir(), PathBuf::from("/tmp/jobshop"));
        assert_eq!(opts.default_plan().as_deref(), Some("PLAN-A"));
        assert_eq!(opts.output_format(), OutputFormat::Json);
        let trace = opts.trace_options();
        assert!(trace.calendar_search);
        assert!(!trace.calendar_walk);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            RunOptions::parse("datadir /tmp"),
            Err(ConfigError::MalformedLine { line: 1, .. })
        ));
        assert!(matches!(
            RunOptions::parse("output_format|xml"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            RunOptions::parse("trace_propagation|maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut opts = RunOptions::parse("datadir|./data\ndefault_plan|P1").unwrap();
        opts.apply_overrides_from(|name| match name {
            "JOBSHOP_DATADIR" => Some("/srv/data".to_string()),
            "JOBSHOP_DEFAULT_PLAN" => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(opts.data_dir(), PathBuf::from("/srv/data"));
        // 空白覆写值被忽略
        assert_eq!(opts.default_plan().as_deref(), Some("P1"));
    }
}
