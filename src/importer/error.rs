// ==========================================
// 车间作业排产引擎 - 加载模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 出错即中止加载,错误携带文件与行号
// ==========================================

use thiserror::Error;

use crate::domain::error::PlanningError;

/// 加载模块错误类型
#[derive(Error, Debug)]
pub enum LoadError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败 ({file}): {message}")]
    CsvParseError { file: String, message: String },

    // ===== 字段错误 =====
    #[error("字段缺失 ({file} 行 {line}): {field}")]
    MissingField {
        file: String,
        line: u64,
        field: String,
    },

    #[error("类型转换失败 ({file} 行 {line}, 字段 {field}): 值 {value}, {message}")]
    TypeConversionError {
        file: String,
        line: u64,
        field: String,
        value: String,
        message: String,
    },

    #[error("日期格式错误 ({file} 行 {line}, 字段 {field}): 期望 YYYY-MM-DDTHH:MM:SS，实际 {value}")]
    DateFormatError {
        file: String,
        line: u64,
        field: String,
        value: String,
    },

    // ===== 引用错误 =====
    #[error("引用不存在 ({file} 行 {line}): {entity} {key}")]
    UnknownReference {
        file: String,
        line: u64,
        entity: String,
        key: String,
    },

    // ===== 模型错误 =====
    #[error("模型构建失败 ({file} 行 {line}): {source}")]
    Model {
        file: String,
        line: u64,
        #[source]
        source: PlanningError,
    },

    #[error(transparent)]
    Planning(#[from] PlanningError),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for LoadError {
    fn from(err: csv::Error) -> Self {
        LoadError::CsvParseError {
            file: String::new(),
            message: err.to_string(),
        }
    }
}

/// Result 类型别名
pub type LoadResult<T> = Result<T, LoadError>;
