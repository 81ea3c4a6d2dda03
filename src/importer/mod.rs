// ==========================================
// 车间作业排产引擎 - 数据加载层
// ==========================================
// 职责: 从数据目录读取逗号分隔的平面文件,构建排产模型
// 红线: 不含排产逻辑
// ==========================================

pub mod error;
pub mod flat_file_loader;

pub use error::{LoadError, LoadResult};
pub use flat_file_loader::{files, FlatFileLoader, LoadSummary};
