//! 检测模块：签名评估与并发抓取流水线
pub mod matcher;
pub mod pipeline;

// 导出核心接口
pub use self::matcher::{MatchResult, TechMatch};
pub use self::pipeline::{ScanPipeline, ScanStats};
