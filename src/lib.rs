//! rstechdetect - Rust 网站技术栈识别工具
//! 并发抓取URL并基于Wappalyzer式规则库匹配Web技术指纹

// 导出全局错误类型
pub use self::error::{TdResult, TechDetectError};

// 导出配置模块
pub use self::config::{parse_header_flag, ScanConfig, ScanConfigBuilder};

// 导出规则模块核心接口
pub use self::rule::{Catalog, CustomMatchSet, RawTechRule, RuleLoader, Signature};

// 导出提取模块核心接口
pub use self::extractor::{Evidence, HtmlExtractor};

// 导出检测模块核心接口
pub use self::detector::{MatchResult, ScanPipeline, ScanStats, TechMatch};

// 导出工具模块核心接口
pub use self::utils::{read_urls, PageResponse};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod extractor;
pub mod detector;
pub mod utils;
