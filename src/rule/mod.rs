//! 规则模块：负责规则库的加载、模式编译、数据模型定义
pub mod model;
pub mod pattern;
pub mod loader;
pub mod custom;

// 导出核心接口
pub use self::model::{Catalog, RawTechRule, Signature};
pub use self::pattern::PatternValue;
pub use self::loader::RuleLoader;
pub use self::custom::CustomMatchSet;
