//! 页面证据提取模块
pub mod html_extractor;

pub use self::html_extractor::{Evidence, HtmlExtractor};
