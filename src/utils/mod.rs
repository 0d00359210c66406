//! 通用工具模块
pub mod http;
pub mod input;

pub use self::http::PageResponse;
pub use self::input::read_urls;
