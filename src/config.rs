//! 扫描配置管理,存储所有可配置项
//! 配置以显式值传入各构造函数，核心逻辑不读取任何全局状态

use std::collections::HashMap;

use crate::error::{TdResult, TechDetectError};

/// 默认规则库源地址（Wappalyzer apps.json）
pub const DEFAULT_SIGNATURE_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/AliasIO/wappalyzer/master/src/apps.json";

/// 默认并发度
pub const DEFAULT_CONCURRENCY: usize = 25;
/// 默认单请求超时（单位：秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// 扫描配置
#[derive(Debug, Clone)]
pub struct ScanConfig {
    // 并发worker数量
    pub concurrency: usize,
    // 单请求超时（秒），实际客户端超时会附加固定宽限
    pub timeout_secs: u64,
    // 是否启用详细日志
    pub debug: bool,
    // 附加到所有请求的Cookie串
    pub cookies: Option<String>,
    // 附加到所有请求的Header集合
    pub headers: HashMap<String, String>,
    // 技术范围过滤（小写技术名列表，空=全量）
    pub tech_filter: Vec<String>,
    // 禁用远程规则库（仅使用自定义匹配）
    pub disable_catalog: bool,
    // 规则库源地址
    pub source_url: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
            cookies: None,
            headers: HashMap::new(),
            tech_filter: Vec::new(),
            disable_catalog: false,
            source_url: DEFAULT_SIGNATURE_SOURCE_URL.to_string(),
        }
    }
}

impl ScanConfig {
    /// 自定义配置
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ScanConfig::default(),
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn timeout_secs(mut self, timeout: u64) -> Self {
        self.config.timeout_secs = timeout;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    pub fn cookies(mut self, cookies: Option<String>) -> Self {
        self.config.cookies = cookies.filter(|c| !c.is_empty());
        self
    }

    pub fn headers(mut self, headers: HashMap<String, String>) -> Self {
        self.config.headers = headers;
        self
    }

    /// 技术范围过滤：逗号分隔的技术名，统一转小写
    pub fn tech_filter_raw(mut self, raw: &str) -> Self {
        self.config.tech_filter = raw
            .split(',')
            .map(|part| part.trim().to_lowercase())
            .filter(|part| !part.is_empty())
            .collect();
        self
    }

    pub fn disable_catalog(mut self, disable: bool) -> Self {
        self.config.disable_catalog = disable;
        self
    }

    pub fn source_url(mut self, url: String) -> Self {
        self.config.source_url = url;
        self
    }

    pub fn build(self) -> ScanConfig {
        self.config
    }
}

/// 解析Header命令行参数（分号分隔的`Name: value`对）
/// 整串无冒号视为致命配置错误；单段无冒号则跳过
pub fn parse_header_flag(raw: &str) -> TdResult<HashMap<String, String>> {
    if !raw.contains(':') {
        return Err(TechDetectError::ConfigError(
            "headers参数格式错误（缺少冒号分隔header名与值）".to_string(),
        ));
    }

    let mut headers = HashMap::new();
    for part in raw.split(';') {
        let Some((name, value)) = part.split_once(':') else {
            continue;
        };
        let name = name.trim();
        let value = value.trim();
        if name.is_empty() {
            continue;
        }
        headers.insert(name.to_string(), value.to_string());
    }

    Ok(headers)
}
