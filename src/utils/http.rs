//! HTTP传输层
//! 客户端构建与单次GET封装：跳过TLS校验、禁用连接复用、
//! 超时=配置值+固定宽限、轮换User-Agent

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE, USER_AGENT};
use reqwest::Client;

use crate::config::ScanConfig;
use crate::error::TdResult;

/// 客户端总超时在配置值上附加的宽限（秒）
const TIMEOUT_GRACE_SECS: u64 = 3;

/// 轮换UA表
static USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
];

static UA_CURSOR: AtomicUsize = AtomicUsize::new(0);

/// 取下一个UA（原子游标轮换）
fn next_user_agent() -> &'static str {
    let index = UA_CURSOR.fetch_add(1, Ordering::Relaxed);
    USER_AGENTS[index % USER_AGENTS.len()]
}

/// 页面响应：评估所需的全部事实
#[derive(Debug, Clone)]
pub struct PageResponse {
    pub status: u16,
    pub body: String,
    /// 响应头（键小写，单值）
    pub headers: HashMap<String, String>,
    /// Set-Cookie解析出的 名称→值
    pub cookies: HashMap<String, String>,
}

/// 构建HTTP客户端
pub fn build_client(config: &ScanConfig) -> TdResult<Client> {
    let client = Client::builder()
        .danger_accept_invalid_certs(true)
        .pool_max_idle_per_host(0)
        .connect_timeout(Duration::from_secs(config.timeout_secs))
        .timeout(Duration::from_secs(config.timeout_secs + TIMEOUT_GRACE_SECS))
        .build()?;
    Ok(client)
}

/// 发送单次GET请求
pub async fn send_request(
    client: &Client,
    config: &ScanConfig,
    url: &str,
) -> TdResult<PageResponse> {
    let mut request = client.get(url).header(USER_AGENT, next_user_agent());

    for (name, value) in &config.headers {
        request = request.header(name.as_str(), value.as_str());
    }

    if let Some(cookies) = &config.cookies {
        request = request.header(COOKIE, cookies.as_str());
    }

    let response = request.send().await?;

    let status = response.status().as_u16();
    let mut headers = HashMap::new();
    let mut cookies = HashMap::new();

    for (name, value) in response.headers() {
        let Ok(value_str) = value.to_str() else {
            continue;
        };

        if name == &SET_COOKIE {
            if let Some((cookie_name, cookie_value)) = parse_set_cookie(value_str) {
                cookies.insert(cookie_name, cookie_value);
            }
        }

        // 同名多值头保留首个非空值
        headers
            .entry(name.as_str().to_lowercase())
            .or_insert_with(|| value_str.to_string());
    }

    let body = response.text().await?;

    Ok(PageResponse {
        status,
        body,
        headers,
        cookies,
    })
}

/// 解析Set-Cookie头的首个 名称=值 对
fn parse_set_cookie(value: &str) -> Option<(String, String)> {
    let pair = value.split(';').next()?;
    let (name, val) = pair.split_once('=')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name.to_string(), val.trim().to_string()))
}
