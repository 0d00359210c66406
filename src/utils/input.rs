//! URL输入处理
//! 按行读取候选URL，校验为合法绝对URL，按规范化串去重

use std::collections::HashSet;
use std::io::BufRead;

use tracing::debug;
use url::Url;

/// 读取并清洗URL列表
/// 非法行跳过（debug日志），规范化后重复的URL只保留首次出现，保持输入序
pub fn read_urls<R: BufRead>(reader: R) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for line in reader.lines() {
        let Ok(line) = line else {
            break;
        };
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }

        let parsed = match Url::parse(candidate) {
            Ok(url) => url,
            Err(_) => {
                debug!("输入的URL[{}]格式不合法，已跳过", candidate);
                continue;
            }
        };

        let normalized = parsed.to_string();
        if seen.insert(normalized.clone()) {
            urls.push(normalized);
        }
    }

    urls
}
