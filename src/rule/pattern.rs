//! 模式值解析与正则编译
//! 规则库字段形状在加载期解析一次为显式变体，下游不再探测JSON形状

use std::collections::HashMap;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::error::TdResult;

/// 模式值变体：单模式 / 模式列表 / 命名模式映射
#[derive(Debug, Clone, PartialEq)]
pub enum PatternValue {
    Single(String),
    Many(Vec<String>),
    Keyed(HashMap<String, String>),
}

impl PatternValue {
    /// 解析"单模式或多模式"字段（html/script）
    /// 字符串与字符串列表两种解释都不成立时返回None（整字段失败）
    pub fn from_list_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(PatternValue::Single(s.clone())),
            Value::Array(items) => {
                // 列表中的非字符串元素静默跳过
                let patterns = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect();
                Some(PatternValue::Many(patterns))
            }
            _ => None,
        }
    }

    /// 解析"名称→模式"字段（headers/cookies/meta/js）
    /// 非对象形状返回None；对象内非字符串值静默跳过
    pub fn from_keyed_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => {
                let patterns = map
                    .iter()
                    .filter_map(|(key, val)| {
                        val.as_str().map(|s| (key.clone(), s.to_string()))
                    })
                    .collect();
                Some(PatternValue::Keyed(patterns))
            }
            _ => None,
        }
    }
}

/// 清理原始模式串
/// 上游格式在`;`后携带版本提取等元数据，仅首段是正则本体；
/// 截断后残留的末尾转义符是格式产物，一并剥除
pub fn clean_pattern(raw: &str) -> &str {
    let pattern = raw.split(';').next().unwrap_or("");
    pattern.strip_suffix('\\').unwrap_or(pattern)
}

/// 编译单个模式
pub fn compile_pattern(raw: &str) -> TdResult<Regex> {
    Ok(Regex::new(clean_pattern(raw))?)
}

/// 编译模式列表，无效正则逐条跳过
pub fn compile_list(value: &PatternValue) -> Vec<Regex> {
    let sources: Vec<&str> = match value {
        PatternValue::Single(s) => vec![s.as_str()],
        PatternValue::Many(list) => list.iter().map(String::as_str).collect(),
        PatternValue::Keyed(_) => Vec::new(),
    };

    let mut patterns = Vec::new();
    for source in sources {
        match compile_pattern(source) {
            Ok(regex) => patterns.push(regex),
            Err(e) => debug!("模式[{}]编译失败，已跳过：{}", source, e),
        }
    }
    patterns
}

/// 编译命名模式映射，无效正则逐条跳过
pub fn compile_keyed(value: &PatternValue) -> HashMap<String, Regex> {
    let PatternValue::Keyed(map) = value else {
        return HashMap::new();
    };

    let mut patterns = HashMap::new();
    for (key, source) in map {
        match compile_pattern(source) {
            Ok(regex) => {
                patterns.insert(key.clone(), regex);
            }
            Err(e) => debug!("模式[{}:{}]编译失败，已跳过：{}", key, source, e),
        }
    }
    patterns
}
