//! 自定义匹配规则
//! 用户声明的临时签名，仅支持htmlContent/scriptSrc两个通道
//! 与规则库不同：用户亲手书写的规则，任何畸形输入都是启动期致命错误

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::detector::matcher::{CHANNEL_HTML_CONTENT, CHANNEL_SCRIPT_TAG};
use crate::error::{TdResult, TechDetectError};
use crate::extractor::Evidence;

/// 自定义匹配上报名前缀（与规则库命中可视区分）
pub const CUSTOM_PREFIX: &str = "custom-";

/// 自定义匹配规则集合
/// 同类型多次声明时模式累加，不覆盖
#[derive(Debug, Clone, Default)]
pub struct CustomMatchSet {
    html_patterns: Vec<Regex>,
    script_patterns: Vec<Regex>,
}

impl CustomMatchSet {
    /// 解析自定义匹配声明（每条为一个JSON对象：{匹配源类型: 模式或模式列表}）
    /// 未知类型、非对象JSON、非字符串模式、正则编译失败均为致命错误
    pub fn parse(declarations: &[String]) -> TdResult<Self> {
        let mut set = CustomMatchSet::default();

        for declaration in declarations {
            let value: Value = serde_json::from_str(declaration).map_err(|e| {
                TechDetectError::CustomMatchError(format!(
                    "自定义匹配JSON解析失败 [{}]：{}",
                    declaration, e
                ))
            })?;

            let Value::Object(map) = value else {
                return Err(TechDetectError::CustomMatchError(format!(
                    "自定义匹配必须是JSON对象：{}",
                    declaration
                )));
            };

            for (source_type, patterns) in &map {
                let target = match source_type.to_lowercase().as_str() {
                    "htmlcontent" => &mut set.html_patterns,
                    "scriptsrc" => &mut set.script_patterns,
                    other => {
                        return Err(TechDetectError::CustomMatchError(format!(
                            "不支持的匹配源类型[{}]，可用类型：htmlContent、scriptSrc",
                            other
                        )));
                    }
                };

                // 用户模式原样编译，不做规则库的`;`元数据截断
                for source in Self::pattern_sources(source_type, patterns)? {
                    let regex = Regex::new(&source).map_err(|e| {
                        TechDetectError::CustomMatchError(format!(
                            "自定义模式[{}]编译失败：{}",
                            source, e
                        ))
                    })?;
                    target.push(regex);
                }
            }
        }

        debug!(
            "自定义匹配规则加载完成：htmlContent {}条，scriptSrc {}条",
            set.html_patterns.len(),
            set.script_patterns.len()
        );
        Ok(set)
    }

    /// 展开"单模式或模式列表"的声明值
    fn pattern_sources(source_type: &str, value: &Value) -> TdResult<Vec<String>> {
        match value {
            Value::String(s) => Ok(vec![s.clone()]),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        TechDetectError::CustomMatchError(format!(
                            "匹配源[{}]的列表元素必须是字符串",
                            source_type
                        ))
                    })
                })
                .collect(),
            _ => Err(TechDetectError::CustomMatchError(format!(
                "匹配源[{}]的值必须是字符串或字符串列表",
                source_type
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html_patterns.is_empty() && self.script_patterns.is_empty()
    }

    /// 评估自定义匹配，返回(命名空间化的技术名, 命中通道)列表
    /// 与规则库签名使用同一套匹配原语
    pub fn evaluate(&self, evidence: &Evidence) -> Vec<(String, Vec<&'static str>)> {
        let mut results = Vec::new();

        if self
            .html_patterns
            .iter()
            .any(|pattern| pattern.is_match(&evidence.raw_body))
        {
            results.push((
                format!("{}htmlContent", CUSTOM_PREFIX),
                vec![CHANNEL_HTML_CONTENT],
            ));
        }

        if self.script_patterns.iter().any(|pattern| {
            evidence.script_srcs.iter().any(|src| pattern.is_match(src))
        }) {
            results.push((
                format!("{}scriptSrc", CUSTOM_PREFIX),
                vec![CHANNEL_SCRIPT_TAG],
            ));
        }

        results
    }
}
