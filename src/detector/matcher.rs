//! 签名评估算法
//! 六个证据通道相互独立评估，单技术可同时命中多个通道且全部上报

use std::collections::HashMap;

use regex::Regex;

use crate::extractor::Evidence;
use crate::rule::model::Signature;

// 通道上报名
pub const CHANNEL_HTML_CONTENT: &str = "htmlContent";
pub const CHANNEL_SCRIPT_TAG: &str = "scriptTag";
pub const CHANNEL_META_TAG: &str = "metaTag";
pub const CHANNEL_JAVASCRIPT: &str = "javascriptContent";
pub const CHANNEL_HEADER: &str = "header";
pub const CHANNEL_COOKIE: &str = "cookie";

impl Signature {
    /// 评估签名：返回命中的通道名集合（空集=未发现该技术）
    /// 全空签名O(1)直接返回
    pub fn evaluate(
        &self,
        evidence: &Evidence,
        headers: &HashMap<String, String>,
        cookies: &HashMap<String, String>,
    ) -> Vec<&'static str> {
        if self.is_inert() {
            return Vec::new();
        }

        let mut channels = Vec::new();

        if str_and_list_match(&evidence.raw_body, &self.html) {
            channels.push(CHANNEL_HTML_CONTENT);
        }

        if list_and_list_match(&evidence.script_srcs, &self.script) {
            channels.push(CHANNEL_SCRIPT_TAG);
        }

        if map_and_map_match(&evidence.meta_tags, &self.meta) {
            channels.push(CHANNEL_META_TAG);
        }

        if list_and_map_match(&evidence.inline_js, &self.js) {
            channels.push(CHANNEL_JAVASCRIPT);
        }

        if map_and_map_match(headers, &self.headers) {
            channels.push(CHANNEL_HEADER);
        }

        if map_and_map_match(cookies, &self.cookies) {
            channels.push(CHANNEL_COOKIE);
        }

        channels
    }
}

/// 任一模式在目标串中命中即真（非锚定子串语义）
fn str_and_list_match(target: &str, patterns: &[Regex]) -> bool {
    patterns.iter().any(|pattern| pattern.is_match(target))
}

/// 任一模式命中任一目标串即真
fn list_and_list_match(targets: &[String], patterns: &[Regex]) -> bool {
    patterns
        .iter()
        .any(|pattern| targets.iter().any(|target| pattern.is_match(target)))
}

/// 模式键与目标键大小写无关相等，且模式命中该键对应值即真
/// 键比较大小写无关；值匹配由正则自身决定大小写敏感性
fn map_and_map_match(
    target_map: &HashMap<String, String>,
    patterns: &HashMap<String, Regex>,
) -> bool {
    for (key, pattern) in patterns {
        for (target_key, target_value) in target_map {
            if key.eq_ignore_ascii_case(target_key) && pattern.is_match(target_value) {
                return true;
            }
        }
    }
    false
}

/// 模式键与目标串本身大小写无关相等，且模式命中同一目标串即真
/// 内联JS通道沿用上游的字面近似语义：键直接与脚本全文比较
fn list_and_map_match(targets: &[String], patterns: &HashMap<String, Regex>) -> bool {
    for (key, pattern) in patterns {
        for target in targets {
            if key.eq_ignore_ascii_case(target) && pattern.is_match(target) {
                return true;
            }
        }
    }
    false
}

/// 单技术的命中记录
#[derive(Debug, Clone)]
pub struct TechMatch {
    pub name: String,
    pub channels: Vec<&'static str>,
}

/// 单URL的匹配结果
/// 每次抓取新建、上报后丢弃，从不跨URL共享
#[derive(Debug, Clone, Default)]
pub struct MatchResult {
    pub url: String,
    /// 技术→命中通道，插入序
    pub technology_matches: Vec<TechMatch>,
    /// 命中技术名扁平列表（用于上报）
    pub tech_found: Vec<String>,
}

impl MatchResult {
    pub fn new(url: String) -> Self {
        Self {
            url,
            ..Default::default()
        }
    }

    /// 记录一次技术命中（通道集非空才应调用）
    pub fn record(&mut self, name: String, channels: Vec<&'static str>) {
        self.tech_found.push(name.clone());
        self.technology_matches.push(TechMatch { name, channels });
    }

    pub fn has_matches(&self) -> bool {
        !self.tech_found.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::model::RawTechRule;
    use serde_json::json;

    fn signature(name: &str, value: serde_json::Value) -> Signature {
        let raw: RawTechRule = serde_json::from_value(value).unwrap();
        Signature::from_raw(name, &raw)
    }

    fn empty_maps() -> (HashMap<String, String>, HashMap<String, String>) {
        (HashMap::new(), HashMap::new())
    }

    #[test]
    fn test_empty_signature_never_matches() {
        let sig = Signature::from_raw("ghost", &RawTechRule::default());
        let evidence = Evidence::from_body("<html>anything at all</html>".to_string());
        let (headers, cookies) = empty_maps();

        assert!(sig.evaluate(&evidence, &headers, &cookies).is_empty());
    }

    #[test]
    fn test_html_substring_match() {
        let sig = signature("wordpress", json!({"html": "wp-content"}));
        let evidence =
            Evidence::from_body("<body><img src=\"/wp-content/a.png\"></body>".to_string());
        let (headers, cookies) = empty_maps();

        let channels = sig.evaluate(&evidence, &headers, &cookies);
        assert_eq!(channels, vec![CHANNEL_HTML_CONTENT]);
    }

    #[test]
    fn test_script_src_match() {
        let sig = signature("react", json!({"script": "react\\.production\\.min\\.js"}));
        let evidence = Evidence::from_body(
            r#"<script src="/static/react.production.min.js"></script>"#.to_string(),
        );
        let (headers, cookies) = empty_maps();

        let channels = sig.evaluate(&evidence, &headers, &cookies);
        assert_eq!(channels, vec![CHANNEL_SCRIPT_TAG]);
    }

    #[test]
    fn test_header_key_case_insensitive_value_pattern_sensitive() {
        let sig = signature("nginx", json!({"headers": {"Server": "nginx"}}));
        let evidence = Evidence::from_body("<html></html>".to_string());
        let cookies = HashMap::new();

        let mut headers = HashMap::new();
        headers.insert("server".to_string(), "nginx/1.25.3".to_string());
        assert_eq!(
            sig.evaluate(&evidence, &headers, &cookies),
            vec![CHANNEL_HEADER]
        );

        // 键命中但值的大小写由正则自身决定
        let mut headers_upper = HashMap::new();
        headers_upper.insert("server".to_string(), "NGINX/1.25.3".to_string());
        assert!(sig.evaluate(&evidence, &headers_upper, &cookies).is_empty());
    }

    #[test]
    fn test_cookie_channel() {
        let sig = signature("laravel", json!({"cookies": {"laravel_session": ".+"}}));
        let evidence = Evidence::from_body("<html></html>".to_string());
        let headers = HashMap::new();

        let mut cookies = HashMap::new();
        cookies.insert("Laravel_Session".to_string(), "abc123".to_string());
        assert_eq!(
            sig.evaluate(&evidence, &headers, &cookies),
            vec![CHANNEL_COOKIE]
        );
    }

    #[test]
    fn test_meta_channel() {
        let sig = signature("wordpress", json!({"meta": {"generator": "WordPress"}}));
        let evidence = Evidence::from_body(
            r#"<meta name="generator" content="WordPress 6.0">"#.to_string(),
        );
        let (headers, cookies) = empty_maps();

        // meta证据为属性展平映射：content属性键与模式键generator不相等，
        // 但generator值出现在content键的场景不成立；此处按展平语义校验
        let channels = sig.evaluate(&evidence, &headers, &cookies);
        assert!(channels.is_empty());

        // 模式键content才能对准展平后的content属性值
        let sig_content = signature("wordpress", json!({"meta": {"content": "WordPress"}}));
        assert_eq!(
            sig_content.evaluate(&evidence, &headers, &cookies),
            vec![CHANNEL_META_TAG]
        );
    }

    #[test]
    fn test_inline_js_literal_identity_semantics() {
        // 内联JS通道：键与脚本全文大小写无关相等时才应用模式
        let sig = signature("marker", json!({"js": {"window.Acme": "Acme"}}));
        let (headers, cookies) = empty_maps();

        let hit = Evidence::from_body("<script>window.Acme</script>".to_string());
        assert_eq!(
            sig.evaluate(&hit, &headers, &cookies),
            vec![CHANNEL_JAVASCRIPT]
        );

        // 键只作为子串出现时不命中（字面一致性语义）
        let miss =
            Evidence::from_body("<script>var a = window.Acme.version;</script>".to_string());
        assert!(sig.evaluate(&miss, &headers, &cookies).is_empty());
    }

    #[test]
    fn test_multiple_channels_all_reported() {
        let sig = signature(
            "wordpress",
            json!({"html": "wp-content", "script": "wp-includes"}),
        );
        let evidence = Evidence::from_body(
            r#"<body class="wp-content"><script src="/wp-includes/a.js"></script></body>"#
                .to_string(),
        );
        let (headers, cookies) = empty_maps();

        let channels = sig.evaluate(&evidence, &headers, &cookies);
        assert_eq!(channels, vec![CHANNEL_HTML_CONTENT, CHANNEL_SCRIPT_TAG]);
    }

    #[test]
    fn test_match_result_records_insertion_order() {
        let mut result = MatchResult::new("http://example.com/".to_string());
        assert!(!result.has_matches());

        result.record("b-tech".to_string(), vec![CHANNEL_HTML_CONTENT]);
        result.record("a-tech".to_string(), vec![CHANNEL_SCRIPT_TAG]);

        assert_eq!(result.tech_found, vec!["b-tech", "a-tech"]);
        assert_eq!(result.technology_matches[0].name, "b-tech");
    }
}
