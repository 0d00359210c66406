//! 规则数据模型定义
//! 仅存储规则数据，匹配逻辑在detector模块实现

use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::pattern::{compile_keyed, compile_list, PatternValue};

/// 技术规则原始形态（从规则库JSON解析）
/// 字段形状不可预期（单字符串/列表/键值映射），统一先落到`Value`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTechRule {
    #[serde(default)]
    pub website: Option<Value>,
    #[serde(default)]
    pub icon: Option<Value>,
    #[serde(default)]
    pub html: Option<Value>,
    #[serde(default)]
    pub script: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub cookies: Option<Value>,
    #[serde(default)]
    pub js: Option<Value>,
    #[serde(default)]
    pub meta: Option<Value>,
}

/// 单个技术的检测签名（模式已编译）
/// 六类匹配规则相互独立，全部为空的签名是惰性的：保留在规则库中但永不命中
#[derive(Debug, Clone, Default)]
pub struct Signature {
    pub name: String,
    pub website: Option<String>,
    pub html: Vec<Regex>,
    pub script: Vec<Regex>,
    pub headers: HashMap<String, Regex>,
    pub cookies: HashMap<String, Regex>,
    pub meta: HashMap<String, Regex>,
    pub js: HashMap<String, Regex>,
}

impl Signature {
    /// 从原始规则构建签名
    /// 单字段/单条目失败仅跳过自身，不影响其余字段（规则库容错加载）
    pub fn from_raw(name: &str, raw: &RawTechRule) -> Self {
        let mut signature = Signature {
            name: name.to_string(),
            website: raw
                .website
                .as_ref()
                .and_then(Value::as_str)
                .map(str::to_string),
            ..Default::default()
        };

        if let Some(value) = &raw.html {
            match PatternValue::from_list_value(value) {
                Some(pv) => signature.html = compile_list(&pv),
                None => warn!("技术[{}]的html规则形状无效，已跳过该字段", name),
            }
        }

        if let Some(value) = &raw.script {
            match PatternValue::from_list_value(value) {
                Some(pv) => signature.script = compile_list(&pv),
                None => warn!("技术[{}]的script规则形状无效，已跳过该字段", name),
            }
        }

        signature.headers = Self::build_keyed(name, "headers", raw.headers.as_ref());
        signature.cookies = Self::build_keyed(name, "cookies", raw.cookies.as_ref());
        signature.meta = Self::build_keyed(name, "meta", raw.meta.as_ref());
        signature.js = Self::build_keyed(name, "js", raw.js.as_ref());

        signature
    }

    fn build_keyed(
        tech_name: &str,
        field: &str,
        value: Option<&Value>,
    ) -> HashMap<String, Regex> {
        let Some(value) = value else {
            return HashMap::new();
        };

        match PatternValue::from_keyed_value(value) {
            Some(pv) => compile_keyed(&pv),
            None => {
                warn!("技术[{}]的{}规则形状无效，已跳过该字段", tech_name, field);
                HashMap::new()
            }
        }
    }

    /// 是否不含任何可用匹配规则
    pub fn is_inert(&self) -> bool {
        self.html.is_empty()
            && self.script.is_empty()
            && self.headers.is_empty()
            && self.cookies.is_empty()
            && self.meta.is_empty()
            && self.js.is_empty()
    }
}

/// 规则库：小写技术名 → 签名
/// 启动期构建一次，范围过滤后只读共享，运行期不再变更
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    signatures: HashMap<String, Signature>,
}

impl Catalog {
    /// 插入签名（键统一小写，同名冲突后写覆盖前写）
    pub fn insert(&mut self, signature: Signature) {
        let key = signature.name.to_lowercase();
        self.signatures.insert(key, signature);
    }

    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.signatures.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Signature)> {
        self.signatures.iter()
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// 应用技术范围过滤（小写技术名列表）
    /// 请求的技术不存在时告警；全部不存在时规则库保持原样
    pub fn apply_scope(&mut self, tech_filter: &[String]) {
        if tech_filter.is_empty() {
            return;
        }

        let mut scoped = HashMap::new();
        for technology in tech_filter {
            match self.signatures.get(technology) {
                Some(signature) => {
                    scoped.insert(technology.clone(), signature.clone());
                }
                None => warn!("指定的技术[{}]在规则库中不存在", technology),
            }
        }

        if !scoped.is_empty() {
            self.signatures = scoped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_rule(value: serde_json::Value) -> RawTechRule {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_signature_from_raw_single_and_list() {
        let raw = raw_rule(json!({
            "website": "https://wordpress.org",
            "html": "wp-content",
            "script": ["wp-includes", "wp-embed\\.min\\.js"]
        }));
        let signature = Signature::from_raw("WordPress", &raw);

        assert_eq!(signature.name, "WordPress");
        assert_eq!(signature.website.as_deref(), Some("https://wordpress.org"));
        assert_eq!(signature.html.len(), 1);
        assert_eq!(signature.script.len(), 2);
        assert!(!signature.is_inert());
    }

    #[test]
    fn test_signature_without_rules_is_inert() {
        let signature = Signature::from_raw("ghost", &RawTechRule::default());
        assert!(signature.is_inert());
    }

    #[test]
    fn test_invalid_field_shape_does_not_poison_others() {
        let raw = raw_rule(json!({
            "html": {"not": "a list"},
            "headers": {"Server": "nginx"}
        }));
        let signature = Signature::from_raw("nginx", &raw);

        assert!(signature.html.is_empty());
        assert_eq!(signature.headers.len(), 1);
    }

    #[test]
    fn test_catalog_keys_lowercased_last_write_wins() {
        let mut catalog = Catalog::default();
        let first = Signature {
            name: "WordPress".to_string(),
            website: Some("first".to_string()),
            ..Default::default()
        };
        let second = Signature {
            name: "wordpress".to_string(),
            website: Some("second".to_string()),
            ..Default::default()
        };

        catalog.insert(first);
        catalog.insert(second);

        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("wordpress").unwrap().website.as_deref(),
            Some("second")
        );
    }

    #[test]
    fn test_apply_scope_retains_present_and_warns_absent() {
        let mut catalog = Catalog::default();
        catalog.insert(Signature {
            name: "react".to_string(),
            ..Default::default()
        });
        catalog.insert(Signature {
            name: "vue".to_string(),
            ..Default::default()
        });

        catalog.apply_scope(&["react".to_string(), "missing".to_string()]);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("react").is_some());
        assert!(catalog.get("vue").is_none());
    }

    #[test]
    fn test_apply_scope_all_absent_keeps_catalog() {
        let mut catalog = Catalog::default();
        catalog.insert(Signature {
            name: "react".to_string(),
            ..Default::default()
        });

        catalog.apply_scope(&["missing".to_string()]);
        assert_eq!(catalog.len(), 1);
    }
}
