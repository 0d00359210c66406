//! 规则加载管理器
//! 负责远程拉取规则库JSON并容错构建为可匹配的Catalog

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::model::{Catalog, RawTechRule, Signature};
use crate::config::ScanConfig;
use crate::error::{TdResult, TechDetectError};

/// 规则库JSON顶层形状：任意分组键 → (技术名 → 规则对象)
/// 有序映射保证同名冲突时"后写覆盖前写"可复现
type RawRuleFile = BTreeMap<String, BTreeMap<String, Value>>;

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载规则库
    /// 拉取或解析失败降级为空规则库并告警，不中断启动
    pub async fn load(config: &ScanConfig) -> Catalog {
        if config.disable_catalog {
            debug!("规则库已禁用，仅使用自定义匹配规则");
            return Catalog::default();
        }

        match Self::fetch_raw(config).await {
            Ok(raw) => {
                let catalog = Self::build_catalog(&raw);
                debug!("规则库加载完成，技术总数：{}", catalog.len());
                catalog
            }
            Err(e) => {
                warn!("规则库拉取失败，将以空规则库继续运行：{}", e);
                Catalog::default()
            }
        }
    }

    /// 拉取远程规则库原始JSON
    async fn fetch_raw(config: &ScanConfig) -> TdResult<RawRuleFile> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let response = client
            .get(&config.source_url)
            .header("Accept-Encoding", "gzip, deflate")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(TechDetectError::RuleLoadError(format!(
                "规则源URL {} 返回状态码 {}",
                config.source_url,
                response.status()
            )));
        }

        Ok(response.json::<RawRuleFile>().await?)
    }

    /// 将原始JSON构建为Catalog
    /// 单条技术解析失败仅跳过自身；键统一小写，同名冲突后写覆盖前写
    pub fn build_catalog(raw: &RawRuleFile) -> Catalog {
        let mut catalog = Catalog::default();

        for group in raw.values() {
            for (tech_name, rule_value) in group {
                let raw_rule: RawTechRule =
                    match serde_json::from_value(rule_value.clone()) {
                        Ok(rule) => rule,
                        Err(e) => {
                            warn!("技术[{}]规则解析失败，已跳过：{}", tech_name, e);
                            continue;
                        }
                    };

                catalog.insert(Signature::from_raw(tech_name, &raw_rule));
            }
        }

        catalog
    }
}
