//! 抓取/评估流水线
//! 固定大小的并发窗口消费URL列表：单URL一次GET，失败不重试，
//! 成功则提取证据并评估全部在范围内的技术与自定义匹配

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{stream, StreamExt};
use reqwest::Client;
use tracing::debug;

use super::matcher::MatchResult;
use crate::config::ScanConfig;
use crate::error::TdResult;
use crate::extractor::Evidence;
use crate::rule::{Catalog, CustomMatchSet};
use crate::utils::http;

/// 全程计数器（worker间原子共享）
#[derive(Debug, Default)]
pub struct ScanStats {
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,
}

impl ScanStats {
    pub fn successful(&self) -> usize {
        self.successful_requests.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed_requests.load(Ordering::Relaxed)
    }

    fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }
}

/// 抓取/评估流水线
/// 规则库与自定义匹配只读共享；结果按完成序上报，URL间无顺序保证
pub struct ScanPipeline {
    catalog: Arc<Catalog>,
    custom: Arc<CustomMatchSet>,
    config: Arc<ScanConfig>,
    client: Client,
    stats: ScanStats,
}

impl ScanPipeline {
    /// 创建流水线（构建HTTP客户端）
    pub fn new(
        catalog: Catalog,
        custom: CustomMatchSet,
        config: ScanConfig,
    ) -> TdResult<Self> {
        let client = http::build_client(&config)?;
        Ok(Self {
            catalog: Arc::new(catalog),
            custom: Arc::new(custom),
            config: Arc::new(config),
            client,
            stats: ScanStats::default(),
        })
    }

    /// 运行流水线直至URL源耗尽且全部在途任务完成
    /// 无整体截止时间，无提前取消路径
    pub async fn run(&self, urls: Vec<String>) {
        let concurrency = self.config.concurrency.max(1);

        stream::iter(urls)
            .map(|url| self.scan_url(url))
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;
    }

    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    /// 单URL任务：Queued → Fetching → (Failed | Extracted) → Evaluated → Reported
    async fn scan_url(&self, url: String) {
        let response = match http::send_request(&self.client, &self.config, &url).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.record_failure();
                debug!("请求[{}]发送失败：{}", url, e);
                return;
            }
        };
        self.stats.record_success();
        debug!("请求[{}]完成，状态码{}", url, response.status);

        // 空响应体：无可评估内容，静默丢弃（非失败）
        if response.body.is_empty() {
            return;
        }

        // 状态码不做门槛：任何可达响应体都参与评估
        let evidence = Evidence::from_body(response.body);

        let mut result = MatchResult::new(url);
        for (key, signature) in self.catalog.iter() {
            let channels =
                signature.evaluate(&evidence, &response.headers, &response.cookies);
            if !channels.is_empty() {
                result.record(key.clone(), channels);
            }
        }

        for (name, channels) in self.custom.evaluate(&evidence) {
            result.record(name, channels);
        }

        self.report(&result);
    }

    fn report(&self, result: &MatchResult) {
        if result.has_matches() {
            println!("[{}]: [{}]", result.url, result.tech_found.join(", "));
        } else {
            debug!("[{}]: no matches found", result.url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_atomic_counting() {
        let stats = ScanStats::default();
        stats.record_success();
        stats.record_success();
        stats.record_failure();

        assert_eq!(stats.successful(), 2);
        assert_eq!(stats.failed(), 1);
    }

    #[test]
    fn test_pipeline_construction() {
        let pipeline = ScanPipeline::new(
            Catalog::default(),
            CustomMatchSet::default(),
            ScanConfig::default(),
        );
        assert!(pipeline.is_ok());
    }

    #[tokio::test]
    async fn test_run_with_empty_url_list_completes() {
        let pipeline = ScanPipeline::new(
            Catalog::default(),
            CustomMatchSet::default(),
            ScanConfig::default(),
        )
        .unwrap();

        pipeline.run(Vec::new()).await;
        assert_eq!(pipeline.stats().successful(), 0);
        assert_eq!(pipeline.stats().failed(), 0);
    }
}
