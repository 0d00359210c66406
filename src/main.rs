//! rstechdetect CLI
//! 从标准输入读取URL列表，加载规则库后运行抓取/评估流水线

use std::io::BufReader;

use anyhow::Context;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rstechdetect::config::ScanConfig;
use rstechdetect::detector::ScanPipeline;
use rstechdetect::rule::{CustomMatchSet, RuleLoader};
use rstechdetect::utils::read_urls;
use rstechdetect::{parse_header_flag, Catalog};

#[derive(Debug, Parser)]
#[command(name = "rstechdetect", version, about = "网站技术栈识别：并发抓取URL并匹配Web技术指纹")]
struct Cli {
    /// 附加到所有请求的Cookie串
    #[arg(long)]
    cookies: Option<String>,

    /// 附加到所有请求的Header（分号分隔多个 `Name: value`）
    #[arg(short = 'H', long = "headers")]
    headers: Option<String>,

    /// 限定检测的技术（逗号分隔，默认全量）
    #[arg(long = "tech")]
    tech: Option<String>,

    /// 自定义匹配规则（JSON对象：{"htmlContent": "正则"} 或 {"scriptSrc": [...]}，可多次）
    #[arg(short = 'm', long = "match")]
    custom_matches: Vec<String>,

    /// Debug模式：输出失败请求与零命中URL等详细信息
    #[arg(long)]
    debug: bool,

    /// 并发worker数量
    #[arg(short = 'w', long = "workers", default_value_t = rstechdetect::config::DEFAULT_CONCURRENCY)]
    workers: usize,

    /// 单请求超时（秒）
    #[arg(short = 't', long = "timeout", default_value_t = rstechdetect::config::DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// 禁用远程规则库（仅自定义匹配）
    #[arg(long = "no-catalog")]
    no_catalog: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.debug);

    // 致命配置错误在任何抓取开始前退出
    let headers = match &cli.headers {
        Some(raw) => parse_header_flag(raw).context("headers参数解析失败")?,
        None => Default::default(),
    };

    let custom = CustomMatchSet::parse(&cli.custom_matches)
        .context("自定义匹配规则解析失败")?;

    let mut builder = ScanConfig::builder()
        .concurrency(cli.workers)
        .timeout_secs(cli.timeout)
        .debug(cli.debug)
        .cookies(cli.cookies.clone())
        .headers(headers)
        .disable_catalog(cli.no_catalog);
    if let Some(tech) = &cli.tech {
        builder = builder.tech_filter_raw(tech);
    }
    let config = builder.build();

    // 读取、校验并去重URL
    let urls = read_urls(BufReader::new(std::io::stdin().lock()));
    debug!("待扫描URL共{}条", urls.len());

    // 规则库拉取失败降级为空库，不中断运行
    let mut catalog: Catalog = RuleLoader::load(&config).await;
    catalog.apply_scope(&config.tech_filter);

    let pipeline = ScanPipeline::new(catalog, custom, config)
        .context("流水线初始化失败")?;
    pipeline.run(urls).await;

    debug!(
        "扫描完成：成功请求{}次，失败请求{}次",
        pipeline.stats().successful(),
        pipeline.stats().failed()
    );

    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug {
        "rstechdetect=debug"
    } else {
        "rstechdetect=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
