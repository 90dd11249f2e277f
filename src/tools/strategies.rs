use rand::Rng;
use tracing::{debug, warn};
use url::Url;

use crate::errors::{MCPError, Result};
use super::fetch::{Download, FetchRequest, UrlFetcher, DEFAULT_USER_AGENT};

/// 成功判定的最小响应体大小，低于该值视为反爬页面而非真实 PDF
pub const MIN_PDF_BYTES: usize = 1024;

/// 一种抓取策略：请求头组合、可选的 https 改写和站点根预热请求
#[derive(Debug, Clone)]
pub struct FetchStrategy {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub headers: &'static [(&'static str, &'static str)],
    /// 将 http:// 改写为 https:// 再请求
    pub rewrite_https: bool,
    /// 先对站点根路径发一次 GET 以建立会话
    pub prime_root: bool,
    /// 策略间延迟区间（毫秒）
    pub delay_ms: (u64, u64),
}

/// PDF 抓取策略表，按顺序尝试直到成功谓词满足或全部耗尽
pub static PDF_FETCH_STRATEGIES: &[FetchStrategy] = &[
    FetchStrategy {
        name: "browser-default",
        user_agent: DEFAULT_USER_AGENT,
        headers: &[
            ("Accept", "application/pdf,application/octet-stream,*/*"),
            ("Accept-Language", "en-US,en;q=0.9"),
        ],
        rewrite_https: false,
        prime_root: false,
        delay_ms: (0, 0),
    },
    FetchStrategy {
        name: "https-rewrite",
        user_agent: DEFAULT_USER_AGENT,
        headers: &[
            ("Accept", "application/pdf,application/octet-stream,*/*"),
        ],
        rewrite_https: true,
        prime_root: false,
        delay_ms: (200, 600),
    },
    FetchStrategy {
        name: "googlebot",
        user_agent: "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)",
        headers: &[
            ("Accept", "*/*"),
        ],
        rewrite_https: false,
        prime_root: false,
        delay_ms: (300, 800),
    },
    FetchStrategy {
        name: "wget-plain",
        user_agent: "Wget/1.21.4",
        headers: &[],
        rewrite_https: false,
        prime_root: false,
        delay_ms: (300, 800),
    },
    FetchStrategy {
        name: "session-prime",
        user_agent: DEFAULT_USER_AGENT,
        headers: &[
            ("Accept", "application/pdf,application/octet-stream,*/*"),
            ("Referer", "https://www.google.com/"),
        ],
        rewrite_https: false,
        prime_root: true,
        delay_ms: (500, 1200),
    },
];

/// 成功谓词：HTTP 200 且响应体不小于阈值
fn is_success(download: &Download) -> bool {
    download.status == 200 && download.bytes.len() >= MIN_PDF_BYTES
}

/// 提取站点根地址（scheme://host），用于会话预热
fn site_root(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(format!("{}://{}/", parsed.scheme(), host))
}

/// 按策略表顺序抓取 PDF
///
/// 每个策略一次尝试，策略之间按区间随机延迟；全部失败时返回一条
/// 列出所有已尝试策略名称的聚合错误。
pub async fn fetch_with_strategies(fetcher: &dyn UrlFetcher, url: &str) -> Result<Download> {
    let mut attempted: Vec<&'static str> = Vec::new();
    let mut failures: Vec<String> = Vec::new();

    for (index, strategy) in PDF_FETCH_STRATEGIES.iter().enumerate() {
        if index > 0 {
            let (lo, hi) = strategy.delay_ms;
            if hi > lo {
                let delay = rand::thread_rng().gen_range(lo..=hi);
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            }
        }

        attempted.push(strategy.name);

        let target = if strategy.rewrite_https && url.starts_with("http://") {
            url.replacen("http://", "https://", 1)
        } else {
            url.to_string()
        };

        // 会话预热：对站点根发一次 GET，结果本身不参与判定
        if strategy.prime_root {
            if let Some(root) = site_root(&target) {
                let prime = FetchRequest {
                    url: root,
                    user_agent: strategy.user_agent.to_string(),
                    headers: Vec::new(),
                };
                if let Err(e) = fetcher.fetch(&prime).await {
                    debug!("会话预热失败（忽略）: {}", e);
                }
            }
        }

        let request = FetchRequest {
            url: target,
            user_agent: strategy.user_agent.to_string(),
            headers: strategy.headers.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        };

        debug!("📡 尝试抓取策略: {}", strategy.name);
        match fetcher.fetch(&request).await {
            Ok(download) if is_success(&download) => {
                debug!("✅ 策略 {} 成功 ({} 字节)", strategy.name, download.bytes.len());
                return Ok(download);
            }
            Ok(download) => {
                warn!(
                    "⚠️ 策略 {} 失败: HTTP {} / {} 字节",
                    strategy.name, download.status, download.bytes.len()
                );
                failures.push(format!(
                    "{}: HTTP {} ({} 字节)",
                    strategy.name, download.status, download.bytes.len()
                ));
            }
            Err(e) => {
                warn!("⚠️ 策略 {} 失败: {}", strategy.name, e);
                failures.push(format!("{}: {}", strategy.name, e));
            }
        }
    }

    Err(MCPError::NetworkError(format!(
        "所有抓取策略均失败 [{}]，详情: {}",
        attempted.join(", "),
        failures.join("; ")
    )).into())
}
