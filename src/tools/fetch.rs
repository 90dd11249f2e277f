use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::errors::{MCPError, Result};

/// 下载超时时间（秒）
pub const FETCH_TIMEOUT_SECS: u64 = 30;

/// 浏览器风格的默认 User-Agent，降低被简单反爬规则拦截的概率
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 一次下载请求的参数
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    pub user_agent: String,
    pub headers: Vec<(String, String)>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }
}

/// 下载结果
#[derive(Debug, Clone)]
pub struct Download {
    pub status: u16,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// URL 下载器接口
///
/// 工具通过该 trait 持有下载能力，测试中注入计数桩即可验证
/// “校验失败时不发起任何网络调用”。
#[async_trait]
pub trait UrlFetcher: Send + Sync {
    async fn fetch(&self, request: &FetchRequest) -> Result<Download>;
}

/// 基于 reqwest 的下载器实现
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl UrlFetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<Download> {
        let mut builder = self.client
            .get(&request.url)
            .header(reqwest::header::USER_AGENT, &request.user_agent);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await
            .map_err(|e| MCPError::NetworkError(format!("下载失败 {}: {}", request.url, e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let bytes = response.bytes().await
            .map_err(|e| MCPError::NetworkError(format!("读取响应体失败 {}: {}", request.url, e)))?
            .to_vec();

        debug!("📥 下载完成: {} ({} 字节, {})", request.url, bytes.len(), content_type);

        Ok(Download { status, content_type, bytes })
    }
}

/// 工具期望的下载内容类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedContent {
    Image,
    Pdf,
}

impl ExpectedContent {
    /// 检查响应声明的媒体类型是否匹配
    ///
    /// Google Drive 的导出下载常以 octet-stream 返回 PDF，因此 Pdf 额外放行。
    pub fn matches(&self, content_type: &str) -> bool {
        let normalized = content_type.split(';').next().unwrap_or("").trim().to_lowercase();
        match self {
            ExpectedContent::Image => normalized.starts_with("image/"),
            ExpectedContent::Pdf => matches!(
                normalized.as_str(),
                "application/pdf" | "application/octet-stream" | "binary/octet-stream"
            ),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ExpectedContent::Image => "图片 (image/*)",
            ExpectedContent::Pdf => "PDF (application/pdf)",
        }
    }
}

/// 校验下载结果的内容类型，不匹配时返回描述性错误
pub fn check_content_type(download: &Download, expected: ExpectedContent) -> Result<()> {
    if !expected.matches(&download.content_type) {
        return Err(MCPError::ContentTypeMismatch(format!(
            "期望 {}，实际收到 '{}'",
            expected.describe(),
            download.content_type
        )).into());
    }
    Ok(())
}

/// 清理 URL 参数：去除首尾空白和用户粘贴引用时带入的 `@` 前缀
pub fn clean_url(raw: &str) -> String {
    raw.trim().trim_start_matches('@').trim().to_string()
}

/// 校验清理后的 URL：非空且以 http/https 开头
pub fn validate_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(MCPError::InvalidParameter("url 参数不能为空".to_string()).into());
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(MCPError::InvalidParameter(format!(
            "url 必须以 http:// 或 https:// 开头: {}", url
        )).into());
    }
    Ok(())
}

/// Base64 编码下载内容，用于内嵌到视觉模型请求
pub fn encode_base64(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_url_strips_at_and_whitespace() {
        assert_eq!(clean_url("@https://example.com/x.png "), "https://example.com/x.png");
        assert_eq!(clean_url("  @@https://a.b/c.pdf"), "https://a.b/c.pdf");
        assert_eq!(clean_url("https://a.b/c"), "https://a.b/c");
        assert_eq!(clean_url("   "), "");
    }

    #[test]
    fn test_validate_url_rejects_blank_and_bad_scheme() {
        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com/file.png").is_err());
        assert!(validate_url("example.com/file.png").is_err());
        assert!(validate_url("https://example.com/file.png").is_ok());
        assert!(validate_url("http://example.com/file.png").is_ok());
    }

    #[test]
    fn test_expected_content_matching() {
        assert!(ExpectedContent::Image.matches("image/png"));
        assert!(ExpectedContent::Image.matches("image/jpeg; charset=binary"));
        assert!(!ExpectedContent::Image.matches("text/html"));
        assert!(ExpectedContent::Pdf.matches("application/pdf"));
        assert!(ExpectedContent::Pdf.matches("application/octet-stream"));
        assert!(!ExpectedContent::Pdf.matches("text/html; charset=utf-8"));
    }

    #[test]
    fn test_check_content_type_error_is_descriptive() {
        let download = Download {
            status: 200,
            content_type: "text/html".to_string(),
            bytes: vec![0u8; 10],
        };
        let err = check_content_type(&download, ExpectedContent::Image).unwrap_err();
        assert!(err.to_string().contains("text/html"));
    }
}
