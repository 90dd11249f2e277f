use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::config::VisionConfig;
use crate::errors::MCPError;

/// 内嵌到视觉请求中的媒体载荷
#[derive(Debug, Clone)]
pub struct MediaPayload {
    /// MIME 类型，如 image/png、application/pdf
    pub mime: String,
    /// Base64 编码的文件内容
    pub base64_data: String,
}

impl MediaPayload {
    pub fn new(mime: impl Into<String>, base64_data: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            base64_data: base64_data.into(),
        }
    }

    /// 生成 data URI
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.base64_data)
    }
}

/// 视觉分析接口
///
/// 工具通过该 trait 调用模型，测试中注入计数桩即可验证
/// “下载或校验失败时不触发任何模型调用”。
#[async_trait]
pub trait VisionApi: Send + Sync {
    /// 对媒体内容执行一次分析，返回模型的自由文本回答
    async fn analyze(&self, media: &MediaPayload, prompt: &str) -> Result<String>;
}

/// OpenAI 兼容的 chat/completions 视觉客户端
pub struct VisionClient {
    config: VisionConfig,
    client: Client,
}

impl VisionClient {
    pub fn new(config: VisionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        debug!("🤖 初始化视觉客户端: {} / {}", config.api_base, config.model);

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl VisionApi for VisionClient {
    async fn analyze(&self, media: &MediaPayload, prompt: &str) -> Result<String> {
        let api_key = self.config.require_api_key()?;

        let request_body = json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "user",
                    "content": [
                        { "type": "text", "text": prompt },
                        {
                            "type": "image_url",
                            "image_url": { "url": media.data_uri() }
                        }
                    ]
                }
            ],
            "max_tokens": 1000,
            "temperature": 0.7
        });

        let start = std::time::Instant::now();
        let response = timeout(
            Duration::from_secs(self.config.timeout_secs),
            self.client
                .post(format!("{}/chat/completions", self.config.api_base))
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&request_body)
                .send(),
        )
        .await
        .map_err(|_| MCPError::VisionApiError(format!(
            "请求超时（{}秒）", self.config.timeout_secs
        )))?
        .map_err(|e| MCPError::VisionApiError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(MCPError::VisionApiError(format!("{} - {}", status, error_text)).into());
        }

        let response_json: Value = response.json().await
            .map_err(|e| MCPError::VisionApiError(format!("响应解析失败: {}", e)))?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|arr| arr.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| MCPError::VisionApiError("无效的模型响应格式".to_string()))?
            .to_string();

        debug!("🤖 视觉分析完成，耗时: {}ms", start.elapsed().as_millis());

        Ok(content)
    }
}
