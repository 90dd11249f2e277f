use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, info};

use crate::ai::{prompt_templates, MediaPayload, VisionApi, VisionClient};
use crate::config::VisionConfig;
use crate::errors::MCPError;
use super::base::{MCPTool, Schema, SchemaObject, SchemaString, ToolAnnotations};
use super::fetch::{
    check_content_type, clean_url, encode_base64, validate_url,
    ExpectedContent, FetchRequest, HttpFetcher, UrlFetcher,
};
use super::google_links;
use super::scorecard;
use super::strategies::fetch_with_strategies;

/// 下载方式：单次请求，或按策略表轮试（PDF 反爬场景）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    Simple,
    Strategies,
}

/// 提示词选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Design,
    Presentation,
}

/// 声明式的分析工具定义
///
/// 两个分析工具的执行流程完全一致（校验 → 下载 → 模型调用 → 格式化），
/// 差异全部收敛到这张描述表里。
struct AnalysisSpec {
    name: &'static str,
    description: &'static str,
    expected: ExpectedContent,
    header: &'static str,
    fetch_mode: FetchMode,
    /// 下载前的 URL 改写（如 Google 分享链接转直链）
    rewrite_url: Option<fn(&str) -> String>,
    prompt: PromptKind,
    /// 是否接受 analysis_type 参数
    takes_analysis_type: bool,
}

/// 由 AnalysisSpec 驱动的视觉分析工具
pub struct AnalysisTool {
    spec: AnalysisSpec,
    annotations: ToolAnnotations,
    schema: Schema,
    config: VisionConfig,
    fetcher: Arc<dyn UrlFetcher>,
    vision: Arc<dyn VisionApi>,
}

impl AnalysisTool {
    /// analyze_design：图片设计分析
    pub fn design(config: VisionConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        let vision = Arc::new(VisionClient::new(config.clone())?);
        Ok(Self::design_with_backends(config, fetcher, vision))
    }

    /// analyze_presentation：PDF 演示文稿分析
    pub fn presentation(config: VisionConfig) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new()?);
        let vision = Arc::new(VisionClient::new(config.clone())?);
        Ok(Self::presentation_with_backends(config, fetcher, vision))
    }

    pub fn design_with_backends(
        config: VisionConfig,
        fetcher: Arc<dyn UrlFetcher>,
        vision: Arc<dyn VisionApi>,
    ) -> Self {
        Self::from_spec(
            AnalysisSpec {
                name: "analyze_design",
                description: "分析图片中的图形设计并按五个类别打分",
                expected: ExpectedContent::Image,
                header: "🎨 **设计分析报告**",
                fetch_mode: FetchMode::Simple,
                rewrite_url: None,
                prompt: PromptKind::Design,
                takes_analysis_type: false,
            },
            config,
            fetcher,
            vision,
        )
    }

    pub fn presentation_with_backends(
        config: VisionConfig,
        fetcher: Arc<dyn UrlFetcher>,
        vision: Arc<dyn VisionApi>,
    ) -> Self {
        Self::from_spec(
            AnalysisSpec {
                name: "analyze_presentation",
                description: "下载 PDF 演示文稿（支持 Google 分享链接）并按五个类别打分",
                expected: ExpectedContent::Pdf,
                header: "📊 **演示文稿分析报告**",
                fetch_mode: FetchMode::Strategies,
                rewrite_url: Some(|url| google_links::rewrite_for_pdf(url)),
                prompt: PromptKind::Presentation,
                takes_analysis_type: true,
            },
            config,
            fetcher,
            vision,
        )
    }

    fn from_spec(
        spec: AnalysisSpec,
        config: VisionConfig,
        fetcher: Arc<dyn UrlFetcher>,
        vision: Arc<dyn VisionApi>,
    ) -> Self {
        let mut properties = HashMap::new();
        properties.insert("url".to_string(), Schema::String(SchemaString {
            description: Some("要分析的文件 URL".to_string()),
            enum_values: None,
        }));
        if spec.takes_analysis_type {
            properties.insert("analysis_type".to_string(), Schema::String(SchemaString {
                description: Some("分析侧重点，缺省为 full".to_string()),
                enum_values: Some(vec![
                    "design".to_string(),
                    "content".to_string(),
                    "full".to_string(),
                ]),
            }));
        }

        let schema = Schema::Object(SchemaObject {
            required: vec!["url".to_string()],
            properties,
            description: Some(spec.description.to_string()),
        });

        let annotations = ToolAnnotations {
            category: "设计分析".to_string(),
            tags: vec!["视觉".to_string(), "评分".to_string()],
            version: "1.0".to_string(),
        };

        Self { spec, annotations, schema, config, fetcher, vision }
    }

    /// data URI 中使用的 MIME：图片沿用响应声明，octet-stream 的 PDF 统一归一
    fn media_mime(&self, content_type: &str) -> String {
        match self.spec.expected {
            ExpectedContent::Image => {
                let normalized = content_type.split(';').next().unwrap_or("").trim();
                if normalized.is_empty() {
                    "image/png".to_string()
                } else {
                    normalized.to_lowercase()
                }
            }
            ExpectedContent::Pdf => "application/pdf".to_string(),
        }
    }

    fn build_prompt(&self, params: &Value) -> String {
        match self.spec.prompt {
            PromptKind::Design => prompt_templates::design_analysis_prompt().to_string(),
            PromptKind::Presentation => {
                let analysis_type = params
                    .get("analysis_type")
                    .and_then(|v| v.as_str())
                    .unwrap_or("full");
                prompt_templates::presentation_analysis_prompt(analysis_type)
            }
        }
    }

    fn format_result(&self, url: &str, analysis: &str, card_url: Option<&str>) -> String {
        let mut out = String::new();
        out.push_str(self.spec.header);
        out.push_str("\n\n");
        out.push_str(analysis);
        if let Some(card) = card_url {
            out.push_str(&format!("\n\n📈 评分卡: {}", card));
        }
        out.push_str(&format!(
            "\n\n---\n📎 来源: {}\n🤖 由 {} 分析",
            url, self.config.model
        ));
        out
    }
}

#[async_trait]
impl MCPTool for AnalysisTool {
    fn name(&self) -> &str {
        self.spec.name
    }

    fn description(&self) -> &str {
        self.spec.description
    }

    fn annotations(&self) -> &ToolAnnotations {
        &self.annotations
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        // 1. URL 校验，任何网络调用之前完成
        let raw = params.get("url").and_then(|v| v.as_str())
            .ok_or_else(|| MCPError::InvalidParameter("缺少 url 参数".to_string()))?;
        let url = clean_url(raw);
        validate_url(&url)?;

        // 2. 凭证检查：缺失时以带内错误返回，不触发下载
        self.config.require_api_key()?;

        // 3. 下载前 URL 改写（Google 分享链接转直链）
        let fetch_url = match self.spec.rewrite_url {
            Some(rewrite) => {
                let rewritten = rewrite(&url);
                if rewritten != url {
                    info!("🔄 URL 已改写: {} -> {}", url, rewritten);
                }
                rewritten
            }
            None => url.clone(),
        };

        // 4. 下载
        let download = match self.spec.fetch_mode {
            FetchMode::Simple => {
                let download = self.fetcher.fetch(&FetchRequest::new(&fetch_url)).await?;
                if download.status != 200 {
                    return Err(MCPError::NetworkError(format!(
                        "下载失败: HTTP {}", download.status
                    )).into());
                }
                download
            }
            FetchMode::Strategies => fetch_with_strategies(self.fetcher.as_ref(), &fetch_url).await?,
        };

        // 5. 内容类型检查，不匹配时不调用模型
        check_content_type(&download, self.spec.expected)?;

        // 6. 模型调用
        let media = MediaPayload::new(
            self.media_mime(&download.content_type),
            encode_base64(&download.bytes),
        );
        debug!("🤖 调用视觉模型: {} ({} 字节)", self.spec.name, download.bytes.len());
        let analysis = self.vision.analyze(&media, &self.build_prompt(&params)).await?;

        // 7. 评分卡副作用，失败不影响结果
        let card_url = scorecard::publish(&self.config, &url, &analysis).await;

        Ok(Value::String(self.format_result(&url, &analysis, card_url.as_deref())))
    }
}
