use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use anyhow::Result;

use crate::errors::MCPError;
use super::base::{MCPTool, Schema, SchemaObject, SchemaString, ToolAnnotations};
use super::fetch::{clean_url, validate_url};

static SLIDES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://docs\.google\.com/presentation/d/([a-zA-Z0-9\-_]+)").unwrap()
});
static DRIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://drive\.google\.com/file/d/([a-zA-Z0-9\-_]+)").unwrap()
});
static DOCS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://docs\.google\.com/document/d/([a-zA-Z0-9\-_]+)").unwrap()
});
static SHEETS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"https://docs\.google\.com/spreadsheets/d/([a-zA-Z0-9\-_]+)").unwrap()
});

/// 一个可用于分析或下载的导出地址
#[derive(Debug, Clone)]
pub struct ExportUrl {
    pub format: &'static str,
    pub url: String,
    pub description: &'static str,
}

/// Google 分享链接的识别结果
#[derive(Debug, Clone)]
pub struct GoogleLink {
    pub file_type: &'static str,
    pub file_id: String,
    pub export_urls: Vec<ExportUrl>,
}

/// 识别 Google Slides / Drive / Docs / Sheets 分享链接并生成直链导出地址
pub fn convert(url: &str) -> Option<GoogleLink> {
    if let Some(caps) = SLIDES_RE.captures(url) {
        let file_id = caps[1].to_string();
        return Some(GoogleLink {
            file_type: "google_slides",
            export_urls: vec![
                ExportUrl {
                    format: "pdf",
                    url: format!("https://docs.google.com/presentation/d/{}/export/pdf", file_id),
                    description: "演示文稿的 PDF 版本，用于分析",
                },
                ExportUrl {
                    format: "pptx",
                    url: format!("https://docs.google.com/presentation/d/{}/export/pptx", file_id),
                    description: "PowerPoint 版本，用于下载",
                },
            ],
            file_id,
        });
    }

    if let Some(caps) = DRIVE_RE.captures(url) {
        let file_id = caps[1].to_string();
        return Some(GoogleLink {
            file_type: "google_drive",
            export_urls: vec![
                ExportUrl {
                    format: "direct_download",
                    url: format!("https://drive.google.com/u/0/uc?id={}&export=download", file_id),
                    description: "文件直接下载链接",
                },
            ],
            file_id,
        });
    }

    if let Some(caps) = DOCS_RE.captures(url) {
        let file_id = caps[1].to_string();
        return Some(GoogleLink {
            file_type: "google_docs",
            export_urls: vec![
                ExportUrl {
                    format: "pdf",
                    url: format!("https://docs.google.com/document/d/{}/export?format=pdf", file_id),
                    description: "文档的 PDF 版本，用于分析",
                },
                ExportUrl {
                    format: "docx",
                    url: format!("https://docs.google.com/document/d/{}/export?format=docx", file_id),
                    description: "Word 文档版本",
                },
            ],
            file_id,
        });
    }

    if let Some(caps) = SHEETS_RE.captures(url) {
        let file_id = caps[1].to_string();
        return Some(GoogleLink {
            file_type: "google_sheets",
            export_urls: vec![
                ExportUrl {
                    format: "pdf",
                    url: format!("https://docs.google.com/spreadsheets/d/{}/export?format=pdf", file_id),
                    description: "表格的 PDF 版本，用于分析",
                },
                ExportUrl {
                    format: "xlsx",
                    url: format!("https://docs.google.com/spreadsheets/d/{}/export?format=xlsx", file_id),
                    description: "Excel 版本，用于下载",
                },
            ],
            file_id,
        });
    }

    None
}

/// 取适合 PDF 分析的首选直链；非 Google 链接原样返回
pub fn rewrite_for_pdf(url: &str) -> String {
    match convert(url) {
        Some(link) => link.export_urls
            .iter()
            .find(|e| e.format == "pdf" || e.format == "direct_download")
            .map(|e| e.url.clone())
            .unwrap_or_else(|| url.to_string()),
        None => url.to_string(),
    }
}

/// convert_google_link 工具：把分享链接转换表格式化为文本返回
pub struct ConvertGoogleLinkTool {
    annotations: ToolAnnotations,
    schema: Schema,
}

impl ConvertGoogleLinkTool {
    pub fn new() -> Self {
        let mut properties = HashMap::new();
        properties.insert("url".to_string(), Schema::String(SchemaString {
            description: Some("Google 文件分享链接".to_string()),
            enum_values: None,
        }));

        Self {
            annotations: ToolAnnotations {
                category: "链接转换".to_string(),
                tags: vec!["google".to_string(), "链接".to_string()],
                version: "1.0".to_string(),
            },
            schema: Schema::Object(SchemaObject {
                required: vec!["url".to_string()],
                properties,
                description: Some("将 Google 分享链接转换为可直接下载/分析的地址".to_string()),
            }),
        }
    }

    fn format_conversion(link: &GoogleLink, original: &str) -> String {
        let mut out = String::new();
        out.push_str("🔄 **Google 链接转换结果**\n\n");
        out.push_str(&format!("📁 原始链接: {}\n", original));
        out.push_str(&format!("📋 文件类型: {}\n", link.file_type));
        out.push_str(&format!("🔗 文件 ID: {}\n\n", link.file_id));
        out.push_str("📎 可用的导出地址:\n");
        for (i, export) in link.export_urls.iter().enumerate() {
            out.push_str(&format!(
                "{}. **{}**\n   URL: {}\n   用途: {}\n",
                i + 1,
                export.format.to_uppercase(),
                export.url,
                export.description
            ));
        }
        out
    }
}

impl Default for ConvertGoogleLinkTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MCPTool for ConvertGoogleLinkTool {
    fn name(&self) -> &str {
        "convert_google_link"
    }

    fn description(&self) -> &str {
        "将 Google Slides/Drive/Docs/Sheets 分享链接转换为直接下载或分析地址"
    }

    fn annotations(&self) -> &ToolAnnotations {
        &self.annotations
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let raw = params.get("url").and_then(|v| v.as_str())
            .ok_or_else(|| MCPError::InvalidParameter("缺少 url 参数".to_string()))?;

        let url = clean_url(raw);
        validate_url(&url)?;

        let link = convert(&url).ok_or_else(|| MCPError::InvalidParameter(format!(
            "无法识别为 Google 文件分享链接: {}", url
        )))?;

        Ok(Value::String(Self::format_conversion(&link, &url)))
    }
}
