//! # Grape MCP Design
//!
//! 一个基于 MCP (Model Context Protocol) 的设计分析服务，通过 stdio JSON-RPC
//! 接收请求，下载图片或 PDF，调用视觉模型按类别打分并返回格式化文本。
//!
//! ## 特性
//!
//! - 🎨 **设计分析** - 下载图片并由视觉模型按五个类别打分
//! - 📊 **演示文稿分析** - 抓取 PDF（含反爬策略轮试）并分析设计与内容
//! - 🔄 **链接转换** - Google Slides/Drive/Docs/Sheets 分享链接转直链
//! - 📈 **评分卡** - 从模型回答提取评分，渲染 PNG 评分卡并可选上传图床
//! - 🚀 **MCP协议** - 基于标准MCP协议，stdio 模式逐行通信
//!
//! ## 快速开始
//!
//! ```no_run
//! use grape_mcp_design::config::VisionConfig;
//! use grape_mcp_design::mcp::{MCPServer, Server};
//! use grape_mcp_design::tools::AnalysisTool;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = VisionConfig::from_env();
//!     let registry = MCPServer::new();
//!     registry.register_tool(Box::new(AnalysisTool::design(config)?)).await?;
//!
//!     Server::new(registry).run().await
//! }
//! ```

pub mod ai;
pub mod config;
pub mod errors;
pub mod mcp;
pub mod tools;

pub use errors::MCPError;

// Re-export commonly used types
pub use async_trait::async_trait;
pub use serde_json::{json, Value};
