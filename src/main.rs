use anyhow::Result;
use tracing::{info, warn};

use grape_mcp_design::config::VisionConfig;
use grape_mcp_design::mcp::{MCPServer, Server};
use grape_mcp_design::tools::{AnalysisTool, ConvertGoogleLinkTool};

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv::dotenv().ok();

    // 初始化日志（日志走 stderr，stdout 留给协议响应）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "grape_mcp_design=info".to_string()),
        )
        .init();

    info!("🚀 启动 Grape MCP Design 服务器...");

    let config = VisionConfig::from_env();
    if config.api_key.is_none() {
        // 密钥缺失不是致命错误：工具调用时以带内错误返回
        warn!("⚠️ 未配置 OPENAI_API_KEY，分析工具将返回配置错误");
    }
    info!("🤖 视觉模型: {} @ {}", config.model, config.api_base);
    if let Some(dir) = &config.scorecard_dir {
        info!("📈 评分卡目录: {}", dir.display());
    }

    let registry = MCPServer::new();
    registry.register_tool(Box::new(AnalysisTool::design(config.clone())?)).await?;
    registry.register_tool(Box::new(AnalysisTool::presentation(config.clone())?)).await?;
    registry.register_tool(Box::new(ConvertGoogleLinkTool::new())).await?;

    info!("✅ 已注册 {} 个工具", registry.tool_count().await);

    let server = Server::new(registry);
    server.run().await
}
