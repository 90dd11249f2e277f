use anyhow::Result;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::errors::MCPError;
use crate::tools::base::MCPTool;
use super::{Request, Response, InitializeResult, error_codes};

/// 工具信息结构
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// 工具注册表
pub struct MCPServer {
    tools: Arc<RwLock<Vec<Box<dyn MCPTool>>>>,
}

impl MCPServer {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register_tool(&self, tool: Box<dyn MCPTool>) -> Result<()> {
        let mut tools = self.tools.write().await;
        info!("🔧 注册工具: {}", tool.name());
        tools.push(tool);
        Ok(())
    }

    pub async fn execute_tool(&self, tool_name: &str, params: Value) -> Result<Value> {
        let tools = self.tools.read().await;

        for tool in tools.iter() {
            if tool.name() == tool_name {
                tool.validate_params(&params)?;
                return tool.execute(params).await;
            }
        }

        Err(MCPError::ToolNotFound(tool_name.to_string()).into())
    }

    /// 获取所有工具列表
    pub async fn list_tools(&self) -> Vec<ToolInfo> {
        let tools = self.tools.read().await;

        tools.iter().map(|tool| ToolInfo {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.parameters_schema().to_json(),
        }).collect()
    }

    /// 获取工具数量
    pub async fn tool_count(&self) -> usize {
        self.tools.read().await.len()
    }
}

impl Default for MCPServer {
    fn default() -> Self {
        Self::new()
    }
}

/// stdio JSON-RPC 调度循环
///
/// 每行一个请求对象，每个请求写回一行响应并立即刷新。请求之间完全独立，
/// 工具串行执行，当前工具返回前不读取下一行。
pub struct Server {
    mcp_server: Arc<MCPServer>,
}

impl Server {
    pub fn new(mcp_server: MCPServer) -> Self {
        Self {
            mcp_server: Arc::new(mcp_server),
        }
    }

    /// 运行服务器，直到 stdin 关闭
    pub async fn run(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);

        info!("🚀 MCP服务器已启动，等待请求...");

        loop {
            let mut request_line = String::new();
            match reader.read_line(&mut request_line).await {
                Ok(0) => {
                    info!("📡 输入流关闭，服务器退出");
                    break; // EOF
                }
                Ok(n) => {
                    debug!("📥 收到 {} 字节请求", n);
                }
                Err(e) => {
                    warn!("❌ 读取stdin错误: {}", e);
                    break;
                }
            }

            // 空行直接跳过
            if request_line.trim().is_empty() {
                continue;
            }

            let response = self.handle_line(&request_line).await;

            let response_json = serde_json::to_string(&response)?;
            debug!("📤 发送响应: {}", response_json);
            stdout.write_all(response_json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }

        Ok(())
    }

    /// 处理一行原始输入：解析失败返回 -32700，否则进入方法分发
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => {
                debug!("✅ 请求解析成功: {}", request.method);
                self.handle_request(request).await
            }
            Err(e) => {
                warn!("❌ 请求解析失败: {}", e);
                Response::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", e),
                )
            }
        }
    }

    /// 按方法名精确匹配分发
    pub async fn handle_request(&self, request: Request) -> Response {
        match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult::current();
                match serde_json::to_value(result) {
                    Ok(value) => Response::success(request.id, value),
                    Err(e) => Response::error(
                        request.id,
                        error_codes::INTERNAL_ERROR,
                        format!("序列化初始化结果失败: {}", e),
                    ),
                }
            }
            "tools/list" => self.handle_list_tools(request.id).await,
            "tools/call" => self.handle_tool_call(request.id, &request.params).await,
            other => Response::error(
                request.id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            ),
        }
    }

    /// 处理工具列表请求
    async fn handle_list_tools(&self, id: Value) -> Response {
        let tools = self.mcp_server.list_tools().await;

        let tool_list: Vec<Value> = tools.into_iter().map(|tool| {
            json!({
                "name": tool.name,
                "description": tool.description,
                "inputSchema": tool.input_schema
            })
        }).collect();

        Response::success(id, json!({ "tools": tool_list }))
    }

    /// 处理工具调用请求
    ///
    /// 校验失败、网络失败、下游API失败统一作为 -32000 错误对象返回，
    /// 不伪装成成功响应中的文本。
    async fn handle_tool_call(&self, id: Value, params: &Value) -> Response {
        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return Response::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "缺少工具名称".to_string(),
                );
            }
        };

        let arguments = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match self.mcp_server.execute_tool(tool_name, arguments).await {
            Ok(result) => {
                let text = match result.as_str() {
                    Some(s) => s.to_string(),
                    None => result.to_string(),
                };
                Response::success(id, json!({
                    "content": [
                        {
                            "type": "text",
                            "text": text
                        }
                    ]
                }))
            }
            Err(e) => Response::error(id, error_codes::TOOL_ERROR, e.to_string()),
        }
    }
}
