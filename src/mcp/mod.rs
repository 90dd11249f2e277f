use serde::{Serialize, Deserialize};
use serde_json::Value;

/// JSON-RPC 版本号
pub const JSONRPC_VERSION: &str = "2.0";

/// MCP 协议版本
pub const MCP_VERSION: &str = "2024-11-05";

/// 服务器名称
pub const SERVER_NAME: &str = "Grape MCP Design";

/// 服务器版本
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn default_params() -> Value {
    serde_json::json!({})
}

/// MCP 请求
///
/// `id` 是不透明的，原样回显；缺失时按 null 处理（通知也会收到 null id 的响应）。
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// 请求 ID
    #[serde(default)]
    pub id: Value,
    /// 请求的方法
    pub method: String,
    /// 请求参数，缺省为空对象
    #[serde(default = "default_params")]
    pub params: Value,
}

/// MCP 响应
///
/// result 与 error 互斥，由构造函数保证恰好存在其一。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// JSON-RPC 版本号
    pub jsonrpc: String,
    /// 请求 ID（原样回显）
    pub id: Value,
    /// 响应结果
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// 错误信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorResponse>,
}

/// MCP 错误响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误代码
    pub code: i32,
    /// 错误消息
    pub message: String,
}

/// MCP 初始化结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    /// 协议版本号
    pub protocol_version: String,
    /// 服务器支持的能力
    pub capabilities: Value,
    /// 服务器信息
    pub server_info: ServerInfo,
}

/// 服务器标识信息
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl InitializeResult {
    /// 构建静态的初始化元数据
    pub fn current() -> Self {
        Self {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: serde_json::json!({
                "tools": {},
                "logging": {},
                "prompts": {},
                "resources": {}
            }),
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        }
    }
}

impl Response {
    /// 创建一个成功响应
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// 创建一个错误响应
    pub fn error(id: Value, code: i32, message: String) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(ErrorResponse { code, message }),
        }
    }
}

// 错误代码定义
pub mod error_codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;

    /// 通用工具错误（未知工具、校验失败、网络与下游API错误统一归入此码）
    pub const TOOL_ERROR: i32 = -32000;
}


pub mod server;

pub use server::{MCPServer, Server};
