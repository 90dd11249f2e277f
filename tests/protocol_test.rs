// 协议级集成测试：对完整的服务器分发路径逐行喂入请求并检查响应封包
use serde_json::{json, Value};

use grape_mcp_design::config::VisionConfig;
use grape_mcp_design::mcp::{error_codes, MCPServer, Server, MCP_VERSION};
use grape_mcp_design::tools::{AnalysisTool, ConvertGoogleLinkTool};

fn offline_config() -> VisionConfig {
    VisionConfig {
        api_base: "https://api.example.com/v1".to_string(),
        api_key: Some("sk-test".to_string()),
        model: "gpt-4o".to_string(),
        timeout_secs: 5,
        scorecard_dir: None,
        upload_key: None,
        upload_endpoint: "https://api.imgbb.com/1/upload".to_string(),
    }
}

async fn full_server() -> Server {
    let registry = MCPServer::new();
    let config = offline_config();
    registry
        .register_tool(Box::new(AnalysisTool::design(config.clone()).unwrap()))
        .await
        .unwrap();
    registry
        .register_tool(Box::new(AnalysisTool::presentation(config).unwrap()))
        .await
        .unwrap();
    registry
        .register_tool(Box::new(ConvertGoogleLinkTool::new()))
        .await
        .unwrap();
    Server::new(registry)
}

/// 响应恰好包含 result 或 error 之一，且回显请求 id
fn assert_envelope(wire: &Value, expected_id: &Value) {
    assert_eq!(wire["jsonrpc"], json!("2.0"));
    assert_eq!(&wire["id"], expected_id);
    let has_result = wire.get("result").is_some();
    let has_error = wire.get("error").is_some();
    assert!(has_result ^ has_error, "响应必须恰好包含 result 或 error 之一: {}", wire);
}

async fn roundtrip(server: &Server, line: &str) -> Value {
    let response = server.handle_line(line).await;
    serde_json::to_value(&response).unwrap()
}

#[tokio::test]
async fn test_initialize_roundtrip() {
    let server = full_server().await;
    let wire = roundtrip(
        &server,
        r#"{"jsonrpc":"2.0","id":"init-1","method":"initialize","params":{"protocolVersion":"2024-11-05","clientInfo":{"name":"test-client","version":"1.0.0"},"capabilities":{}}}"#,
    ).await;

    assert_envelope(&wire, &json!("init-1"));
    assert_eq!(wire["result"]["protocolVersion"], json!(MCP_VERSION));
    assert_eq!(wire["result"]["serverInfo"]["name"], json!("Grape MCP Design"));
}

#[tokio::test]
async fn test_tools_list_has_three_static_descriptors() {
    let server = full_server().await;
    let wire = roundtrip(&server, r#"{"id":7,"method":"tools/list","params":{}}"#).await;

    assert_envelope(&wire, &json!(7));
    let tools = wire["result"]["tools"].as_array().unwrap();
    let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["analyze_design", "analyze_presentation", "convert_google_link"]);
    for tool in tools {
        assert_eq!(tool["inputSchema"]["type"], json!("object"));
        assert!(tool["description"].as_str().unwrap().len() > 0);
    }
}

#[tokio::test]
async fn test_parse_error_is_32700_with_null_id() {
    let server = full_server().await;
    let wire = roundtrip(&server, "this is not json").await;

    assert_envelope(&wire, &Value::Null);
    assert_eq!(wire["error"]["code"], json!(error_codes::PARSE_ERROR));
}

#[tokio::test]
async fn test_unknown_method_is_32601() {
    let server = full_server().await;
    let wire = roundtrip(&server, r#"{"id":1,"method":"prompts/list","params":{}}"#).await;

    assert_envelope(&wire, &json!(1));
    assert_eq!(wire["error"]["code"], json!(error_codes::METHOD_NOT_FOUND));
}

#[tokio::test]
async fn test_unknown_tool_is_32000_naming_tool() {
    let server = full_server().await;
    let wire = roundtrip(
        &server,
        r#"{"id":"call-1","method":"tools/call","params":{"name":"analyze_logo","arguments":{}}}"#,
    ).await;

    assert_envelope(&wire, &json!("call-1"));
    assert_eq!(wire["error"]["code"], json!(error_codes::TOOL_ERROR));
    assert!(wire["error"]["message"].as_str().unwrap().contains("analyze_logo"));
}

#[tokio::test]
async fn test_blank_url_is_tool_error_envelope() {
    // 校验失败统一走错误对象，不伪装成功文本
    let server = full_server().await;
    let wire = roundtrip(
        &server,
        r#"{"id":9,"method":"tools/call","params":{"name":"analyze_design","arguments":{"url":"   "}}}"#,
    ).await;

    assert_envelope(&wire, &json!(9));
    assert_eq!(wire["error"]["code"], json!(error_codes::TOOL_ERROR));
    assert!(wire["error"]["message"].as_str().unwrap().contains("url"));
}

#[tokio::test]
async fn test_missing_url_argument_is_tool_error() {
    let server = full_server().await;
    let wire = roundtrip(
        &server,
        r#"{"id":10,"method":"tools/call","params":{"name":"analyze_design","arguments":{}}}"#,
    ).await;

    assert_envelope(&wire, &json!(10));
    assert_eq!(wire["error"]["code"], json!(error_codes::TOOL_ERROR));
}

#[tokio::test]
async fn test_convert_google_link_full_path() {
    let server = full_server().await;
    let wire = roundtrip(
        &server,
        r#"{"id":11,"method":"tools/call","params":{"name":"convert_google_link","arguments":{"url":"@https://drive.google.com/file/d/FILE99/view?usp=sharing"}}}"#,
    ).await;

    assert_envelope(&wire, &json!(11));
    let text = wire["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("google_drive"));
    assert!(text.contains("FILE99"));
}

#[tokio::test]
async fn test_request_without_id_echoes_null() {
    let server = full_server().await;
    let wire = roundtrip(&server, r#"{"method":"tools/list"}"#).await;

    assert_envelope(&wire, &Value::Null);
    assert!(wire["result"]["tools"].is_array());
}

#[tokio::test]
async fn test_numeric_id_echoed_verbatim() {
    let server = full_server().await;
    let wire = roundtrip(&server, r#"{"id":42,"method":"initialize"}"#).await;
    assert_envelope(&wire, &json!(42));
}
