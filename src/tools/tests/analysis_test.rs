// 分析工具测试：校验顺序、内容类型强制、策略重试耗尽
use std::sync::Arc;
use serde_json::json;

use crate::config::VisionConfig;
use crate::errors::MCPError;
use crate::tools::analysis::AnalysisTool;
use crate::tools::base::MCPTool;
use crate::tools::fetch::Download;
use crate::tools::strategies::PDF_FETCH_STRATEGIES;
use super::spies::{image_download, pdf_download, ScriptedFetcher, StubVision};

const SCORED_REPLY: &str = "\
1. **Visual Harmony**: 8/10 - balanced palette\n\
2. **Clarity**: 7/10 - readable hierarchy\n\
3. **User Friendliness**: 9/10\n\
4. **Interactivity**: 6/10\n\
5. **Creativity**: 8/10\n\
Overall: 7.6/10";

fn design_tool(fetcher: Arc<ScriptedFetcher>, vision: Arc<StubVision>) -> AnalysisTool {
    AnalysisTool::design_with_backends(
        VisionConfig::for_tests(Some("sk-test")),
        fetcher,
        vision,
    )
}

fn presentation_tool(fetcher: Arc<ScriptedFetcher>, vision: Arc<StubVision>) -> AnalysisTool {
    AnalysisTool::presentation_with_backends(
        VisionConfig::for_tests(Some("sk-test")),
        fetcher,
        vision,
    )
}

#[tokio::test]
async fn test_blank_url_rejected_before_any_network_call() {
    let fetcher = Arc::new(ScriptedFetcher::always(image_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    for blank in ["", "   ", "@", " @@ "] {
        let err = tool.execute(json!({"url": blank})).await.unwrap_err();
        assert!(err.to_string().contains("url 参数不能为空"), "输入: {:?}", blank);
    }

    assert_eq!(fetcher.call_count(), 0);
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn test_at_sentinel_and_whitespace_stripped() {
    let fetcher = Arc::new(ScriptedFetcher::always(image_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let result = tool.execute(json!({"url": "@https://example.com/x.png "})).await.unwrap();
    let text = result.as_str().unwrap();
    // 格式化输出引用的是清理后的 URL
    assert!(text.contains("📎 来源: https://example.com/x.png"));
    assert!(!text.contains("@https://"));
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(vision.call_count(), 1);
}

#[tokio::test]
async fn test_bad_scheme_rejected() {
    let fetcher = Arc::new(ScriptedFetcher::always(image_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let err = tool.execute(json!({"url": "ftp://example.com/x.png"})).await.unwrap_err();
    assert!(err.to_string().contains("http://"));
    assert_eq!(fetcher.call_count(), 0);
}

#[tokio::test]
async fn test_missing_credential_is_in_band_error_before_download() {
    let fetcher = Arc::new(ScriptedFetcher::always(image_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = AnalysisTool::design_with_backends(
        VisionConfig::for_tests(None),
        fetcher.clone(),
        vision.clone(),
    );

    let err = tool.execute(json!({"url": "https://example.com/x.png"})).await.unwrap_err();
    assert!(err.to_string().contains("OPENAI_API_KEY"));
    assert_eq!(fetcher.call_count(), 0);
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn test_content_type_mismatch_skips_vision_call() {
    let html = Download {
        status: 200,
        content_type: "text/html; charset=utf-8".to_string(),
        bytes: vec![0u8; 2048],
    };
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(html)]));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let err = tool.execute(json!({"url": "https://example.com/page"})).await.unwrap_err();
    assert!(err.to_string().contains("text/html"));
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn test_design_formats_analysis_with_attribution() {
    let fetcher = Arc::new(ScriptedFetcher::always(image_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(fetcher, Arc::clone(&vision));

    let result = tool.execute(json!({"url": "https://example.com/x.png"})).await.unwrap();
    let text = result.as_str().unwrap();
    assert!(text.starts_with("🎨 **设计分析报告**"));
    assert!(text.contains("Visual Harmony"));
    assert!(text.contains("🤖 由 gpt-4o 分析"));
}

#[tokio::test]
async fn test_strategy_exhaustion_names_all_strategies_and_skips_vision() {
    // 所有请求（含会话预热）都返回 403 的小响应
    let forbidden = || Download {
        status: 403,
        content_type: "text/html".to_string(),
        bytes: vec![0u8; 64],
    };
    let responses: Vec<_> = (0..16).map(|_| Ok(forbidden())).collect();
    let fetcher = Arc::new(ScriptedFetcher::new(responses));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = presentation_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let err = tool.execute(json!({"url": "https://example.com/deck.pdf"})).await.unwrap_err();
    let message = err.to_string();
    for strategy in PDF_FETCH_STRATEGIES {
        assert!(message.contains(strategy.name), "聚合错误缺少策略: {}", strategy.name);
    }
    assert_eq!(vision.call_count(), 0);
}

#[tokio::test]
async fn test_presentation_succeeds_on_first_strategy() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(pdf_download())]));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = presentation_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let result = tool.execute(json!({
        "url": "https://example.com/deck.pdf",
        "analysis_type": "design"
    })).await.unwrap();
    let text = result.as_str().unwrap();
    assert!(text.starts_with("📊 **演示文稿分析报告**"));
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(vision.call_count(), 1);
}

#[tokio::test]
async fn test_pdf_too_small_retries_next_strategy() {
    let tiny = Download {
        status: 200,
        content_type: "application/pdf".to_string(),
        bytes: vec![0u8; 16],
    };
    let fetcher = Arc::new(ScriptedFetcher::new(vec![Ok(tiny), Ok(pdf_download())]));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = presentation_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let result = tool.execute(json!({"url": "https://example.com/deck.pdf"})).await;
    assert!(result.is_ok());
    assert_eq!(fetcher.call_count(), 2);
}

#[tokio::test]
async fn test_invalid_analysis_type_rejected_by_schema() {
    let fetcher = Arc::new(ScriptedFetcher::always(pdf_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = presentation_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let params = json!({"url": "https://example.com/deck.pdf", "analysis_type": "layout"});
    let err = tool.validate_params(&params).unwrap_err();
    assert!(err.to_string().contains("must be one of"));
}

#[tokio::test]
async fn test_google_slides_link_rewritten_before_fetch() {
    let fetcher = Arc::new(ScriptedFetcher::always(pdf_download()));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = presentation_tool(Arc::clone(&fetcher), vision);

    let result = tool.execute(json!({
        "url": "https://docs.google.com/presentation/d/DECK123/edit?usp=sharing"
    })).await.unwrap();
    // 实际抓取的是导出直链，来源展示的仍是用户给的原始（清理后）链接
    assert_eq!(
        fetcher.requested_urls()[0],
        "https://docs.google.com/presentation/d/DECK123/export/pdf"
    );
    assert!(result.as_str().unwrap().contains("docs.google.com/presentation/d/DECK123"));
}

#[tokio::test]
async fn test_network_error_wrapped_as_tool_error() {
    let fetcher = Arc::new(ScriptedFetcher::new(vec![
        Err(MCPError::NetworkError("connection refused".to_string()).into()),
    ]));
    let vision = Arc::new(StubVision::new(SCORED_REPLY));
    let tool = design_tool(Arc::clone(&fetcher), Arc::clone(&vision));

    let err = tool.execute(json!({"url": "https://example.com/x.png"})).await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
    assert_eq!(vision.call_count(), 0);
}
