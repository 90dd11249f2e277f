use std::env;
use std::path::PathBuf;
use crate::errors::MCPError;

/// 视觉分析服务配置
///
/// 配置在进程启动时读取一次，之后以显式参数的形式注入到各个工具中，
/// 执行路径上不再访问进程环境变量。
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API基础URL
    pub api_base: String,
    /// API密钥（缺失时不终止进程，在工具调用时返回带内错误）
    pub api_key: Option<String>,
    /// 视觉模型名称
    pub model: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 评分卡输出目录（None 表示禁用评分卡副作用）
    pub scorecard_dir: Option<PathBuf>,
    /// 图床上传密钥（None 表示不上传）
    pub upload_key: Option<String>,
    /// 图床上传端点
    pub upload_endpoint: String,
}

impl Default for VisionConfig {
    fn default() -> Self {
        // 加载环境变量
        dotenv::dotenv().ok();

        Self {
            api_base: env::var("VISION_API_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            model: env::var("VISION_MODEL_NAME")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            timeout_secs: env::var("VISION_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse().unwrap_or(30),
            scorecard_dir: match env::var("SCORECARD_DIR") {
                Ok(dir) if dir.trim().is_empty() => None,
                Ok(dir) => Some(PathBuf::from(dir)),
                Err(_) => Some(PathBuf::from(".mcp_scorecards")),
            },
            upload_key: env::var("IMGBB_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            upload_endpoint: env::var("IMGBB_UPLOAD_URL")
                .unwrap_or_else(|_| "https://api.imgbb.com/1/upload".to_string()),
        }
    }
}

impl VisionConfig {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// 获取API密钥，缺失时返回描述性错误
    pub fn require_api_key(&self) -> Result<&str, MCPError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| MCPError::ConfigError(
                "未找到 OPENAI_API_KEY 环境变量，请在环境或 .env 文件中配置".to_string(),
            ))
    }
}

#[cfg(test)]
impl VisionConfig {
    /// 测试专用配置：不读环境变量，不产生副作用
    pub fn for_tests(api_key: Option<&str>) -> Self {
        Self {
            api_base: "https://api.example.com/v1".to_string(),
            api_key: api_key.map(|k| k.to_string()),
            model: "gpt-4o".to_string(),
            timeout_secs: 30,
            scorecard_dir: None,
            upload_key: None,
            upload_endpoint: "https://api.imgbb.com/1/upload".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key_is_in_band_error() {
        let config = VisionConfig::for_tests(None);
        let err = config.require_api_key().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_present_api_key() {
        let config = VisionConfig::for_tests(Some("sk-test"));
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
