use thiserror::Error;
use anyhow;

pub type Result<T> = anyhow::Result<T>;

#[derive(Error, Debug)]
pub enum MCPError {
    #[error("参数无效: {0}")]
    InvalidParameter(String),

    #[error("工具不存在: {0}")]
    ToolNotFound(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("网络错误: {0}")]
    NetworkError(String),

    #[error("内容类型不匹配: {0}")]
    ContentTypeMismatch(String),

    #[error("视觉模型调用失败: {0}")]
    VisionApiError(String),

    #[error("评分卡渲染失败: {0}")]
    RenderError(String),

    #[error("图床上传失败: {0}")]
    UploadError(String),
}

impl MCPError {
    pub fn error_code(&self) -> &'static str {
        match self {
            MCPError::InvalidParameter(_) => "INVALID_PARAMETER",
            MCPError::ToolNotFound(_) => "TOOL_NOT_FOUND",
            MCPError::ConfigError(_) => "CONFIG_ERROR",
            MCPError::NetworkError(_) => "NETWORK_ERROR",
            MCPError::ContentTypeMismatch(_) => "CONTENT_TYPE_MISMATCH",
            MCPError::VisionApiError(_) => "VISION_API_ERROR",
            MCPError::RenderError(_) => "RENDER_ERROR",
            MCPError::UploadError(_) => "UPLOAD_ERROR",
        }
    }

    pub fn suggestion(&self) -> &'static str {
        match self {
            MCPError::InvalidParameter(_) => "请检查参数格式并确保所有必需参数都已提供",
            MCPError::ToolNotFound(_) => "请通过 tools/list 查看已注册的工具名称",
            MCPError::ConfigError(_) => "请检查环境变量中的 API 密钥配置",
            MCPError::NetworkError(_) => "请检查网络连接和目标 URL 是否可访问，或稍后重试",
            MCPError::ContentTypeMismatch(_) => "请确认 URL 指向工具期望的文件类型（图片或 PDF）",
            MCPError::VisionApiError(_) => "请稍后重试，如果问题持续存在请检查模型服务状态",
            MCPError::RenderError(_) => "评分卡渲染失败不影响分析结果，可忽略",
            MCPError::UploadError(_) => "图床上传失败不影响分析结果，可忽略",
        }
    }

    /// 检查错误是否可恢复（重试可能成功）
    pub fn is_recoverable(&self) -> bool {
        match self {
            MCPError::NetworkError(_)
            | MCPError::VisionApiError(_)
            | MCPError::UploadError(_) => true,
            _ => false,
        }
    }
}
