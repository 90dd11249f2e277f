pub mod prompt_templates;
pub mod vision;

pub use vision::{MediaPayload, VisionApi, VisionClient};
