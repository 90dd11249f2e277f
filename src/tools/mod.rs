pub mod analysis;
pub mod base;
pub mod fetch;
pub mod google_links;
pub mod scorecard;
pub mod strategies;

#[cfg(test)]
mod tests;

pub use analysis::AnalysisTool;
pub use base::{MCPTool, Schema, ToolAnnotations};
pub use fetch::{HttpFetcher, UrlFetcher};
pub use google_links::ConvertGoogleLinkTool;
