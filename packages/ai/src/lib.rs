// ABOUTME: Generative summaries of resource configurations
// ABOUTME: Gemini client, prompt builder and insight parsing with offline fallbacks

pub mod insights;
pub mod service;

pub use insights::{
    build_prompt, fallback_insights, parse_insights, SummaryTarget, MAX_INSIGHTS,
};
pub use service::{AIServiceError, AIServiceResult, Summary, SummaryService, SummarySource};
