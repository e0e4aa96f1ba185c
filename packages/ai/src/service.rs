// ABOUTME: Gemini client producing short insights about a resource configuration
// ABOUTME: Uses its own API key header and never goes through the bearer-token wrapper

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::insights::{
    build_prompt, fallback_insights, parse_insights, unparsed_insights, SummaryTarget,
};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

#[derive(Debug, Error)]
pub enum AIServiceError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Invalid response format")]
    InvalidResponse,
}

pub type AIServiceResult<T> = Result<T, AIServiceError>;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

/// Where the insights in a [`Summary`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    Generated,
    /// Generation succeeded but had no numbered lines
    Unparsed,
    /// Generation failed; advice derived from the configuration
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub insights: Vec<String>,
    pub source: SummarySource,
}

pub struct SummaryService {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl SummaryService {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> AIServiceResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let model = model.into();
        if api_key.is_none() {
            info!("GEMINI_API_KEY not set - summaries will use offline advice");
        }
        if model != DEFAULT_MODEL {
            info!("Using custom Gemini model: {}", model);
        }

        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    /// Point at a different API host (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send `prompt` to Gemini and return the concatenated text parts
    pub async fn generate(&self, prompt: &str) -> AIServiceResult<String> {
        let api_key = self.api_key.as_ref().ok_or(AIServiceError::NoApiKey)?;
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        info!("Making Gemini API request: model={}", self.model);
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                AIServiceError::RequestFailed(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Gemini API error: {} - {}", status, error_text);
            return Err(AIServiceError::ApiError(format!(
                "API returned {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AIServiceError::ParseError(e.to_string()))?;

        let text: String = body
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .ok_or(AIServiceError::InvalidResponse)?
            .parts
            .into_iter()
            .filter_map(|part| part.text)
            .collect();

        debug!("Gemini response: {}", text);
        Ok(text)
    }

    /// Insights for `details`; never fails, falling back to offline advice
    pub async fn summarize(&self, target: SummaryTarget, details: &Value) -> Summary {
        let prompt = build_prompt(target, details);

        match self.generate(&prompt).await {
            Ok(text) => {
                let insights = parse_insights(&text);
                if insights.is_empty() {
                    warn!("Gemini response had no numbered insights; using raw text");
                    Summary {
                        insights: unparsed_insights(&text, target, details),
                        source: SummarySource::Unparsed,
                    }
                } else {
                    Summary {
                        insights,
                        source: SummarySource::Generated,
                    }
                }
            }
            Err(e) => {
                error!("Summary generation failed: {}", e);
                Summary {
                    insights: fallback_insights(target, details),
                    source: SummarySource::Fallback,
                }
            }
        }
    }
}
