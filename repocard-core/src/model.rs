//! Language-model access for scoring.

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::config::ModelConfig;
use crate::error::{RepoCardError, Result, ScoringError};

/// A text-in, text-out model endpoint.
#[cfg_attr(test, mockall::automock)]
pub trait ModelClient {
    /// Submit a prompt and return the raw response text (possibly empty).
    fn generate(&self, prompt: &str) -> std::result::Result<String, ScoringError>;
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    model: String,
    client: Client,
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
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiClient {
    /// Build a client; fails when no API key is configured.
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| RepoCardError::MissingCredential("GOOGLE_API_KEY".to_string()))?;
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            client,
        })
    }
}

impl ModelClient for GeminiClient {
    fn generate(&self, prompt: &str) -> std::result::Result<String, ScoringError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        debug!("POST {url} ({} prompt chars)", prompt.chars().count());
        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}]
        });
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|err| ScoringError::ModelUnavailable(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(ScoringError::ModelUnavailable(format!(
                "model api error ({status}): {body}"
            )));
        }
        let payload: GenerateResponse = response
            .json()
            .map_err(|err| ScoringError::ModelUnavailable(format!("decode failed: {err}")))?;
        Ok(first_candidate_text(payload))
    }
}

fn first_candidate_text(payload: GenerateResponse) -> String {
    payload
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}
