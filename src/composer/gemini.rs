//! Gemini composition model
//!
//! Sends the analysis prompt to Google's Generative Language API and returns
//! the text of the first candidate.

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::composer::model::{
    build_prompt, ComposerInfo, CompositionModel, CompositionRequest, CompositionSuggestion,
};
use crate::config::ComposerConfig;
use crate::error::{BgmError, Result};

/// `generateContent` request body
#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

/// `generateContent` response body
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GenerateRequest {
    fn from_prompt(prompt: String) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part { text: Some(prompt) }],
            }],
        }
    }
}

impl GenerateResponse {
    /// Joined text parts of the first candidate
    fn into_text(self) -> Result<String> {
        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| BgmError::ComposerError {
                reason: "response contained no candidates".to_string(),
            })?;

        let finish_reason = candidate.finish_reason.clone();
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(BgmError::ComposerError {
                reason: format!(
                    "candidate had no text (finish reason: {})",
                    finish_reason.as_deref().unwrap_or("unknown")
                ),
            });
        }
        Ok(text)
    }
}

/// Cloud model backed by Gemini
pub struct GeminiModel {
    info: ComposerInfo,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout_ms: u64,
}

impl GeminiModel {
    pub fn new(config: &ComposerConfig) -> Self {
        Self {
            info: ComposerInfo {
                id: format!("gemini/{}", config.model),
                name: "Google Gemini".to_string(),
                description: "Composition ideas from the Gemini language model".to_string(),
                remote: true,
            },
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| BgmError::MissingApiKey {
                model: self.info.id.clone(),
            })
    }

    #[cfg(feature = "gemini")]
    fn send_request(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let api_key = self.api_key()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_millis(self.timeout_ms))
            .build()
            .map_err(|e| BgmError::ComposerUnavailable {
                reason: e.to_string(),
            })?;

        let url = self.endpoint();
        tracing::debug!(url = %url, "Requesting composition suggestions");

        let response = client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    BgmError::ComposerTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else if e.is_connect() {
                    BgmError::ComposerUnavailable {
                        reason: format!("Cannot connect to {}: {}", self.base_url, e),
                    }
                } else {
                    BgmError::ComposerError {
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(BgmError::ComposerError {
                reason: format!("{} returned {}: {}", self.info.id, status, body.trim()),
            });
        }

        response
            .json::<GenerateResponse>()
            .map_err(|e| BgmError::ComposerError {
                reason: format!("Invalid response from {}: {}", self.info.id, e),
            })
    }

    #[cfg(not(feature = "gemini"))]
    fn send_request(&self, _request: &GenerateRequest) -> Result<GenerateResponse> {
        self.api_key()?;
        Err(BgmError::ComposerUnavailable {
            reason: "Gemini support not compiled. Build with --features gemini".to_string(),
        })
    }
}

impl CompositionModel for GeminiModel {
    fn info(&self) -> &ComposerInfo {
        &self.info
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "gemini") && self.api_key.is_some()
    }

    fn suggest(&self, request: &CompositionRequest) -> Result<CompositionSuggestion> {
        request.validate()?;
        let start = Instant::now();

        let body = GenerateRequest::from_prompt(build_prompt(request));
        let text = self.send_request(&body)?.into_text()?;

        Ok(CompositionSuggestion {
            text,
            model_id: self.info.id.clone(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}
