// Client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::digest::*;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize, Debug)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    pub response_mime_type: String,
    #[serde(rename = "responseSchema")]
    pub response_schema: JSValue,
}

#[derive(Deserialize, Debug)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Deserialize, Debug)]
pub struct Candidate {
    pub content: Option<Content>,
}

pub fn request_body(request: &AnalysisRequest) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: Some("user".to_string()),
            parts: vec![Part {
                text: Some(request.prompt.clone()),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: request.response_mime_type.clone(),
            response_schema: request.response_schema.clone(),
        },
    }
}

/// The text of the first candidate. Empty if there is none.
pub fn response_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|c| {
            c.parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<&str>>()
                .concat()
        })
        .unwrap_or_default()
}

pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(settings: &AnalysisSettings) -> DigestResult<GeminiClient> {
        let var = settings
            .api_key_env
            .clone()
            .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string());
        let api_key = match std::env::var(&var) {
            Ok(k) if !k.trim().is_empty() => k,
            _ => return MissingApiKeySnafu { var }.fail(),
        };
        let timeout = Duration::from_secs(settings.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(HttpClientSnafu {})?;
        let endpoint = settings
            .endpoint
            .clone()
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        debug!("GeminiClient: endpoint {:?} timeout {:?}", endpoint, timeout);
        Ok(GeminiClient {
            client,
            endpoint,
            api_key,
        })
    }

    fn url(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            model
        )
    }
}

fn unavailable(e: reqwest::Error) -> CapabilityError {
    CapabilityError::Unavailable {
        message: e.to_string(),
    }
}

/// The failure for a response with an error status, with its body when it can be read.
fn http_failure(status: StatusCode, body: reqwest::Result<String>) -> CapabilityError {
    let message = match body {
        Ok(body) => format!("HTTP {}: {}", status, body),
        Err(e) => format!("HTTP {} (error reading the body: {})", status, e),
    };
    CapabilityError::Unavailable { message }
}

impl AnalysisCapability for GeminiClient {
    fn generate(
        &self,
        request: &AnalysisRequest,
        cancel: &CancelHandle,
    ) -> Result<String, CapabilityError> {
        if cancel.is_cancelled() {
            return Err(CapabilityError::Cancelled {});
        }
        info!(
            "generate: sending request {} to model {:?}",
            request.fingerprint, request.model
        );
        let resp = self
            .client
            .post(self.url(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .map_err(unavailable)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(http_failure(status, resp.text()));
        }
        let parsed: GenerateContentResponse = resp.json().map_err(unavailable)?;
        let text = response_text(&parsed);
        debug!("generate: received {:?} bytes", text.len());
        Ok(text)
    }
}
