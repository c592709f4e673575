//! Embedding providers: text batch in, vector batch out.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL_ID: &str = "text-embedding-3-small";
pub const MODEL_ENV_VAR: &str = "LINESIFT_MODEL";
pub const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "OPENAI_BASE_URL";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

const HTTP_TIMEOUT_SECS: u64 = 60;

/// Resolve the embedding model ID from an explicit value, the
/// `LINESIFT_MODEL` environment variable, or the built-in default.
pub fn resolve_model_id(explicit: Option<&str>) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(MODEL_ENV_VAR).ok())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL_ID.to_string())
}

/// Turns texts into fixed-dimension vectors.
///
/// Implementations return exactly one vector per input, in input order.
/// Any failure aborts the whole batch; callers do not retry.
pub trait EmbeddingProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> Result<Vec<Vec<f32>>>;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for &P {
    fn embed(&self, texts: &[String], model_id: &str) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts, model_id)
    }
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiProvider {
    /// Build a provider from `OPENAI_API_KEY` and, optionally,
    /// `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(API_KEY_ENV_VAR).ok(),
            std::env::var(BASE_URL_ENV_VAR).ok(),
        )
    }

    fn from_vars(
        api_key: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(Error::MissingCredentials { var: API_KEY_ENV_VAR })?;
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(api_key, base_url)
    }

    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .user_agent(concat!("linesift/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self::with_client(client, api_key, base_url))
    }

    /// Use a preconfigured HTTP client, e.g. one with custom proxy or TLS
    /// settings.
    pub fn with_client(
        client: reqwest::blocking::Client,
        api_key: String,
        base_url: String,
    ) -> Self {
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl EmbeddingProvider for OpenAiProvider {
    fn embed(&self, texts: &[String], model_id: &str) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!(count = texts.len(), model = model_id, "requesting embeddings");

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: model_id,
                input: texts,
            })
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(Error::Provider {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: EmbeddingResponse = serde_json::from_str(&body)?;
        into_ordered_vectors(parsed, texts.len(), status.as_u16())
    }
}

/// Prefer the `error.message` field of an OpenAI-style error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

fn into_ordered_vectors(
    response: EmbeddingResponse,
    expected: usize,
    status: u16,
) -> Result<Vec<Vec<f32>>> {
    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in response.data {
        let slot = slots.get_mut(item.index).ok_or_else(|| Error::Provider {
            status,
            message: format!(
                "embedding index {} out of range for {expected} inputs",
                item.index
            ),
        })?;
        *slot = Some(item.embedding);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| Error::Provider {
                status,
                message: format!("no embedding returned for input {i}"),
            })
        })
        .collect()
}
