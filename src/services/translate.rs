use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// MyMemory translation endpoint.
pub const BASE_URL: &str = "https://api.mymemory.translated.net/get";

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("service returned HTTP {0}")]
    Status(StatusCode),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid JSON in response body")]
    MalformedBody,
    #[error("response is missing responseData.translatedText")]
    MissingTranslation,
}

/// Translation backend seam. The controller only sees this trait, so tests
/// can script responses without a network.
pub trait TranslationService {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError>;
}

pub struct MyMemoryClient {
    client: Client,
    base_url: String,
}

impl MyMemoryClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Points the client at a different endpoint. Used by tests to talk to
    /// a local server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        MyMemoryClient {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl TranslationService for MyMemoryClient {
    fn translate(&self, text: &str, source: &str, target: &str) -> Result<String, TranslateError> {
        let langpair = format!("{source}|{target}");

        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("q", text), ("langpair", langpair.as_str())])
            .send()?;

        let status = resp.status();
        // Read the body before the status check so error payloads still
        // reach the diagnostic log.
        let body = resp.text()?;

        if !status.is_success() {
            debug!(status = %status, body = %snippet(&body), "translation service error");
            return Err(TranslateError::Status(status));
        }

        let v: Value = serde_json::from_str(&body).map_err(|_| TranslateError::MalformedBody)?;

        match v
            .get("responseData")
            .and_then(|d| d.get("translatedText"))
            .and_then(|t| t.as_str())
        {
            // Any non-empty string passes through; whitespace-only results
            // are silenced later by the speak guard, matching the service's
            // observable contract.
            Some(t) if !t.is_empty() => Ok(t.to_string()),
            _ => Err(TranslateError::MissingTranslation),
        }
    }
}

fn snippet(body: &str) -> &str {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(200) {
        Some((i, _)) => &trimmed[..i],
        None => trimmed,
    }
}
