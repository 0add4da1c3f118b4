use darshan_composer::TruthPackage;
use darshan_intent::Theme;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const ENV_AI_URL: &str = "DARSHAN_AI_URL";
const ENV_AI_KEY: &str = "DARSHAN_AI_KEY";
const ENV_AI_MODEL: &str = "DARSHAN_AI_MODEL";
const ENV_AI_TIMEOUT_MS: &str = "DARSHAN_AI_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

#[derive(Error, Debug)]
pub enum NarrativeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connector returned an empty narrative")]
    EmptyResponse,

    #[error("Malformed connector response: {0}")]
    Malformed(String),
}

/// Read-only view a connector receives. The package is already final;
/// whatever comes back is narration, never structure.
#[derive(Debug, Clone, Copy)]
pub struct NarrativeRequest<'a> {
    pub package: &'a TruthPackage,
    pub question: &'a str,
    pub theme: Theme,
}

/// Seam for external narrative generators.
#[async_trait::async_trait]
pub trait NarrativeConnector: Send + Sync {
    /// One attempt, no internal retries; the gateway owns the fallback.
    async fn expand(&self, request: &NarrativeRequest<'_>) -> Result<String, NarrativeError>;
}

#[derive(Debug, Deserialize)]
struct ConnectorResponse {
    text: String,
}

/// Connector posting to a JSON completion endpoint configured via env.
pub struct HttpConnector {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: Option<String>,
}

impl HttpConnector {
    /// Builds the connector from `DARSHAN_AI_URL` (+ optional key, model,
    /// timeout). Returns `None` when no URL is configured — absence of an
    /// AI backend is a supported configuration, not an error.
    pub fn from_env() -> Option<Self> {
        let url = std::env::var(ENV_AI_URL).ok().filter(|u| !u.is_empty())?;
        let timeout_ms = std::env::var(ENV_AI_TIMEOUT_MS)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .ok()?;
        Some(Self {
            client,
            url,
            api_key: std::env::var(ENV_AI_KEY).ok(),
            model: std::env::var(ENV_AI_MODEL).ok(),
        })
    }
}

/// Renders the finalized package as prompt context.
///
/// The prompt instructs the model to narrate around the fixed diagnosis and
/// remedy; enforcement does not depend on the model honoring it, because the
/// caller only ever uses the returned text as narration.
fn build_prompt(request: &NarrativeRequest<'_>) -> String {
    let package = request.package;
    let mut prompt = String::new();
    prompt.push_str("Expand the following reading into a warm narrative.\n");
    prompt.push_str("Do not change the diagnosis, the verse, or the practice.\n\n");
    prompt.push_str(&format!("Question: {}\n", request.question));
    prompt.push_str(&format!("Theme: {}\n", request.theme.as_str()));
    prompt.push_str(&format!("State: {}\n", package.state_key));
    prompt.push_str(&format!(
        "Verse ({}): {}\n",
        package.sacred_id, package.sacred.text
    ));
    prompt.push_str(&format!("Practice: {}\n", package.practice.title));
    prompt.push_str(&format!(
        "Contemplative question: {}\n",
        package.contemplative_question.text
    ));
    prompt
}

#[async_trait::async_trait]
impl NarrativeConnector for HttpConnector {
    async fn expand(&self, request: &NarrativeRequest<'_>) -> Result<String, NarrativeError> {
        let mut body = serde_json::json!({ "prompt": build_prompt(request) });
        if let Some(model) = &self.model {
            body["model"] = serde_json::Value::String(model.clone());
        }

        let mut http = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await?.error_for_status()?;
        let parsed: ConnectorResponse = response
            .json()
            .await
            .map_err(|e| NarrativeError::Malformed(e.to_string()))?;

        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(NarrativeError::EmptyResponse);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use darshan_composer::{ComposeOptions, Composer};

    #[test]
    fn prompt_carries_the_finalized_fields() {
        let composer = Composer::builtin().unwrap();
        let package = composer
            .compose(
                None,
                &ComposeOptions {
                    seed: Some(42),
                    now_ms: Some(0),
                    ..Default::default()
                },
            )
            .unwrap();
        let request = NarrativeRequest {
            package: &package,
            question: "o que me aguarda?",
            theme: Theme::General,
        };
        let prompt = build_prompt(&request);
        assert!(prompt.contains(&package.sacred_id));
        assert!(prompt.contains(&package.state_key));
        assert!(prompt.contains("o que me aguarda?"));
    }

    #[test]
    fn from_env_is_none_without_url() {
        // The variable is absent in the test environment.
        std::env::remove_var(ENV_AI_URL);
        assert!(HttpConnector::from_env().is_none());
    }
}
