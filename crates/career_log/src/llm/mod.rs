use std::env;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::warn;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Per-call sampling options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub system: Option<String>,
    pub temperature: f32,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            system: None,
            temperature: 1.0,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> anyhow::Result<String>;
    fn identity(&self) -> LlmIdentity;
}

#[derive(Debug, Clone)]
pub struct LlmIdentity {
    pub provider: &'static str,
    pub model: Option<String>,
}

impl LlmIdentity {
    pub fn new(provider: &'static str, model: Option<String>) -> Self {
        Self { provider, model }
    }
}

/// Offline provider. Answers report prompts with a fixed skeleton so the
/// service can run end to end without credentials.
#[derive(Debug, Default)]
pub struct LocalStubClient;

pub const STUB_REPORT_MARKER: &str = "Here are the logs:";

#[async_trait]
impl LlmClient for LocalStubClient {
    async fn complete(&self, prompt: &str, _options: &CompletionOptions) -> anyhow::Result<String> {
        if !prompt.contains(STUB_REPORT_MARKER) {
            anyhow::bail!("stub LLM only supports report prompts");
        }

        let entries = prompt.matches("# Daily Log:").count();
        Ok(format!(
            "# Career Development Report\n\n_Generated offline from {entries} log entries._\n\n\
             ## STAR Story Seeds\n\n- **Situation:** (stub)\n- **Task:** (stub)\n- **Action:** (stub)\n- **Result:** [Add specific metric or impact here.]\n\n\
             ## Room for Improvement\n\n- (stub)\n\n\
             ## Learning Plan for Next Month\n\n1. (stub)\n"
        ))
    }

    fn identity(&self) -> LlmIdentity {
        LlmIdentity::new("local_stub", Some("local_stub".to_string()))
    }
}

/// Chat-completions client. No timeout or retry: a hanging upstream call
/// holds the request open.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: Client,
    model: String,
    api_key: Option<String>,
    api_key_env: String,
    base_url: String,
    organization: Option<String>,
}

impl OpenAiClient {
    /// Reads the key once at startup. A missing key is tolerated here and
    /// surfaces as an error on the first completion.
    pub fn from_env(
        api_key_env: &str,
        model: &str,
        base_url: Option<String>,
        organization: Option<String>,
    ) -> anyhow::Result<Self> {
        let api_key = env::var(api_key_env).ok();
        if api_key.is_none() {
            warn!(env = api_key_env, "OpenAI api key not set; report generation will fail");
        }
        let mut client = Self::new(api_key, model, base_url, organization)?;
        client.api_key_env = api_key_env.to_string();
        Ok(client)
    }

    pub fn new(
        api_key: Option<String>,
        model: &str,
        base_url: Option<String>,
        organization: Option<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().build()?;
        let normalized_base = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            http: client,
            model: model.to_string(),
            api_key,
            api_key_env: "OPENAI_API_KEY".to_string(),
            base_url: normalized_base,
            organization,
        })
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, prompt: &str, options: &CompletionOptions) -> anyhow::Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("missing OpenAI api key ({})", self.api_key_env))?;

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.http.post(url).bearer_auth(api_key).json(&json!({
            "model": self.model,
            "temperature": options.temperature,
            "messages": messages,
        }));

        if let Some(org) = &self.organization {
            request = request.header("OpenAI-Organization", org);
        }

        let response = request
            .send()
            .await
            .with_context(|| "sending request to OpenAI")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "OpenAI returned {status}: {}",
                upstream_error_message(&body)
            ));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .with_context(|| "parsing OpenAI response body")?;

        payload
            .get("choices")
            .and_then(|choices| choices.as_array())
            .and_then(|choices| choices.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .map(|content| content.to_string())
            .ok_or_else(|| anyhow!("missing message content in OpenAI response"))
    }

    fn identity(&self) -> LlmIdentity {
        LlmIdentity::new("openai", Some(self.model.clone()))
    }
}

/// Prefers `error.message` from an OpenAI error body, else the raw body.
fn upstream_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.get("message"))
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
