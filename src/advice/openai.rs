use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::AiAdvisor;
use super::AdvisorError;
use crate::config::EngineConfig;

/// Environment variable holding the OpenAI API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Chat-completions client for the OpenAI API.
pub struct OpenAiClient {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiClient {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        connect_timeout_secs: u64,
        timeout_secs: u64,
    ) -> Result<Self, AdvisorError> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| AdvisorError::HttpClient(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty() && k != "null"),
            client,
            timeout_secs,
        })
    }

    /// Client from engine settings, key taken from `OPENAI_API_KEY`.
    pub fn from_config(config: &EngineConfig) -> Result<Self, AdvisorError> {
        Self::new(
            &config.advisor_endpoint,
            &config.advisor_model,
            std::env::var(API_KEY_ENV).ok(),
            config.connect_timeout_secs,
            config.request_timeout_secs,
        )
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl AiAdvisor for OpenAiClient {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisorError> {
        let api_key = self.api_key.as_deref().ok_or(AdvisorError::MissingApiKey)?;

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    AdvisorError::Connection(self.endpoint.clone())
                } else if e.is_timeout() {
                    AdvisorError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    AdvisorError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().unwrap_or_default();
            let body = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|b| b.error.message)
                .unwrap_or(raw);
            tracing::warn!(status = status.as_u16(), "Advice service rejected request");
            return Err(AdvisorError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| AdvisorError::ResponseParsing(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .map(|m| m.content.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(AdvisorError::EmptyResponse)
    }
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------

/// Scripted advisor for tests and offline runs.
pub struct MockAiAdvisor {
    response: Result<String, String>,
    delay: Duration,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl MockAiAdvisor {
    /// Always answers with `response`.
    pub fn new(response: &str) -> Self {
        Self {
            response: Ok(response.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    /// Always fails as if the service were unreachable.
    pub fn failing(reason: &str) -> Self {
        Self {
            response: Err(reason.to_string()),
            ..Self::new("")
        }
    }

    /// Sleep before answering, to keep a request in flight.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().ok().and_then(|p| p.clone())
    }
}

impl AiAdvisor for MockAiAdvisor {
    fn generate(&self, _system: &str, prompt: &str) -> Result<String, AdvisorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.response
            .clone()
            .map_err(AdvisorError::Connection)
    }
}
