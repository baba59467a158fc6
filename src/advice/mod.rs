//! AI advice for readings: prompt building, the remote advisor client and
//! the per-reading recommendation cache.

pub mod cache;
pub mod openai;
pub mod prompt;
pub mod sentinel;
pub mod types;

pub use cache::RecommendationCache;
pub use openai::{MockAiAdvisor, OpenAiClient};
pub use sentinel::is_stale;
pub use types::{AdviceContext, AiAdvisor, RecommendationState};

use crate::db::DatabaseError;

/// Failures of the remote text generator.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("Advice service is not reachable at {0}")]
    Connection(String),

    #[error("Advice service returned error (status {status}): {body}")]
    Http { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("Advice service returned no usable answer")]
    EmptyResponse,

    #[error("No OpenAI API key configured")]
    MissingApiKey,
}

/// Outcome of a failed refresh. Cloned to every coalesced waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    /// Retry later; the cached text was left as it was.
    #[error("Advice unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Advice storage failed: {reason}")]
    Storage { reason: String },

    #[error("Refresh task failed: {reason}")]
    Task { reason: String },

    #[error("In-flight registry lock poisoned")]
    LockPoisoned,
}

impl From<AdvisorError> for RefreshError {
    fn from(e: AdvisorError) -> Self {
        Self::Unavailable {
            reason: e.to_string(),
        }
    }
}

impl From<DatabaseError> for RefreshError {
    fn from(e: DatabaseError) -> Self {
        Self::Storage {
            reason: e.to_string(),
        }
    }
}

impl From<PromptError> for RefreshError {
    fn from(e: PromptError) -> Self {
        Self::Unavailable {
            reason: e.to_string(),
        }
    }
}

/// Missing inputs for a prompt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("Select at least one reading to analyze")]
    NoReadings,

    #[error("Patient name is required for personal advice")]
    MissingName,
}
