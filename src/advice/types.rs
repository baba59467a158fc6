use serde::{Deserialize, Serialize};

use super::sentinel::is_stale;
use super::AdvisorError;
use crate::analytics::AnalysisContext;
use crate::models::UserProfile;

/// Remote text generator. Blocking; the cache calls it off the async runtime.
pub trait AiAdvisor: Send + Sync {
    fn generate(&self, system: &str, prompt: &str) -> Result<String, AdvisorError>;
}

/// Whether a reading's cached advice can be shown as is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum RecommendationState {
    Fresh(String),
    Stale,
}

impl RecommendationState {
    pub fn from_cached(text: Option<&str>) -> Self {
        match text {
            Some(t) if !is_stale(Some(t)) => Self::Fresh(t.to_string()),
            _ => Self::Stale,
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }
}

/// Per-call context for advice generation.
#[derive(Debug, Clone)]
pub struct AdviceContext {
    pub analysis: AnalysisContext,
    /// Profile for personal prompts. Without one, the recent-readings prompt is used.
    pub profile: Option<UserProfile>,
}

impl AdviceContext {
    pub fn new(analysis: AnalysisContext) -> Self {
        Self {
            analysis,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn owner_id(&self) -> &str {
        &self.analysis.owner_id
    }
}
