use chrono::{FixedOffset, Local, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::classify::classify;
use crate::config::EngineConfig;

// ---------------------------------------------------------------------------
// SeverityTier
// ---------------------------------------------------------------------------

/// Blood-pressure category, least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Optimal,
    Normal,
    Elevated,
    Stage1Hypertension,
    Stage2Hypertension,
    HypertensiveCrisis,
}

impl SeverityTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimal => "optimal",
            Self::Normal => "normal",
            Self::Elevated => "elevated",
            Self::Stage1Hypertension => "stage1_hypertension",
            Self::Stage2Hypertension => "stage2_hypertension",
            Self::HypertensiveCrisis => "hypertensive_crisis",
        }
    }

    /// Patient-facing label shown on the status badge.
    pub fn label(self) -> &'static str {
        match self {
            Self::Optimal => "Óptima",
            Self::Normal => "Normal",
            Self::Elevated => "Elevada",
            Self::Stage1Hypertension => "Hipertensión (Etapa 1)",
            Self::Stage2Hypertension => "Hipertensión (Etapa 2)",
            Self::HypertensiveCrisis => "Crisis Hipertensiva",
        }
    }
}

impl std::fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Order in which the classification rules are evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationMode {
    /// Most severe rule first, so crisis readings are recognised.
    #[default]
    Clinical,
    /// Historical rule order. The crisis rule sits behind stage 2 and never fires.
    Legacy,
}

impl std::str::FromStr for ClassificationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "clinical" => Ok(Self::Clinical),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown classification mode: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    RisingTrend,
    ConsistentlyHigh,
    HighVariability,
    MeasurementGap,
    InconsistentSchedule,
}

impl AlertKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RisingTrend => "rising_trend",
            Self::ConsistentlyHigh => "consistently_high",
            Self::HighVariability => "high_variability",
            Self::MeasurementGap => "measurement_gap",
            Self::InconsistentSchedule => "inconsistent_schedule",
        }
    }

    /// Pattern kinds compete for the single trend slot; the others are reminders.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Self::RisingTrend | Self::ConsistentlyHigh | Self::HighVariability
        )
    }
}

/// A derived observation about the reading history. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub priority: Priority,
    /// Notification title.
    pub title: String,
    /// Patient-facing message.
    pub message: String,
    /// Whole days since the last reading (MeasurementGap only).
    pub days_since_last: Option<i64>,
}

// ---------------------------------------------------------------------------
// AnalysisContext
// ---------------------------------------------------------------------------

/// Explicit per-call context for the analytics and the advice cache.
///
/// Carries what would otherwise be ambient state: whose data this is,
/// what "now" is, which clock offset hours are read in, and feature flags.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub owner_id: String,
    /// Milliseconds since the Unix epoch.
    pub now_ms: i64,
    pub utc_offset: FixedOffset,
    pub mode: ClassificationMode,
    pub smart_analysis_enabled: bool,
}

impl AnalysisContext {
    /// Context for `owner_id` at the current instant in the local offset.
    pub fn new(owner_id: &str) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            now_ms: Utc::now().timestamp_millis(),
            utc_offset: Local::now().offset().fix(),
            mode: ClassificationMode::default(),
            smart_analysis_enabled: true,
        }
    }

    /// Context for `owner_id` now, with mode and flags from engine settings.
    pub fn from_config(owner_id: &str, config: &EngineConfig) -> Self {
        Self::new(owner_id)
            .with_mode(config.classification_mode)
            .with_smart_analysis(config.smart_analysis_enabled)
    }

    /// Tier of a pair under this context's classification mode.
    pub fn classify(&self, systolic: i32, diastolic: i32) -> SeverityTier {
        classify(systolic, diastolic, self.mode)
    }

    pub fn at(mut self, now_ms: i64) -> Self {
        self.now_ms = now_ms;
        self
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.utc_offset = offset;
        self
    }

    pub fn with_mode(mut self, mode: ClassificationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_smart_analysis(mut self, enabled: bool) -> Self {
        self.smart_analysis_enabled = enabled;
        self
    }
}
