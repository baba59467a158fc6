//! Count-based summary statistics over the most recent readings.

use serde::{Deserialize, Serialize};

use super::classify::classify;
use super::types::{ClassificationMode, SeverityTier};
use crate::models::Reading;

/// Readings in the "weekly" window. Count-based, not calendar-based.
pub const WEEKLY_WINDOW: usize = 7;

/// Named dashboard windows, each a count of most recent readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Week,
    Month,
    Quarter,
}

impl Period {
    pub fn window(self) -> usize {
        match self {
            Self::Week => WEEKLY_WINDOW,
            Self::Month => 30,
            Self::Quarter => 90,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            other => Err(format!("unknown period: {other}")),
        }
    }
}

/// Aggregate over `count` readings. Means are truncated toward zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadingStats {
    pub count: usize,
    pub avg_systolic: i32,
    pub avg_diastolic: i32,
    pub avg_pulse: i32,
    pub min_systolic: i32,
    pub max_systolic: i32,
    pub min_diastolic: i32,
    pub max_diastolic: i32,
}

impl ReadingStats {
    /// Tier of the averaged reading.
    pub fn tier(&self, mode: ClassificationMode) -> SeverityTier {
        classify(self.avg_systolic, self.avg_diastolic, mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregateResult {
    /// No readings at all (or an empty window).
    InsufficientData,
    /// A single reading: present, but too few to average.
    Sparse,
    Summary(ReadingStats),
}

impl AggregateResult {
    pub fn stats(&self) -> Option<&ReadingStats> {
        match self {
            Self::Summary(stats) => Some(stats),
            _ => None,
        }
    }

    pub fn has_readings(&self) -> bool {
        !matches!(self, Self::InsufficientData)
    }
}

/// Aggregate the first `min(window, len)` readings of a newest-first list.
pub fn aggregate(readings: &[Reading], window: usize) -> AggregateResult {
    if readings.is_empty() || window == 0 {
        return AggregateResult::InsufficientData;
    }
    if readings.len() < 2 {
        return AggregateResult::Sparse;
    }

    let sample = &readings[..window.min(readings.len())];
    let count = sample.len();

    let (mut sum_sys, mut sum_dia, mut sum_pulse) = (0i64, 0i64, 0i64);
    let (mut min_sys, mut max_sys) = (i32::MAX, i32::MIN);
    let (mut min_dia, mut max_dia) = (i32::MAX, i32::MIN);

    for r in sample {
        sum_sys += i64::from(r.systolic);
        sum_dia += i64::from(r.diastolic);
        sum_pulse += i64::from(r.pulse);
        min_sys = min_sys.min(r.systolic);
        max_sys = max_sys.max(r.systolic);
        min_dia = min_dia.min(r.diastolic);
        max_dia = max_dia.max(r.diastolic);
    }

    let n = count as i64;
    AggregateResult::Summary(ReadingStats {
        count,
        avg_systolic: (sum_sys / n) as i32,
        avg_diastolic: (sum_dia / n) as i32,
        avg_pulse: (sum_pulse / n) as i32,
        min_systolic: min_sys,
        max_systolic: max_sys,
        min_diastolic: min_dia,
        max_diastolic: max_dia,
    })
}

/// The dashboard's weekly average (last seven readings).
pub fn weekly_average(readings: &[Reading]) -> AggregateResult {
    aggregate(readings, WEEKLY_WINDOW)
}
