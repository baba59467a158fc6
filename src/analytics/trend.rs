//! Pattern detection over the recent reading history.
//!
//! Pattern checks run in a fixed order over the five most recent readings
//! and share a single result slot: a later match replaces an earlier one,
//! so at most one pattern alert comes out of an analysis. Gap and schedule
//! checks are independent and may add one reminder each.

use super::classify::is_high_reading;
use super::messages::MessageTemplates;
use super::stats::aggregate;
use super::types::{Alert, AlertKind, AnalysisContext, Priority, SeverityTier};
use crate::models::{Reading, MILLIS_PER_DAY};

/// Minimum history before any analysis runs.
pub const MIN_READINGS_FOR_ANALYSIS: usize = 3;
/// Window inspected by the pattern checks.
pub const PATTERN_WINDOW: usize = 5;
/// Window inspected by the schedule check.
pub const SCHEDULE_WINDOW: usize = 7;

const RISING_SYSTOLIC_DELTA: i32 = 15;
const RISING_DIASTOLIC_DELTA: i32 = 10;
const CONSISTENTLY_HIGH_COUNT: usize = 3;
const VARIABILITY_SPREAD: i32 = 30;
const GAP_DAYS: i64 = 3;
const MORNING_HOURS: std::ops::RangeInclusive<u32> = 6..=10;
const EVENING_HOURS: std::ops::RangeInclusive<u32> = 18..=22;
const SCHEDULE_HABIT_COUNT: usize = 3;

type PatternCheck = fn(&[Reading]) -> Option<Alert>;

/// Evaluation order of the pattern checks. The last match wins.
const PATTERN_CHECKS: [PatternCheck; 3] = [
    check_rising_trend,
    check_consistently_high,
    check_high_variability,
];

/// Separated analysis result: the single pattern slot plus reminders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrendReport {
    /// Tier of the newest reading under the context's mode.
    pub latest_tier: Option<SeverityTier>,
    pub pattern: Option<Alert>,
    pub reminders: Vec<Alert>,
}

impl TrendReport {
    pub fn into_alerts(self) -> Vec<Alert> {
        self.pattern.into_iter().chain(self.reminders).collect()
    }

    pub fn needs_attention(&self) -> bool {
        self.pattern.is_some()
    }
}

/// Analyze a newest-first history.
pub fn analyze(readings: &[Reading], ctx: &AnalysisContext) -> Vec<Alert> {
    analyze_report(readings, ctx).into_alerts()
}

/// Same as `analyze`, keeping pattern and reminders apart.
pub fn analyze_report(readings: &[Reading], ctx: &AnalysisContext) -> TrendReport {
    let latest_tier = readings.first().map(|r| ctx.classify(r.systolic, r.diastolic));
    if readings.len() < MIN_READINGS_FOR_ANALYSIS {
        return TrendReport {
            latest_tier,
            ..TrendReport::default()
        };
    }

    let pattern = detect_pattern(readings);

    let mut reminders = Vec::new();
    reminders.extend(check_measurement_gap(readings, ctx));
    reminders.extend(check_schedule_consistency(readings, ctx));

    if let Some(ref alert) = pattern {
        tracing::debug!(kind = alert.kind.as_str(), "Trend pattern detected");
    }

    TrendReport {
        latest_tier,
        pattern,
        reminders,
    }
}

/// Run the pattern checks in order and keep the last match.
pub fn detect_pattern(readings: &[Reading]) -> Option<Alert> {
    if readings.len() < PATTERN_WINDOW {
        return None;
    }
    let window = &readings[..PATTERN_WINDOW];

    PATTERN_CHECKS
        .iter()
        .fold(None, |current, check| check(window).or(current))
}

// ---------------------------------------------------------------------------
// Pattern checks (window = five most recent, newest first)
// ---------------------------------------------------------------------------

fn check_rising_trend(window: &[Reading]) -> Option<Alert> {
    let newest = window.first()?;
    let oldest = window.last()?;
    let systolic_delta = newest.systolic.saturating_sub(oldest.systolic);
    let diastolic_delta = newest.diastolic.saturating_sub(oldest.diastolic);

    (systolic_delta > RISING_SYSTOLIC_DELTA || diastolic_delta > RISING_DIASTOLIC_DELTA)
        .then(|| pattern_alert(AlertKind::RisingTrend, MessageTemplates::rising_trend()))
}

fn check_consistently_high(window: &[Reading]) -> Option<Alert> {
    let high = window
        .iter()
        .filter(|r| is_high_reading(r.systolic, r.diastolic))
        .count();

    (high >= CONSISTENTLY_HIGH_COUNT).then(|| {
        pattern_alert(AlertKind::ConsistentlyHigh, MessageTemplates::consistently_high())
    })
}

fn check_high_variability(window: &[Reading]) -> Option<Alert> {
    let summary = aggregate(window, PATTERN_WINDOW);
    let stats = summary.stats()?;

    (stats.max_systolic.saturating_sub(stats.min_systolic) > VARIABILITY_SPREAD)
        .then(|| pattern_alert(AlertKind::HighVariability, MessageTemplates::high_variability()))
}

fn pattern_alert(kind: AlertKind, message: String) -> Alert {
    Alert {
        kind,
        priority: Priority::High,
        title: MessageTemplates::ALERT_TITLE.to_string(),
        message,
        days_since_last: None,
    }
}

// ---------------------------------------------------------------------------
// Independent reminder checks
// ---------------------------------------------------------------------------

fn check_measurement_gap(readings: &[Reading], ctx: &AnalysisContext) -> Option<Alert> {
    let newest = readings.first()?;
    let days = ctx.now_ms.saturating_sub(newest.timestamp_ms) / MILLIS_PER_DAY;
    if days < GAP_DAYS {
        return None;
    }

    Some(Alert {
        kind: AlertKind::MeasurementGap,
        priority: Priority::Normal,
        title: MessageTemplates::GAP_TITLE.to_string(),
        message: MessageTemplates::measurement_gap(days),
        days_since_last: Some(days),
    })
}

fn check_schedule_consistency(readings: &[Reading], ctx: &AnalysisContext) -> Option<Alert> {
    if readings.len() < SCHEDULE_WINDOW {
        return None;
    }

    let (mut morning, mut evening) = (0usize, 0usize);
    for reading in &readings[..SCHEDULE_WINDOW] {
        let hour = reading.hour_of_day(&ctx.utc_offset);
        if MORNING_HOURS.contains(&hour) {
            morning += 1;
        } else if EVENING_HOURS.contains(&hour) {
            evening += 1;
        }
    }

    if morning >= SCHEDULE_HABIT_COUNT || evening >= SCHEDULE_HABIT_COUNT {
        return None;
    }

    Some(Alert {
        kind: AlertKind::InconsistentSchedule,
        priority: Priority::Normal,
        title: MessageTemplates::TIP_TITLE.to_string(),
        message: MessageTemplates::schedule_tip(),
        days_since_last: None,
    })
}
