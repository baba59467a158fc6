use super::types::AnalysisContext;
use crate::models::Reading;

/// Minimum history before a reminder hour is suggested.
pub const MIN_READINGS_FOR_SUGGESTION: usize = 5;
/// Most recent readings considered.
pub const SUGGESTION_WINDOW: usize = 30;
/// An hour must hold at least this many readings to be suggested.
pub const MIN_HOUR_COUNT: usize = 3;

const CANDIDATE_HOURS: std::ops::RangeInclusive<u32> = 6..=22;

/// Suggest a daily reminder hour from the user's measuring habit.
///
/// Counts readings per hour of day (in the context offset) over the
/// most recent readings, then scans candidate hours 6 through 22 in
/// ascending order keeping the first strictly-largest count. Ties go to
/// the earliest hour. Returns `None` when history is short or no hour is
/// used often enough.
pub fn suggest_reminder_hour(readings: &[Reading], ctx: &AnalysisContext) -> Option<u32> {
    if readings.len() < MIN_READINGS_FOR_SUGGESTION {
        return None;
    }

    let mut counts = [0usize; 24];
    for reading in readings.iter().take(SUGGESTION_WINDOW) {
        let hour = reading.hour_of_day(&ctx.utc_offset) as usize;
        if let Some(slot) = counts.get_mut(hour) {
            *slot += 1;
        }
    }

    let mut best: Option<(u32, usize)> = None;
    for hour in CANDIDATE_HOURS {
        let count = counts[hour as usize];
        if best.map_or(count > 0, |(_, top)| count > top) {
            best = Some((hour, count));
        }
    }

    let suggestion = best
        .filter(|(_, count)| *count >= MIN_HOUR_COUNT)
        .map(|(hour, _)| hour);

    tracing::debug!(
        owner = %ctx.owner_id,
        considered = readings.len().min(SUGGESTION_WINDOW),
        suggestion = ?suggestion,
        "Reminder hour evaluated"
    );

    suggestion
}
