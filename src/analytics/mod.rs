//! Blood-pressure analytics: classification, aggregation, trend alerts
//! and reminder-hour suggestion. Pure functions over reading slices.
//!
//! All reading slices are newest first, as returned by
//! `ReadingStore::get_recent`.

pub mod classify;
pub mod messages;
pub mod schedule;
pub mod stats;
pub mod trend;
pub mod types;

pub use classify::{classify, is_high_reading};
pub use messages::MessageTemplates;
pub use schedule::suggest_reminder_hour;
pub use stats::{aggregate, weekly_average, AggregateResult, Period, ReadingStats};
pub use trend::{analyze, analyze_report, detect_pattern, TrendReport};
pub use types::*;
