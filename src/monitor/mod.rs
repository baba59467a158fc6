//! Health monitor: runs the analytics against stored readings and turns
//! the results into notifications and reminder settings.

pub mod background;

use std::sync::Arc;
use std::time::Duration;

pub use background::{start_periodic_analysis, MonitorHandle};

use crate::analytics::{self, Alert, AnalysisContext, MessageTemplates, Priority};
use crate::config::EngineConfig;
use crate::db::DatabaseError;
use crate::traits::{NotificationSink, ReadingStore, ReminderConfig};

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Failed to start monitor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub struct HealthMonitor {
    store: Arc<dyn ReadingStore>,
    sink: Arc<dyn NotificationSink>,
    reminders: Arc<dyn ReminderConfig>,
    analysis_window: usize,
    schedule_window: usize,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(
        store: Arc<dyn ReadingStore>,
        sink: Arc<dyn NotificationSink>,
        reminders: Arc<dyn ReminderConfig>,
    ) -> Self {
        let defaults = EngineConfig::default();
        Self {
            store,
            sink,
            reminders,
            analysis_window: defaults.analysis_window,
            schedule_window: defaults.schedule_window,
            interval: defaults.monitor_interval(),
        }
    }

    pub fn with_config(mut self, config: &EngineConfig) -> Self {
        self.analysis_window = config.analysis_window;
        self.schedule_window = config.schedule_window;
        self.interval = config.monitor_interval();
        self
    }

    /// Pause between periodic analysis passes.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run `analyze_and_notify` on a background thread every `interval()`.
    pub fn start(self: Arc<Self>, base: AnalysisContext) -> Result<MonitorHandle, MonitorError> {
        let interval = self.interval;
        start_periodic_analysis(self, base, interval)
    }

    /// Analyze the owner's recent readings and deliver every alert.
    ///
    /// Returns the delivered alerts. Does nothing when smart analysis is
    /// disabled in the context.
    pub fn analyze_and_notify(&self, ctx: &AnalysisContext) -> Result<Vec<Alert>, MonitorError> {
        if !ctx.smart_analysis_enabled {
            tracing::debug!(owner = %ctx.owner_id, "Smart analysis disabled, skipping");
            return Ok(Vec::new());
        }

        let readings = self.store.get_recent(&ctx.owner_id, self.analysis_window)?;
        let report = analytics::analyze_report(&readings, ctx);
        let latest_tier = report.latest_tier;
        let alerts = report.into_alerts();

        for alert in &alerts {
            self.sink.deliver(&alert.title, &alert.message, alert.priority);
        }

        tracing::info!(
            owner = %ctx.owner_id,
            readings = readings.len(),
            alerts = alerts.len(),
            latest_tier = ?latest_tier,
            "Health analysis completed"
        );
        Ok(alerts)
    }

    /// Store a reminder at the owner's usual measuring hour, if there is one.
    pub fn setup_intelligent_reminders(
        &self,
        ctx: &AnalysisContext,
    ) -> Result<Option<u32>, MonitorError> {
        let readings = self.store.get_recent(&ctx.owner_id, self.schedule_window)?;
        let Some(hour) = analytics::suggest_reminder_hour(&readings, ctx) else {
            return Ok(None);
        };

        self.reminders.set_reminder(&ctx.owner_id, hour, 0)?;
        self.sink.deliver(
            MessageTemplates::SMART_REMINDER_TITLE,
            &MessageTemplates::reminder_suggestion(hour),
            Priority::Normal,
        );

        tracing::info!(owner = %ctx.owner_id, hour, "Reminder set from measuring habit");
        Ok(Some(hour))
    }
}

#[cfg(test)]
mod tests {
    use chrono::FixedOffset;

    use super::*;
    use crate::analytics::AlertKind;
    use crate::db::SqliteStore;
    use crate::models::{Reading, MILLIS_PER_DAY};
    use crate::notify::MemoryNotificationSink;

    const HOUR_MS: i64 = 3_600_000;
    const DAY0: i64 = 1_709_510_400_000;

    fn setup() -> (Arc<SqliteStore>, Arc<MemoryNotificationSink>, HealthMonitor) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let sink = Arc::new(MemoryNotificationSink::new());
        let monitor = HealthMonitor::new(store.clone(), sink.clone(), store.clone());
        (store, sink, monitor)
    }

    fn ctx() -> AnalysisContext {
        AnalysisContext::new("ana")
            .at(DAY0 + 9 * HOUR_MS)
            .with_offset(FixedOffset::east_opt(0).unwrap())
    }

    /// One reading per day at 07:00, newest on DAY0.
    fn seed(store: &SqliteStore, systolic_newest_first: &[i32]) {
        for (i, sys) in systolic_newest_first.iter().enumerate() {
            let ts = DAY0 - i as i64 * MILLIS_PER_DAY + 7 * HOUR_MS;
            store.insert_reading(&Reading::new("ana", *sys, 85, 70, ts)).unwrap();
        }
    }

    #[test]
    fn rising_trend_is_delivered_as_high_priority() {
        let (store, sink, monitor) = setup();
        seed(&store, &[140, 138, 130, 125, 120]);

        let alerts = monitor.analyze_and_notify(&ctx()).unwrap();

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::RisingTrend);
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].priority, Priority::High);
        assert_eq!(delivered[0].title, MessageTemplates::ALERT_TITLE);
    }

    #[test]
    fn disabled_smart_analysis_delivers_nothing() {
        let (store, sink, monitor) = setup();
        seed(&store, &[140, 138, 130, 125, 120]);

        let alerts = monitor
            .analyze_and_notify(&ctx().with_smart_analysis(false))
            .unwrap();

        assert!(alerts.is_empty());
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn other_owners_are_not_analyzed() {
        let (store, sink, monitor) = setup();
        seed(&store, &[140, 138, 130, 125, 120]);

        let alerts = monitor.analyze_and_notify(&AnalysisContext::new("luis")).unwrap();

        assert!(alerts.is_empty());
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn analysis_window_limits_history() {
        let (store, _, monitor) = setup();
        seed(&store, &[140, 138, 130, 125, 120]);
        let config = EngineConfig {
            analysis_window: 2,
            ..EngineConfig::default()
        };

        let alerts = monitor.with_config(&config).analyze_and_notify(&ctx()).unwrap();
        assert!(alerts.is_empty());
    }

    #[test]
    fn config_sets_interval_and_context() {
        let (store, sink, monitor) = setup();
        assert_eq!(monitor.interval(), background::DEFAULT_INTERVAL);
        seed(&store, &[140, 138, 130, 125, 120]);
        let config = EngineConfig {
            monitor_interval_secs: 90,
            smart_analysis_enabled: false,
            ..EngineConfig::default()
        };

        let monitor = monitor.with_config(&config);
        assert_eq!(monitor.interval(), Duration::from_secs(90));

        let ctx = AnalysisContext::from_config("ana", &config).at(DAY0 + 9 * HOUR_MS);
        assert!(monitor.analyze_and_notify(&ctx).unwrap().is_empty());
        assert!(sink.delivered().is_empty());
    }

    #[test]
    fn habit_hour_becomes_reminder() {
        let (store, sink, monitor) = setup();
        seed(&store, &[120, 121, 119, 122, 120]);

        let hour = monitor.setup_intelligent_reminders(&ctx()).unwrap();

        assert_eq!(hour, Some(7));
        let setting = store.get_reminder("ana").unwrap().unwrap();
        assert_eq!((setting.hour, setting.minute), (7, 0));
        let delivered = sink.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].title, MessageTemplates::SMART_REMINDER_TITLE);
        assert!(delivered[0].message.contains("7:00"));
        assert_eq!(delivered[0].priority, Priority::Normal);
    }

    #[test]
    fn short_history_sets_no_reminder() {
        let (store, sink, monitor) = setup();
        seed(&store, &[120, 121, 119]);

        assert_eq!(monitor.setup_intelligent_reminders(&ctx()).unwrap(), None);
        assert!(store.get_reminder("ana").unwrap().is_none());
        assert!(sink.delivered().is_empty());
    }
}
