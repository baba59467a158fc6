//! Per-reading AI advice cache.
//!
//! Advice is generated once per reading and stored in the reading's
//! `ai_recommendation` column. A reading whose advice is missing or holds
//! a placeholder is Stale and gets regenerated on the next view.
//!
//! Concurrent refreshes of the same reading share one computation: the
//! first caller spawns the blocking advisor call and registers a shared
//! future under the reading id, later callers await that same future.
//! The entry is removed by the computation itself when it finishes.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use uuid::Uuid;

use super::prompt::{recent_analysis_prompt, single_reading_prompt, SYSTEM_PERSONA};
use super::sentinel;
use super::types::{AdviceContext, AiAdvisor, RecommendationState};
use super::RefreshError;
use crate::config::EngineConfig;
use crate::db::DatabaseError;
use crate::models::Reading;
use crate::traits::ReadingStore;

/// Readings fed into the recent-analysis prompt, including the target.
pub const DEFAULT_CONTEXT_WINDOW: usize = 3;

type InFlight = Shared<BoxFuture<'static, Result<String, RefreshError>>>;
type InFlightMap = Arc<Mutex<HashMap<Uuid, InFlight>>>;

pub struct RecommendationCache {
    store: Arc<dyn ReadingStore>,
    advisor: Arc<dyn AiAdvisor>,
    context_window: usize,
    in_flight: InFlightMap,
}

impl RecommendationCache {
    pub fn new(store: Arc<dyn ReadingStore>, advisor: Arc<dyn AiAdvisor>) -> Self {
        Self {
            store,
            advisor,
            context_window: DEFAULT_CONTEXT_WINDOW,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_context_window(mut self, window: usize) -> Self {
        self.context_window = window.max(1);
        self
    }

    pub fn with_config(self, config: &EngineConfig) -> Self {
        self.with_context_window(config.context_window)
    }

    /// True when cached advice must be regenerated.
    pub fn is_stale(&self, text: Option<&str>) -> bool {
        sentinel::is_stale(text)
    }

    pub fn state_of(&self, reading: &Reading) -> RecommendationState {
        RecommendationState::from_cached(reading.ai_recommendation.as_deref())
    }

    /// Advice to display for a reading: the stored text when Fresh,
    /// otherwise a refresh.
    pub async fn advice_for(
        &self,
        reading: &Reading,
        ctx: &AdviceContext,
    ) -> Result<String, RefreshError> {
        // The caller's copy may predate a refresh that already landed.
        let current = match self.store.get_reading(&reading.id) {
            Ok(Some(stored)) => stored,
            Ok(None) => reading.clone(),
            Err(e) => {
                tracing::warn!(reading_id = %reading.id, error = %e, "Could not reload reading");
                reading.clone()
            }
        };

        if let RecommendationState::Fresh(text) = self.state_of(&current) {
            return Ok(text);
        }
        self.refresh(&current, ctx).await
    }

    /// Generate and store new advice for `reading`.
    ///
    /// Joins an in-flight refresh of the same reading if there is one.
    /// On advisor failure the stored text is left untouched and
    /// `RefreshError::Unavailable` is returned.
    pub async fn refresh(
        &self,
        reading: &Reading,
        ctx: &AdviceContext,
    ) -> Result<String, RefreshError> {
        let pending = {
            let mut in_flight = self
                .in_flight
                .lock()
                .map_err(|_| RefreshError::LockPoisoned)?;

            match in_flight.get(&reading.id) {
                Some(existing) => {
                    tracing::debug!(reading_id = %reading.id, "Joining in-flight advice refresh");
                    existing.clone()
                }
                None => {
                    let job = RefreshJob {
                        store: Arc::clone(&self.store),
                        advisor: Arc::clone(&self.advisor),
                        in_flight: Arc::clone(&self.in_flight),
                        reading: reading.clone(),
                        ctx: ctx.clone(),
                        context_window: self.context_window,
                    };
                    // Registration happens under the lock, so the job's own
                    // removal cannot run before the insert.
                    let pending = tokio::task::spawn_blocking(move || job.run())
                        .map(|joined| {
                            joined.unwrap_or_else(|e| {
                                Err(RefreshError::Task {
                                    reason: e.to_string(),
                                })
                            })
                        })
                        .boxed()
                        .shared();
                    in_flight.insert(reading.id, pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Null every stored placeholder advice. Returns rows cleared.
    pub fn purge_sentinel_records(&self) -> Result<u64, DatabaseError> {
        self.store.purge_sentinel_advice()
    }

    /// Refreshes currently running.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.lock().map(|m| m.len()).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// Blocking refresh job
// ---------------------------------------------------------------------------

struct RefreshJob {
    store: Arc<dyn ReadingStore>,
    advisor: Arc<dyn AiAdvisor>,
    in_flight: InFlightMap,
    reading: Reading,
    ctx: AdviceContext,
    context_window: usize,
}

impl RefreshJob {
    fn run(self) -> Result<String, RefreshError> {
        let _registration = InFlightGuard {
            map: Arc::clone(&self.in_flight),
            reading_id: self.reading.id,
        };
        let reading_id = self.reading.id;

        let prompt = match self.ctx.profile.as_ref() {
            Some(profile) if !profile.full_name.trim().is_empty() => {
                single_reading_prompt(&self.reading, profile)?
            }
            _ => recent_analysis_prompt(&self.recent_window())?,
        };

        let text = self
            .advisor
            .generate(SYSTEM_PERSONA, &prompt)
            .map_err(|e| {
                tracing::warn!(reading_id = %reading_id, error = %e, "Advice generation failed");
                RefreshError::from(e)
            })?;

        if sentinel::is_stale(Some(&text)) {
            tracing::warn!(reading_id = %reading_id, "Advisor returned placeholder text, not caching");
            return Err(RefreshError::Unavailable {
                reason: "advisor returned placeholder text".to_string(),
            });
        }

        self.store.write_advice(&reading_id, &text)?;
        tracing::info!(reading_id = %reading_id, chars = text.len(), "Advice refreshed");
        Ok(text)
    }

    /// The target reading followed by earlier readings of its owner.
    ///
    /// Scoped by the reading, never by the caller's context.
    fn recent_window(&self) -> Vec<Reading> {
        let owner_id = &self.reading.owner_id;
        let recent = self
            .store
            .get_recent(owner_id, self.context_window + 1)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Recent readings unavailable, using single reading");
                Vec::new()
            });

        let mut window = vec![self.reading.clone()];
        window.extend(recent.into_iter().filter(|r| {
            &r.owner_id == owner_id
                && r.id != self.reading.id
                && r.timestamp_ms <= self.reading.timestamp_ms
        }));
        window.truncate(self.context_window);
        window
    }
}

/// Removes the in-flight entry when the job ends, panics included.
struct InFlightGuard {
    map: InFlightMap,
    reading_id: Uuid,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut map) = self.map.lock() {
            map.remove(&self.reading_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::advice::MockAiAdvisor;
    use crate::analytics::AnalysisContext;
    use crate::db::SqliteStore;
    use crate::models::UserProfile;

    const PLACEHOLDER: &str = "No hay una clave de OpenAI configurada en la app.";

    fn setup(advisor: MockAiAdvisor) -> (Arc<SqliteStore>, Arc<MockAiAdvisor>, RecommendationCache) {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let advisor = Arc::new(advisor);
        let cache = RecommendationCache::new(store.clone(), advisor.clone());
        (store, advisor, cache)
    }

    fn ctx() -> AdviceContext {
        AdviceContext::new(AnalysisContext::new("ana"))
    }

    fn stored(store: &SqliteStore, reading: &Reading) -> Option<String> {
        store.get_reading(&reading.id).unwrap().unwrap().ai_recommendation
    }

    fn insert(store: &SqliteStore, systolic: i32, ts: i64, advice: Option<&str>) -> Reading {
        let mut r = Reading::new("ana", systolic, 80, 70, ts);
        r.ai_recommendation = advice.map(str::to_string);
        store.insert_reading(&r).unwrap();
        r
    }

    #[tokio::test]
    async fn refresh_writes_and_returns_advice() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("Tu presión está estable, sigue así."));
        let r = insert(&store, 120, 1_000, None);

        let text = cache.refresh(&r, &ctx()).await.unwrap();

        assert_eq!(text, "Tu presión está estable, sigue así.");
        assert_eq!(stored(&store, &r).as_deref(), Some(text.as_str()));
        assert_eq!(advisor.calls(), 1);
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_prior_text_and_reports_unavailable() {
        let (store, _, cache) = setup(MockAiAdvisor::failing("timeout"));
        let r = insert(&store, 120, 1_000, Some(PLACEHOLDER));

        let err = cache.refresh(&r, &ctx()).await.unwrap_err();

        assert!(matches!(err, RefreshError::Unavailable { .. }));
        assert_eq!(stored(&store, &r).as_deref(), Some(PLACEHOLDER));
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn failure_after_fresh_advice_keeps_it() {
        let (store, _, cache) = setup(MockAiAdvisor::failing("down"));
        let r = insert(&store, 120, 1_000, Some("Reduce la sal."));

        assert!(cache.refresh(&r, &ctx()).await.is_err());
        assert_eq!(stored(&store, &r).as_deref(), Some("Reduce la sal."));
    }

    #[tokio::test]
    async fn placeholder_answer_is_never_cached() {
        let (store, _, cache) = setup(MockAiAdvisor::new(PLACEHOLDER));
        let r = insert(&store, 120, 1_000, None);

        let err = cache.refresh(&r, &ctx()).await.unwrap_err();

        assert!(matches!(err, RefreshError::Unavailable { .. }));
        assert_eq!(stored(&store, &r), None);
    }

    #[tokio::test]
    async fn concurrent_refreshes_share_one_call() {
        let advisor = MockAiAdvisor::new("Sigue así.").with_delay(Duration::from_millis(150));
        let (store, advisor, cache) = setup(advisor);
        let r = insert(&store, 120, 1_000, None);
        let ctx = ctx();

        let (a, b, c) = tokio::join!(
            cache.refresh(&r, &ctx),
            cache.refresh(&r, &ctx),
            cache.refresh(&r, &ctx)
        );

        assert_eq!(a.unwrap(), "Sigue así.");
        assert_eq!(b.unwrap(), "Sigue así.");
        assert_eq!(c.unwrap(), "Sigue así.");
        assert_eq!(advisor.calls(), 1);
        assert_eq!(cache.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn different_readings_are_not_coalesced() {
        let advisor = MockAiAdvisor::new("Sigue así.").with_delay(Duration::from_millis(50));
        let (store, advisor, cache) = setup(advisor);
        let r1 = insert(&store, 120, 1_000, None);
        let r2 = insert(&store, 125, 2_000, None);
        let ctx = ctx();

        let (a, b) = tokio::join!(cache.refresh(&r1, &ctx), cache.refresh(&r2, &ctx));

        assert!(a.is_ok() && b.is_ok());
        assert_eq!(advisor.calls(), 2);
    }

    #[tokio::test]
    async fn coalesced_failure_reaches_every_waiter() {
        let advisor = MockAiAdvisor::failing("down").with_delay(Duration::from_millis(100));
        let (store, advisor, cache) = setup(advisor);
        let r = insert(&store, 120, 1_000, None);
        let ctx = ctx();

        let (a, b) = tokio::join!(cache.refresh(&r, &ctx), cache.refresh(&r, &ctx));

        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(advisor.calls(), 1);
    }

    #[tokio::test]
    async fn advice_for_returns_fresh_text_without_calling_advisor() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("nuevo"));
        let r = insert(&store, 120, 1_000, Some("Reduce la sal."));

        assert_eq!(cache.advice_for(&r, &ctx()).await.unwrap(), "Reduce la sal.");
        assert_eq!(advisor.calls(), 0);
    }

    #[tokio::test]
    async fn advice_for_uses_stored_copy_over_callers_copy() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("nuevo"));
        let r = insert(&store, 120, 1_000, None);
        store.write_advice(&r.id, "Ya generado.").unwrap();

        // `r` still has no advice locally
        assert_eq!(cache.advice_for(&r, &ctx()).await.unwrap(), "Ya generado.");
        assert_eq!(advisor.calls(), 0);
    }

    #[tokio::test]
    async fn advice_for_regenerates_placeholder() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("Mide tu presión cada mañana."));
        let r = insert(&store, 120, 1_000, Some(PLACEHOLDER));

        let text = cache.advice_for(&r, &ctx()).await.unwrap();

        assert_eq!(text, "Mide tu presión cada mañana.");
        assert_eq!(advisor.calls(), 1);
        assert!(cache.state_of(&store.get_reading(&r.id).unwrap().unwrap()).is_fresh());
    }

    #[tokio::test]
    async fn profile_selects_personal_prompt() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("ok"));
        let r = insert(&store, 142, 1_000, None);
        let ctx = ctx().with_profile(UserProfile::named("Ana Torres"));

        cache.refresh(&r, &ctx).await.unwrap();

        let prompt = advisor.last_prompt().unwrap();
        assert!(prompt.contains("- Nombre: Ana Torres"));
        assert!(prompt.contains("Sistólica 142"));
    }

    #[tokio::test]
    async fn without_profile_recent_window_is_used() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("ok"));
        insert(&store, 111, 1_000, None);
        insert(&store, 112, 2_000, None);
        insert(&store, 113, 3_000, None);
        let target = insert(&store, 114, 4_000, None);
        // newer than the target, must not be part of its context
        insert(&store, 115, 5_000, None);

        cache.refresh(&target, &ctx()).await.unwrap();

        let prompt = advisor.last_prompt().unwrap();
        assert!(prompt.contains("Analiza estas últimas mediciones"));
        assert!(prompt.contains("Sistólica 114"));
        assert!(prompt.contains("Sistólica 113"));
        assert!(prompt.contains("Sistólica 112"));
        assert!(!prompt.contains("Sistólica 111"));
        assert!(!prompt.contains("Sistólica 115"));
    }

    #[tokio::test]
    async fn window_never_mixes_in_another_owner() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("ok"));
        let target = insert(&store, 114, 4_000, None);
        store.insert_reading(&Reading::new("luis", 177, 99, 80, 3_000)).unwrap();
        // caller's context names the other owner
        let ctx = AdviceContext::new(AnalysisContext::new("luis"));

        cache.refresh(&target, &ctx).await.unwrap();

        let prompt = advisor.last_prompt().unwrap();
        assert!(prompt.contains("Sistólica 114"));
        assert!(!prompt.contains("Sistólica 177"));
    }

    #[tokio::test]
    async fn context_window_follows_config() {
        let config = EngineConfig {
            context_window: 2,
            ..EngineConfig::default()
        };
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        let advisor = Arc::new(MockAiAdvisor::new("ok"));
        let cache = RecommendationCache::new(store.clone(), advisor.clone()).with_config(&config);
        insert(&store, 111, 1_000, None);
        insert(&store, 112, 2_000, None);
        let target = insert(&store, 113, 3_000, None);

        cache.refresh(&target, &ctx()).await.unwrap();

        let prompt = advisor.last_prompt().unwrap();
        assert!(prompt.contains("Sistólica 113"));
        assert!(prompt.contains("Sistólica 112"));
        assert!(!prompt.contains("Sistólica 111"));
    }

    #[tokio::test]
    async fn unknown_reading_is_a_storage_error() {
        let (_, _, cache) = setup(MockAiAdvisor::new("ok"));
        let ghost = Reading::new("ana", 120, 80, 70, 0);

        let err = cache.refresh(&ghost, &ctx()).await.unwrap_err();
        assert!(matches!(err, RefreshError::Storage { .. }));
    }

    #[tokio::test]
    async fn purge_makes_stuck_records_refreshable() {
        let (store, advisor, cache) = setup(MockAiAdvisor::new("Consejo real."));
        let stuck = insert(&store, 120, 1_000, Some(PLACEHOLDER));
        insert(&store, 121, 2_000, Some("Reduce la sal."));

        assert_eq!(cache.purge_sentinel_records().unwrap(), 1);
        assert_eq!(cache.purge_sentinel_records().unwrap(), 0);
        assert_eq!(stored(&store, &stuck), None);

        let text = cache.advice_for(&stuck, &ctx()).await.unwrap();
        assert_eq!(text, "Consejo real.");
        assert_eq!(advisor.calls(), 1);
    }

    #[test]
    fn stale_checks_delegate_to_sentinels() {
        let (_, _, cache) = setup(MockAiAdvisor::new("ok"));
        assert!(cache.is_stale(None));
        assert!(cache.is_stale(Some(PLACEHOLDER)));
        assert!(!cache.is_stale(Some("Tu presión está estable, sigue así.")));

        let r = Reading::new("ana", 120, 80, 70, 0);
        assert_eq!(cache.state_of(&r), RecommendationState::Stale);
    }
}
