pub mod advice; // Cached AI advice per reading
pub mod analytics; // Classification, statistics, trends, reminder hour
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod monitor; // Periodic analysis and notifications
pub mod notify;
pub mod traits;

pub use advice::{AdviceContext, RecommendationCache, RecommendationState, RefreshError};
pub use analytics::{AnalysisContext, ClassificationMode, SeverityTier};
pub use config::EngineConfig;
pub use db::{DatabaseError, SqliteStore};
pub use models::{Reading, ReminderSetting, UserProfile};
pub use monitor::HealthMonitor;
