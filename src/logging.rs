use tracing_subscriber::EnvFilter;

use crate::config;

/// Install the global tracing subscriber.
///
/// Filter comes from `RUST_LOG`, falling back to `config::default_log_filter()`.
/// Returns false if a subscriber was already installed.
pub fn init() -> bool {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} engine starting v{}", config::APP_NAME, config::APP_VERSION);
    }
    installed
}
