//! Logging setup.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber and bridges `log` records
/// into it. The filter comes from `FAXO_LOG`, falling back to `info`.
/// Calling this more than once is harmless.
pub fn init() {
    let _ = tracing_log::LogTracer::init();

    let filter = EnvFilter::try_from_env("FAXO_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
