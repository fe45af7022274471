use tracing_subscriber::EnvFilter;

/// Maps the historical `{debug, info, warn, error, fatal}` level names onto
/// `tracing` levels. `fatal` has no direct `tracing` equivalent and maps to
/// `error`, the closest severity `tracing_subscriber` exposes.
fn filter_for_level(level: &str) -> &'static str {
    match level {
        "debug" => "debug",
        "info" => "info",
        "warn" => "warn",
        "error" | "fatal" => "error",
        _ => "info",
    }
}

/// Initializes the process-wide `tracing` subscriber, honoring `env_var`
/// (`HERMES_LOG_LEVEL` for the reference binaries) when set and falling back
/// to `info`.
pub fn init(env_var: &str) {
    let directive = std::env::var(env_var)
        .ok()
        .map(|level| filter_for_level(&level).to_string())
        .unwrap_or_else(|| "info".to_string());

    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
