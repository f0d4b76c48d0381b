use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Configuration for process logging.
#[derive(Clone, Debug)]
pub struct TelemetryConfig {
    /// Default log level. Overridden by RUST_LOG env var.
    pub log_level: Level,
    /// Per-module level overrides (e.g. "chesshook_engine" => DEBUG).
    pub module_levels: Vec<(String, Level)>,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Level::INFO,
            module_levels: Vec::new(),
            json: false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Returned by [`init_telemetry`]; keeps the effective filter around for
/// diagnostics.
#[derive(Debug)]
pub struct TelemetryGuard {
    filter: String,
}

impl TelemetryGuard {
    pub fn filter(&self) -> &str {
        &self.filter
    }
}

/// Build the EnvFilter directive string from config.
pub fn filter_directives(config: &TelemetryConfig) -> String {
    let mut filter_str = config.log_level.to_string().to_lowercase();
    for (module, level) in &config.module_levels {
        filter_str.push_str(&format!(",{}={}", module, level.to_string().to_lowercase()));
    }
    filter_str
}

/// Parse a `module=level` override, as passed on the command line.
pub fn parse_module_level(s: &str) -> Result<(String, Level), String> {
    let (module, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected MODULE=LEVEL, got {s:?}"))?;
    if module.is_empty() {
        return Err(format!("missing module in {s:?}"));
    }
    let level = level
        .parse::<Level>()
        .map_err(|_| format!("unknown level {level:?}"))?;
    Ok((module.to_string(), level))
}

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let directives = filter_directives(&config);
    let (env_filter, filter) = match EnvFilter::try_from_default_env() {
        Ok(from_env) => {
            let shown = from_env.to_string();
            (from_env, shown)
        }
        Err(_) => (EnvFilter::new(&directives), directives),
    };

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_list(true)
    });
    let plain_layer = (!config.json).then(|| tracing_subscriber::fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(plain_layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;

    Ok(TelemetryGuard { filter })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_info() {
        assert_eq!(filter_directives(&TelemetryConfig::default()), "info");
    }

    #[test]
    fn module_overrides_are_appended() {
        let config = TelemetryConfig {
            log_level: Level::WARN,
            module_levels: vec![
                ("chesshook_engine".into(), Level::DEBUG),
                ("tower_http".into(), Level::TRACE),
            ],
            json: true,
        };
        assert_eq!(
            filter_directives(&config),
            "warn,chesshook_engine=debug,tower_http=trace"
        );
    }

    #[test]
    fn module_level_parsing() {
        assert_eq!(
            parse_module_level("chesshook_server=debug").unwrap(),
            ("chesshook_server".to_string(), Level::DEBUG)
        );
        assert_eq!(
            parse_module_level("tower_http=WARN").unwrap(),
            ("tower_http".to_string(), Level::WARN)
        );
        assert!(parse_module_level("chesshook_server").is_err());
        assert!(parse_module_level("=debug").is_err());
        assert!(parse_module_level("chesshook_server=loud").is_err());
    }
}
