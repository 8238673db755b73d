use chrono::Utc;

/// Runtime configuration. Every field has a production default and an env
/// override so deployments never need a config file.
#[derive(Clone, Debug)]
pub struct Config {
    pub ledger_api_base: String,
    pub metrics_api_base: String,
    pub http_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub snapshot_path: String,
    /// Snapshots older than this trigger an automatic refresh in watch mode.
    pub max_snapshot_age_secs: u64,
    pub watch_poll_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ledger_api_base: "https://ledger-api.internetcomputer.org".to_string(),
            metrics_api_base: "https://ic-api.internetcomputer.org".to_string(),
            http_timeout_secs: 10,
            max_retries: 3,
            retry_delay_ms: 1000,
            snapshot_path: "./metrics.json".to_string(),
            max_snapshot_age_secs: 3600,
            watch_poll_ms: 100,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ledger_api_base: std::env::var("LEDGER_API_BASE").unwrap_or(defaults.ledger_api_base),
            metrics_api_base: std::env::var("METRICS_API_BASE")
                .unwrap_or(defaults.metrics_api_base),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            max_retries: env_parse("MAX_RETRIES", defaults.max_retries),
            retry_delay_ms: env_parse("RETRY_DELAY_MS", defaults.retry_delay_ms),
            snapshot_path: std::env::var("SNAPSHOT_PATH").unwrap_or(defaults.snapshot_path),
            max_snapshot_age_secs: env_parse(
                "SNAPSHOT_MAX_AGE_SECS",
                defaults.max_snapshot_age_secs,
            ),
            watch_poll_ms: env_parse("WATCH_POLL_MS", defaults.watch_poll_ms),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub fn now_ts_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// RFC 3339 timestamp with milliseconds, used for `lastUpdated`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
