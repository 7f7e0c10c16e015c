//! Runtime configuration.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `ROSTER_UPSTREAM_URL` | Upstream base URL (default: `https://dummy.restapiexample.com/api/v1`) |
//! | `ROSTER_UPSTREAM_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `ROSTER_UPSTREAM_MAX_RETRIES` | Max retries for transport failures (default: 2, so 3 attempts) |
//! | `ROSTER_CACHE_MAX_ENTRIES` | Read-through cache size bound (default: 100) |
//! | `ROSTER_CACHE_TTL_MINUTES` | Expire-after-write for cache entries (default: 60) |
//! | `ROSTER_CACHE_RESET_INTERVAL` | Seconds between full cache resets (default: daily at 00:00 UTC) |
//! | `ROSTER_GATE_PERMITS` | Concurrent upstream calls (default: 5) |
//! | `ROSTER_GATE_TIMEOUT_MS` | Wait for a permit before proceeding anyway (default: 2000) |
//! | `ROSTER_DB_PATH` | Local replica database file (default: `roster.db`) |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RosterError, RosterResult};
use crate::maintenance::CacheResetSchedule;

/// Longest accepted cache TTL (one year).
pub const MAX_TTL_MINUTES: u64 = 365 * 24 * 60;

/// Largest permit pool the gate's semaphore can hold.
pub const MAX_PERMITS: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Upstream connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL for the upstream API.
    #[serde(default = "default_upstream_url")]
    pub url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Read-through cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,

    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// Unset means once a day at midnight UTC.
    #[serde(default)]
    pub reset_interval_secs: Option<u64>,
}

/// Permit gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    #[serde(default = "default_permits")]
    pub permits: usize,

    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

/// Local replica settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

/// Full roster configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub gate: GateConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_upstream_url() -> String {
    "https://dummy.restapiexample.com/api/v1".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

fn default_max_entries() -> u64 {
    100
}

fn default_ttl_minutes() -> u64 {
    60
}

fn default_permits() -> usize {
    5
}

fn default_acquire_timeout_ms() -> u64 {
    2000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("roster.db")
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_upstream_url(),
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_minutes: default_ttl_minutes(),
            reset_interval_secs: None,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            permits: default_permits(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    pub fn reset_schedule(&self) -> CacheResetSchedule {
        match self.reset_interval_secs {
            Some(secs) => CacheResetSchedule::Every(Duration::from_secs(secs)),
            None => CacheResetSchedule::Daily,
        }
    }
}

impl GateConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

impl RosterConfig {
    /// Defaults overridden by environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a YAML file, then let environment variables override it.
    pub fn from_yaml_file(path: &Path) -> RosterResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RosterError::Config {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        let mut config = Self::from_yaml_str(&text)?;
        config.apply_env();
        Ok(config)
    }

    pub fn from_yaml_str(text: &str) -> RosterResult<Self> {
        serde_yaml::from_str(text).map_err(|e| RosterError::Config {
            message: format!("invalid config: {}", e),
        })
    }

    /// Apply `ROSTER_*` environment overrides in place.
    ///
    /// Unparseable numeric values are ignored and the current value is kept.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ROSTER_UPSTREAM_URL") {
            self.upstream.url = url;
        }
        override_parsed("ROSTER_UPSTREAM_TIMEOUT", &mut self.upstream.timeout_secs);
        override_parsed(
            "ROSTER_UPSTREAM_MAX_RETRIES",
            &mut self.upstream.max_retries,
        );
        override_parsed("ROSTER_CACHE_MAX_ENTRIES", &mut self.cache.max_entries);
        override_parsed("ROSTER_CACHE_TTL_MINUTES", &mut self.cache.ttl_minutes);
        if let Some(secs) = env_parsed::<u64>("ROSTER_CACHE_RESET_INTERVAL") {
            self.cache.reset_interval_secs = Some(secs);
        }
        override_parsed("ROSTER_GATE_PERMITS", &mut self.gate.permits);
        override_parsed("ROSTER_GATE_TIMEOUT_MS", &mut self.gate.acquire_timeout_ms);
        if let Ok(path) = std::env::var("ROSTER_DB_PATH") {
            self.store.path = PathBuf::from(path);
        }
    }

    /// Reject values the components cannot be built from.
    pub fn validate(&self) -> RosterResult<()> {
        let fail = |message: &str| {
            Err(RosterError::Config {
                message: message.to_string(),
            })
        };
        if self.upstream.url.trim().is_empty() {
            return fail("upstream.url must not be empty");
        }
        if self.gate.permits == 0 {
            return fail("gate.permits must be at least 1");
        }
        if self.gate.permits > MAX_PERMITS {
            return fail("gate.permits exceeds the semaphore limit");
        }
        if self.cache.max_entries == 0 {
            return fail("cache.max_entries must be at least 1");
        }
        if self.cache.ttl_minutes == 0 {
            return fail("cache.ttl_minutes must be at least 1");
        }
        if self.cache.ttl_minutes > MAX_TTL_MINUTES {
            return fail("cache.ttl_minutes must be at most 525600 (one year)");
        }
        if self.cache.reset_interval_secs == Some(0) {
            return fail("cache.reset_interval_secs must be at least 1");
        }
        Ok(())
    }

    /// Set the upstream base URL.
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream.url = url.into();
        self
    }

    /// Set the transport retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.upstream.max_retries = retries;
        self
    }

    /// Set the number of concurrent upstream permits.
    pub fn with_permits(mut self, permits: usize) -> Self {
        self.gate.permits = permits;
        self
    }

    /// Set the local replica path.
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn override_parsed<T: std::str::FromStr>(key: &str, slot: &mut T) {
    if let Some(value) = env_parsed(key) {
        *slot = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: &[&str] = &[
        "ROSTER_UPSTREAM_URL",
        "ROSTER_UPSTREAM_TIMEOUT",
        "ROSTER_UPSTREAM_MAX_RETRIES",
        "ROSTER_CACHE_MAX_ENTRIES",
        "ROSTER_CACHE_TTL_MINUTES",
        "ROSTER_CACHE_RESET_INTERVAL",
        "ROSTER_GATE_PERMITS",
        "ROSTER_GATE_TIMEOUT_MS",
        "ROSTER_DB_PATH",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_defaults() {
        let config = RosterConfig::default();
        assert_eq!(config.gate.permits, 5);
        assert_eq!(config.gate.acquire_timeout(), Duration::from_millis(2000));
        assert_eq!(config.upstream.max_retries, 2);
        assert_eq!(config.cache.reset_schedule(), CacheResetSchedule::Daily);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RosterConfig::from_yaml_str(
            "cache:\n  max_entries: 10\n  ttl_minutes: 5\ngate:\n  permits: 2\n",
        )
        .unwrap();
        assert_eq!(config.cache.max_entries, 10);
        assert_eq!(config.cache.ttl(), Duration::from_secs(300));
        assert_eq!(config.gate.permits, 2);
        assert_eq!(config.gate.acquire_timeout_ms, 2000);
        assert_eq!(config.upstream, UpstreamConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = RosterConfig::from_yaml_str("gate: [1, 2").unwrap_err();
        assert!(matches!(err, RosterError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_permits() {
        let config = RosterConfig::default().with_permits(0);
        assert!(matches!(
            config.validate(),
            Err(RosterError::Config { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversized_permits() {
        let config = RosterConfig::default().with_permits(usize::MAX);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gate.permits"));

        assert!(RosterConfig::default()
            .with_permits(MAX_PERMITS)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_ttl() {
        let mut config = RosterConfig::default();
        config.cache.ttl_minutes = 1_000_000_000;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cache.ttl_minutes"));

        config.cache.ttl_minutes = MAX_TTL_MINUTES;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ttl_saturates_instead_of_overflowing() {
        let cache = CacheConfig {
            ttl_minutes: u64::MAX,
            ..Default::default()
        };
        assert_eq!(cache.ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        std::env::set_var("ROSTER_UPSTREAM_URL", "http://localhost:9999");
        std::env::set_var("ROSTER_GATE_PERMITS", "9");
        std::env::set_var("ROSTER_CACHE_RESET_INTERVAL", "60");
        std::env::set_var("ROSTER_UPSTREAM_TIMEOUT", "not-a-number");

        let config = RosterConfig::from_env();
        clear_env();

        assert_eq!(config.upstream.url, "http://localhost:9999");
        assert_eq!(config.gate.permits, 9);
        assert_eq!(
            config.cache.reset_schedule(),
            CacheResetSchedule::Every(Duration::from_secs(60))
        );
        assert_eq!(config.upstream.timeout_secs, 30);
    }

    #[test]
    #[serial]
    fn test_yaml_file_then_env() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roster.yaml");
        std::fs::write(&path, "store:\n  path: /var/lib/roster.db\ngate:\n  permits: 3\n").unwrap();
        std::env::set_var("ROSTER_GATE_PERMITS", "4");

        let config = RosterConfig::from_yaml_file(&path).unwrap();
        clear_env();

        assert_eq!(config.store.path, PathBuf::from("/var/lib/roster.db"));
        assert_eq!(config.gate.permits, 4);
    }
}
