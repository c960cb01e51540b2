//! Configuration for the bridge
//!
//! Every setting has a built-in default that an environment variable can
//! override:
//! - UCI_BRIDGE_VARIANT: variant selected by auto-initialization
//! - UCI_BRIDGE_INIT_TIMEOUT_MS: how long `initialize` waits for the engine
//! - UCI_BRIDGE_DEFAULT_MOVETIME_MS: budget for `go` without limits
//! - UCI_BRIDGE_MIN_WAIT_MS: floor for best-move waits
//! - UCI_BRIDGE_ENGINE_PATH: external engine binary, `auto` to search PATH
//!   and common install directories; unset uses the built-in engine

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_VARIANT: &str = "chess";
pub const DEFAULT_INIT_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_MOVETIME_MS: u64 = 1000;
pub const DEFAULT_MIN_WAIT_MS: u64 = 50;

/// Engine binaries tried, in order, when the engine path is `auto`
pub const AUTO_ENGINE_NAMES: &[&str] = &["fairy-stockfish", "stockfish"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub variant: String,
    pub init_timeout: Duration,
    pub default_movetime_ms: u64,
    pub min_wait: Duration,
    pub engine_path: Option<EnginePath>,
}

/// Which external engine binary to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePath {
    /// Search PATH, then common install directories, for one of
    /// [`AUTO_ENGINE_NAMES`]
    Auto,
    Explicit(PathBuf),
}

impl EnginePath {
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            None
        } else if raw.eq_ignore_ascii_case("auto") {
            Some(EnginePath::Auto)
        } else {
            Some(EnginePath::Explicit(PathBuf::from(raw)))
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            variant: DEFAULT_VARIANT.to_string(),
            init_timeout: Duration::from_millis(DEFAULT_INIT_TIMEOUT_MS),
            default_movetime_ms: DEFAULT_MOVETIME_MS,
            min_wait: Duration::from_millis(DEFAULT_MIN_WAIT_MS),
            engine_path: None,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by the `UCI_BRIDGE_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            variant: get_variant(),
            init_timeout: get_init_timeout(),
            default_movetime_ms: get_default_movetime_ms(),
            min_wait: get_min_wait(),
            engine_path: get_engine_path(),
        }
    }

    /// How long a best-move request with this budget waits for the worker
    pub fn result_wait(&self, time_budget_ms: u64) -> Duration {
        Duration::from_millis(time_budget_ms.saturating_mul(2)).max(self.min_wait)
    }
}

pub fn get_variant() -> String {
    std::env::var("UCI_BRIDGE_VARIANT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_VARIANT.to_string())
}

pub fn get_init_timeout() -> Duration {
    Duration::from_millis(millis_from_env("UCI_BRIDGE_INIT_TIMEOUT_MS", DEFAULT_INIT_TIMEOUT_MS))
}

pub fn get_default_movetime_ms() -> u64 {
    millis_from_env("UCI_BRIDGE_DEFAULT_MOVETIME_MS", DEFAULT_MOVETIME_MS)
}

pub fn get_min_wait() -> Duration {
    Duration::from_millis(millis_from_env("UCI_BRIDGE_MIN_WAIT_MS", DEFAULT_MIN_WAIT_MS))
}

pub fn get_engine_path() -> Option<EnginePath> {
    std::env::var("UCI_BRIDGE_ENGINE_PATH")
        .ok()
        .and_then(|raw| EnginePath::parse(&raw))
}

fn millis_from_env(key: &str, default: u64) -> u64 {
    parse_millis(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_millis(key: &str, raw: Option<&str>, default: u64) -> u64 {
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = raw, default, "Ignoring invalid millisecond value");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.variant, "chess");
        assert_eq!(config.init_timeout, Duration::from_secs(2));
        assert_eq!(config.default_movetime_ms, 1000);
        assert!(config.engine_path.is_none());
    }

    #[test]
    fn test_result_wait_is_twice_budget_with_floor() {
        let config = BridgeConfig::default();
        assert_eq!(config.result_wait(100), Duration::from_millis(200));
        assert_eq!(config.result_wait(10), Duration::from_millis(50));
        assert_eq!(config.result_wait(0), Duration::from_millis(50));
        assert_eq!(config.result_wait(u64::MAX), Duration::from_millis(u64::MAX));
    }

    #[test]
    fn test_parse_millis() {
        assert_eq!(parse_millis("K", None, 7), 7);
        assert_eq!(parse_millis("K", Some(" 250 "), 7), 250);
        assert_eq!(parse_millis("K", Some("soon"), 7), 7);
        assert_eq!(parse_millis("K", Some("-5"), 7), 7);
    }

    #[test]
    fn test_engine_path_parse() {
        assert_eq!(EnginePath::parse(""), None);
        assert_eq!(EnginePath::parse("AUTO"), Some(EnginePath::Auto));
        assert_eq!(
            EnginePath::parse("/usr/bin/stockfish"),
            Some(EnginePath::Explicit(PathBuf::from("/usr/bin/stockfish")))
        );
    }

    // Environment overrides are exercised by the CLI; mutating process env
    // here would race with other tests.
}
