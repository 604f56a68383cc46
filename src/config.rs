//! Application configuration loaded from environment variables.
//!
//! Every value has a default, so a bare environment yields a working
//! configuration pointed at the public exchange endpoints:
//! - `TICKERBOARD_REST_URLS`: comma-separated REST base URLs, tried in order
//! - `TICKERBOARD_WS_URLS`: comma-separated push-channel base URLs, rotated on failure
//! - `TICKERBOARD_ENRICH_INTERVAL_MS`: enrichment scheduler cadence
//! - `TICKERBOARD_BOOTSTRAP_TIMEOUT_SECS`: ceiling before the loading state is dropped
//! - `TICKERBOARD_WINDOWS`: optional change windows to backfill (`1h,4h,7d,30d`)
//! - `TICKERBOARD_LOG_FILE` / `TICKERBOARD_LOG_LEVEL`: tracing output

use std::path::PathBuf;
use std::time::Duration;

use crate::store::Window;

/// Default REST base URLs, in fallback order.
const DEFAULT_REST_URLS: &[&str] = &[
    "https://api.binance.com",
    "https://api1.binance.com",
    "https://api2.binance.com",
    "https://api3.binance.com",
    "https://data-api.binance.vision",
];

/// Default push-channel base URLs, in rotation order.
const DEFAULT_WS_URLS: &[&str] = &[
    "wss://stream.binance.com:9443",
    "wss://stream.binance.com:443",
    "wss://data-stream.binance.vision",
];

/// One fetch per tick at this cadence keeps us at 5 requests per second.
const DEFAULT_ENRICH_INTERVAL_MS: u64 = 200;

/// Anything faster than this would blow through the exchange's weight budget.
const MIN_ENRICH_INTERVAL_MS: u64 = 100;

const DEFAULT_BOOTSTRAP_TIMEOUT_SECS: u64 = 10;

const DEFAULT_LOG_FILE: &str = "tickerboard.log";

/// Top-level application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub engine: EngineConfig,
    pub log: LogConfig,
}

/// Exchange endpoints.
#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub rest_urls: Vec<String>,
    pub websocket_urls: Vec<String>,
}

/// Tuning for the synchronization engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub enrich_interval: Duration,
    pub bootstrap_timeout: Duration,
    /// Optional change windows the scheduler backfills.
    pub windows: Vec<Window>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enrich_interval: Duration::from_millis(DEFAULT_ENRICH_INTERVAL_MS),
            bootstrap_timeout: Duration::from_secs(DEFAULT_BOOTSTRAP_TIMEOUT_SECS),
            windows: vec![Window::H1, Window::H4],
        }
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: PathBuf,
    pub level: tracing::Level,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`TickerboardError::Config`](crate::TickerboardError::Config) if
/// a variable is set but cannot be parsed, if the enrichment cadence is
/// below the safe minimum, or if a URL list is present but empty after
/// splitting.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let rest_urls = url_list("TICKERBOARD_REST_URLS", DEFAULT_REST_URLS)?;
    let websocket_urls = url_list("TICKERBOARD_WS_URLS", DEFAULT_WS_URLS)?;

    let enrich_ms = match non_empty_var("TICKERBOARD_ENRICH_INTERVAL_MS") {
        Some(raw) => parse_u64("TICKERBOARD_ENRICH_INTERVAL_MS", &raw)?,
        None => DEFAULT_ENRICH_INTERVAL_MS,
    };
    if enrich_ms < MIN_ENRICH_INTERVAL_MS {
        return Err(crate::TickerboardError::Config(format!(
            "TICKERBOARD_ENRICH_INTERVAL_MS must be at least {MIN_ENRICH_INTERVAL_MS}, got {enrich_ms}"
        )));
    }

    let bootstrap_secs = match non_empty_var("TICKERBOARD_BOOTSTRAP_TIMEOUT_SECS") {
        Some(raw) => parse_u64("TICKERBOARD_BOOTSTRAP_TIMEOUT_SECS", &raw)?,
        None => DEFAULT_BOOTSTRAP_TIMEOUT_SECS,
    };

    let windows = match non_empty_var("TICKERBOARD_WINDOWS") {
        Some(raw) => parse_windows(&raw)?,
        None => EngineConfig::default().windows,
    };

    let file = non_empty_var("TICKERBOARD_LOG_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
    let level = match non_empty_var("TICKERBOARD_LOG_LEVEL") {
        Some(raw) => raw.parse::<tracing::Level>().map_err(|_| {
            crate::TickerboardError::Config(format!("unknown TICKERBOARD_LOG_LEVEL {raw:?}"))
        })?,
        None => tracing::Level::INFO,
    };

    Ok(AppConfig {
        exchange: ExchangeConfig {
            rest_urls,
            websocket_urls,
        },
        engine: EngineConfig {
            enrich_interval: Duration::from_millis(enrich_ms),
            bootstrap_timeout: Duration::from_secs(bootstrap_secs),
            windows,
        },
        log: LogConfig { file, level },
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn url_list(name: &str, defaults: &[&str]) -> crate::Result<Vec<String>> {
    let Some(raw) = non_empty_var(name) else {
        return Ok(defaults.iter().map(|s| s.to_string()).collect());
    };

    let urls: Vec<String> = raw
        .split(',')
        .map(|s| s.trim().trim_end_matches('/'))
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();

    if urls.is_empty() {
        return Err(crate::TickerboardError::Config(format!(
            "{name} contains no URLs"
        )));
    }
    Ok(urls)
}

fn parse_u64(name: &str, raw: &str) -> crate::Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| crate::TickerboardError::Config(format!("{name} is not a number: {raw:?}")))
}

fn parse_windows(raw: &str) -> crate::Result<Vec<Window>> {
    let mut windows = Vec::new();
    for label in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let window = Window::from_label(label).ok_or_else(|| {
            crate::TickerboardError::Config(format!("unknown window {label:?} in TICKERBOARD_WINDOWS"))
        })?;
        if !windows.contains(&window) {
            windows.push(window);
        }
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: &[&str] = &[
        "TICKERBOARD_REST_URLS",
        "TICKERBOARD_WS_URLS",
        "TICKERBOARD_ENRICH_INTERVAL_MS",
        "TICKERBOARD_BOOTSTRAP_TIMEOUT_SECS",
        "TICKERBOARD_WINDOWS",
        "TICKERBOARD_LOG_FILE",
        "TICKERBOARD_LOG_LEVEL",
    ];

    /// Serializes tests that touch process-wide environment variables.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Clears every config variable, applies `vars`, runs `f`, then restores
    /// the originals.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = ALL_VARS
            .iter()
            .map(|k| (*k, std::env::var(k).ok()))
            .collect();

        // SAFETY: ENV_LOCK keeps other config tests from reading concurrently.
        unsafe {
            for k in ALL_VARS {
                std::env::remove_var(k);
            }
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values under the same lock.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    #[test]
    fn defaults_without_env_vars() {
        with_env(&[], || {
            let config = fetch_config().unwrap();
            assert_eq!(config.exchange.rest_urls.len(), DEFAULT_REST_URLS.len());
            assert_eq!(config.exchange.rest_urls[0], "https://api.binance.com");
            assert_eq!(config.exchange.websocket_urls.len(), DEFAULT_WS_URLS.len());
            assert_eq!(config.engine.enrich_interval, Duration::from_millis(200));
            assert_eq!(config.engine.bootstrap_timeout, Duration::from_secs(10));
            assert_eq!(config.engine.windows, vec![Window::H1, Window::H4]);
            assert_eq!(config.log.level, tracing::Level::INFO);
        });
    }

    #[test]
    fn url_lists_are_split_and_trimmed() {
        with_env(
            &[(
                "TICKERBOARD_REST_URLS",
                " https://a.example.com/ , https://b.example.com,,",
            )],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(
                    config.exchange.rest_urls,
                    vec!["https://a.example.com", "https://b.example.com"]
                );
            },
        );
    }

    #[test]
    fn rejects_url_list_of_only_separators() {
        with_env(&[("TICKERBOARD_WS_URLS", ", ,")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("TICKERBOARD_WS_URLS"));
        });
    }

    #[test]
    fn rejects_enrichment_cadence_below_minimum() {
        with_env(&[("TICKERBOARD_ENRICH_INTERVAL_MS", "20")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("at least 100"));
        });
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        with_env(&[("TICKERBOARD_BOOTSTRAP_TIMEOUT_SECS", "soon")], || {
            assert!(fetch_config().is_err());
        });
    }

    #[test]
    fn parses_window_list_without_duplicates() {
        with_env(&[("TICKERBOARD_WINDOWS", "30d, 1h,7d,1h")], || {
            let config = fetch_config().unwrap();
            assert_eq!(
                config.engine.windows,
                vec![Window::D30, Window::H1, Window::D7]
            );
        });
    }

    #[test]
    fn rejects_unknown_window() {
        with_env(&[("TICKERBOARD_WINDOWS", "1h,2h")], || {
            let err = fetch_config().unwrap_err();
            assert!(err.to_string().contains("2h"));
        });
    }

    #[test]
    fn empty_values_treated_as_absent() {
        with_env(
            &[
                ("TICKERBOARD_REST_URLS", ""),
                ("TICKERBOARD_ENRICH_INTERVAL_MS", ""),
                ("TICKERBOARD_LOG_LEVEL", ""),
            ],
            || {
                let config = fetch_config().unwrap();
                assert_eq!(config.exchange.rest_urls[0], DEFAULT_REST_URLS[0]);
                assert_eq!(config.engine.enrich_interval, Duration::from_millis(200));
                assert_eq!(config.log.level, tracing::Level::INFO);
            },
        );
    }
}
