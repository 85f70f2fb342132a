//! Server settings read from the environment.
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `3001` |
//! | `FRONTEND_URL` | unset (any origin) |
//! | `HEATMAP_DEFAULT_DAYS` | `7` |
//! | `HEATMAP_OUT_OF_RANGE` | `log` |
//! | `AUDIT_DEDUP_WINDOW_SECS` | `30` |
//! | `AUDIT_DEDUP_CAPACITY` | `1024` |
//!
//! Unparseable values fall back to the default with a warning.

use chrono::Duration;
use log::warn;
use std::fmt::Display;
use std::str::FromStr;

use crate::services::audit::{AuditDedupCache, DEFAULT_DEDUP_CAPACITY, DEFAULT_DEDUP_WINDOW_SECS};
use crate::services::heatmap::{OutOfRangePolicy, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
/// Longest accepted `AUDIT_DEDUP_WINDOW_SECS` (one day).
pub const MAX_DEDUP_WINDOW_SECS: u64 = 86_400;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origin. `None` allows any origin.
    pub frontend_url: Option<String>,
    /// Heatmap window when the request has no usable `days`.
    pub heatmap_default_days: u32,
    pub heatmap_out_of_range: OutOfRangePolicy,
    pub audit_dedup_window_secs: u64,
    pub audit_dedup_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            frontend_url: None,
            heatmap_default_days: DEFAULT_WINDOW_DAYS,
            heatmap_out_of_range: OutOfRangePolicy::default(),
            audit_dedup_window_secs: DEFAULT_DEDUP_WINDOW_SECS,
            audit_dedup_capacity: DEFAULT_DEDUP_CAPACITY,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<T>() {
            Ok(value) => value,
            Err(e) => {
                warn!("Ignoring invalid {}={:?}: {}", key, raw, e);
                default
            }
        },
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);
        let frontend_url = lookup("FRONTEND_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        let mut heatmap_default_days =
            parse_or(&lookup, "HEATMAP_DEFAULT_DAYS", defaults.heatmap_default_days);
        if heatmap_default_days == 0 {
            warn!("HEATMAP_DEFAULT_DAYS must be positive, using {}", DEFAULT_WINDOW_DAYS);
            heatmap_default_days = DEFAULT_WINDOW_DAYS;
        }

        let mut audit_dedup_window_secs = parse_or(
            &lookup,
            "AUDIT_DEDUP_WINDOW_SECS",
            defaults.audit_dedup_window_secs,
        );
        if audit_dedup_window_secs > MAX_DEDUP_WINDOW_SECS {
            warn!(
                "AUDIT_DEDUP_WINDOW_SECS={} exceeds {}, using {}",
                audit_dedup_window_secs, MAX_DEDUP_WINDOW_SECS, DEFAULT_DEDUP_WINDOW_SECS
            );
            audit_dedup_window_secs = DEFAULT_DEDUP_WINDOW_SECS;
        }

        Self {
            host,
            port: parse_or(&lookup, "PORT", defaults.port),
            frontend_url,
            heatmap_default_days: heatmap_default_days.min(MAX_WINDOW_DAYS),
            heatmap_out_of_range: parse_or(
                &lookup,
                "HEATMAP_OUT_OF_RANGE",
                defaults.heatmap_out_of_range,
            ),
            audit_dedup_window_secs,
            audit_dedup_capacity: parse_or(
                &lookup,
                "AUDIT_DEDUP_CAPACITY",
                defaults.audit_dedup_capacity,
            ),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Empty dedup cache sized from these settings.
    pub fn audit_dedup_cache(&self) -> AuditDedupCache {
        let window = i64::try_from(self.audit_dedup_window_secs)
            .ok()
            .filter(|secs| *secs <= MAX_DEDUP_WINDOW_SECS as i64)
            .and_then(Duration::try_seconds)
            .unwrap_or_else(|| {
                warn!(
                    "Audit dedup window {}s out of range, using {}s",
                    self.audit_dedup_window_secs, DEFAULT_DEDUP_WINDOW_SECS
                );
                Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS as i64)
            });
        AuditDedupCache::new(window, self.audit_dedup_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:3001");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("FRONTEND_URL", "http://localhost:3000/"),
            ("HEATMAP_DEFAULT_DAYS", "14"),
            ("HEATMAP_OUT_OF_RANGE", "ignore"),
            ("AUDIT_DEDUP_WINDOW_SECS", "5"),
            ("AUDIT_DEDUP_CAPACITY", "8"),
        ]));
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.frontend_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.heatmap_default_days, 14);
        assert_eq!(config.heatmap_out_of_range, OutOfRangePolicy::Ignore);
        assert_eq!(config.audit_dedup_cache().window(), Duration::seconds(5));
        assert_eq!(config.audit_dedup_capacity, 8);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "not-a-port"),
            ("HEATMAP_DEFAULT_DAYS", "0"),
            ("HEATMAP_OUT_OF_RANGE", "explode"),
            ("AUDIT_DEDUP_CAPACITY", "-1"),
        ]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.heatmap_default_days, DEFAULT_WINDOW_DAYS);
        assert_eq!(config.heatmap_out_of_range, OutOfRangePolicy::Log);
        assert_eq!(config.audit_dedup_capacity, DEFAULT_DEDUP_CAPACITY);
    }

    #[test]
    fn test_oversized_dedup_window_falls_back() {
        let config = ServerConfig::from_lookup(lookup(&[(
            "AUDIT_DEDUP_WINDOW_SECS",
            "9223372036854775807",
        )]));
        assert_eq!(config.audit_dedup_window_secs, DEFAULT_DEDUP_WINDOW_SECS);
        assert_eq!(
            config.audit_dedup_cache().window(),
            Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS as i64)
        );

        let config = ServerConfig::from_lookup(lookup(&[("AUDIT_DEDUP_WINDOW_SECS", "86400")]));
        assert_eq!(config.audit_dedup_cache().window(), Duration::days(1));
    }

    #[test]
    fn test_dedup_cache_never_panics_on_direct_settings() {
        let config = ServerConfig {
            audit_dedup_window_secs: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            config.audit_dedup_cache().window(),
            Duration::seconds(DEFAULT_DEDUP_WINDOW_SECS as i64)
        );
    }
}
