//! Environment configuration helpers.
//!
//! Every typed config struct in the workspace reads its values through
//! [`Env`], so tests can feed a fixed set of pairs instead of mutating the
//! process environment.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required environment variable `{0}` is not set")]
    Missing(String),

    #[error("environment variable `{key}` has an invalid value `{value}`")]
    Invalid { key: String, value: String },
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Source of configuration values.
pub struct Env {
    lookup: Lookup,
}

impl Env {
    /// Reads from the process environment.
    pub fn process() -> Self {
        Self {
            lookup: Box::new(|key| std::env::var(key).ok()),
        }
    }

    /// Reads from a fixed set of pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            lookup: Box::new(move |key| map.get(key).cloned()),
        }
    }

    /// Trimmed value; blank counts as unset.
    pub fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    pub fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Accepts `1/0`, `true/false`, `yes/no`, `on/off`.
    pub fn flag_or(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key: key.to_string(),
                value: raw,
            }),
        }
    }

    /// Comma separated list, empty entries dropped.
    pub fn list(&self, key: &str) -> Vec<String> {
        self.get(key)
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_values_are_unset() {
        let env = Env::from_pairs([("A", "  "), ("B", " x ")]);
        assert_eq!(env.get("A"), None);
        assert_eq!(env.get("B"), Some("x".to_string()));
        assert_eq!(env.require("A"), Err(ConfigError::Missing("A".into())));
    }

    #[test]
    fn parse_or_falls_back_and_reports_garbage() {
        let env = Env::from_pairs([("PORT", "8080"), ("TTL", "soon")]);
        assert_eq!(env.parse_or("PORT", 3000u16).unwrap(), 8080);
        assert_eq!(env.parse_or("MISSING", 3000u16).unwrap(), 3000);
        assert!(matches!(
            env.parse_or("TTL", 1u64),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn flags() {
        let env = Env::from_pairs([("ON", "Yes"), ("OFF", "0"), ("BAD", "maybe")]);
        assert!(env.flag_or("ON", false).unwrap());
        assert!(!env.flag_or("OFF", true).unwrap());
        assert!(env.flag_or("UNSET", true).unwrap());
        assert!(env.flag_or("BAD", true).is_err());
    }

    #[test]
    fn lists() {
        let env = Env::from_pairs([("ORIGINS", "http://a.test, ,http://b.test")]);
        assert_eq!(env.list("ORIGINS"), vec!["http://a.test", "http://b.test"]);
        assert!(env.list("NONE").is_empty());
    }
}
