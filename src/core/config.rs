//! Runtime configuration
//!
//! Values come from the process environment (optionally seeded from a `.env`
//! file by the binary) and are overridden by command-line flags. Generator
//! credentials are carried here and handed to the generator constructors;
//! nothing below the binary reads the environment.

use std::path::PathBuf;
use std::time::Duration;

use super::paths::DataPaths;
use crate::error::{Error, Result};
use crate::generator::openai::{OpenAiConfig, DEFAULT_CHAT_MODEL, DEFAULT_EMBED_MODEL, DEFAULT_OPENAI_URL};

/// Deadline applied to every embedding or summarization call
pub const DEFAULT_GENERATOR_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Config {
    pub paths: DataPaths,

    /// `None` when no API key is configured; the offline embedder is used and
    /// summarization is unavailable
    pub openai: Option<OpenAiConfig>,

    pub generator_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let paths = match lookup("PKB_DATA_DIR").filter(|v| !v.is_empty()) {
            Some(dir) => DataPaths::from_root(PathBuf::from(dir)),
            None => DataPaths::new(),
        };
        let paths = match lookup("PKB_DB").filter(|v| !v.is_empty()) {
            Some(db) => paths.with_database(&PathBuf::from(db)),
            None => paths,
        };

        let generator_timeout = match lookup("PKB_GENERATOR_TIMEOUT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_GENERATOR_TIMEOUT_SECS),
        };

        let openai = lookup("OPENAI_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .map(|api_key| OpenAiConfig {
                base_url: lookup("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
                api_key,
                embed_model: lookup("OPENAI_EMBED_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
                chat_model: lookup("OPENAI_CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
                timeout: generator_timeout,
            });

        Ok(Self {
            paths,
            openai,
            generator_timeout,
        })
    }
}

/// Whole seconds, at least one
fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(Error::Config("PKB_GENERATOR_TIMEOUT must be at least 1 second".to_string())),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(Error::Config(format!("PKB_GENERATOR_TIMEOUT {raw:?} is not a number of seconds: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_key() {
        let config = Config::from_lookup(lookup_from(&[("PKB_DATA_DIR", "/tmp/kb")])).unwrap();
        assert_eq!(config.paths.database, PathBuf::from("/tmp/kb/pkb.db"));
        assert!(config.openai.is_none());
        assert_eq!(config.generator_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_openai_settings() {
        let config = Config::from_lookup(lookup_from(&[
            ("PKB_DATA_DIR", "/tmp/kb"),
            ("PKB_DB", "/tmp/elsewhere.db"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_EMBED_MODEL", "text-embedding-3-small"),
            ("PKB_GENERATOR_TIMEOUT", "5"),
        ]))
        .unwrap();

        assert_eq!(config.paths.database, PathBuf::from("/tmp/elsewhere.db"));
        let openai = config.openai.expect("api key configured");
        assert_eq!(openai.api_key, "sk-test");
        assert_eq!(openai.embed_model, "text-embedding-3-small");
        assert_eq!(openai.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(openai.base_url, DEFAULT_OPENAI_URL);
        assert_eq!(openai.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_key_is_ignored() {
        let config = Config::from_lookup(lookup_from(&[("OPENAI_API_KEY", "  ")])).unwrap();
        assert!(config.openai.is_none());
    }

    #[test]
    fn test_bad_timeout_is_rejected() {
        for raw in ["abc", "0", "-5", "1.5"] {
            let result = Config::from_lookup(lookup_from(&[("PKB_GENERATOR_TIMEOUT", raw)]));
            assert!(matches!(result, Err(Error::Config(_))), "timeout {raw:?}");
        }

        let config = Config::from_lookup(lookup_from(&[("PKB_GENERATOR_TIMEOUT", " 12 ")])).unwrap();
        assert_eq!(config.generator_timeout, Duration::from_secs(12));
    }
}
