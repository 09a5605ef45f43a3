//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file) is valid:
//!
//! ```toml
//! listen = "0.0.0.0:3000"
//! assets = "./assets"
//!
//! [access_log]
//! path = "./http.log"
//! debug = false
//! on_sink_error = "fallback"   # or "fail"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Error;

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// `host:port` the server binds to.
    pub listen: String,
    /// Directory served under `/assets/`, `/robots.txt` and `/favicon.*`.
    pub assets: PathBuf,
    pub access_log: AccessLogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_owned(),
            assets: PathBuf::from("./assets"),
            access_log: AccessLogConfig::default(),
        }
    }
}

impl Config {
    pub fn from_toml(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|source| Error::ConfigRead { path: path.to_path_buf(), source })?;
        Self::from_toml(&content)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AccessLogConfig {
    /// Append-only log file.
    pub path: PathBuf,
    /// Mirror every record to `tracing` at debug level and time the
    /// downstream call.
    pub debug: bool,
    pub on_sink_error: SinkPolicy,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./http.log"),
            debug: false,
            on_sink_error: SinkPolicy::default(),
        }
    }
}

/// What to do when the log file cannot be opened at startup.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SinkPolicy {
    /// Warn and write records to stderr instead. Requests are unaffected.
    #[default]
    Fallback,
    /// Refuse to start: the caller gets [`Error::SinkUnavailable`].
    Fail,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_all_defaults() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
        assert_eq!(Config::default().access_log.path, PathBuf::from("./http.log"));
    }

    #[test]
    fn partial_override() {
        let config = Config::from_toml(
            r#"
            listen = "127.0.0.1:8080"

            [access_log]
            debug = true
            on_sink_error = "fail"
            "#,
        )
        .unwrap();

        assert_eq!(config.listen, "127.0.0.1:8080");
        assert_eq!(config.assets, PathBuf::from("./assets"));
        assert!(config.access_log.debug);
        assert_eq!(config.access_log.on_sink_error, SinkPolicy::Fail);
        assert_eq!(config.access_log.path, PathBuf::from("./http.log"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = Config::from_toml("lisen = \"oops\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = Config::load("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.toml"));
    }
}
