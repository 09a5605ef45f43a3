//! Unified error type.

use std::net::AddrParseError;
use std::path::PathBuf;

/// The error type returned by waymark's fallible operations.
///
/// Application-level outcomes (404, 422, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values. This type surfaces the failures a
/// caller has to decide about: binding a port, opening the access log,
/// drawing entropy, finding an asset, reading configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid listen address: {0}")]
    Addr(#[from] AddrParseError),

    /// The access log destination could not be opened for append.
    #[error("log sink {} unavailable: {source}", .path.display())]
    SinkUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The OS random source could not fill the requested number of bytes.
    #[error("insufficient entropy for {requested} random bytes: {source}")]
    InsufficientEntropy {
        requested: usize,
        #[source]
        source: rand::Error,
    },

    /// A static asset does not exist or is not servable.
    #[error("not found: {0}")]
    NotFound(String),

    #[error("config {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config: {0}")]
    Config(#[from] toml::de::Error),
}
