//! Request scheme as seen by the client, not by us.
//!
//! Behind nginx every connection we accept is plain HTTP, so the URI never
//! tells us whether the client spoke TLS. The proxy does, in
//! `X-Forwarded-Proto`, and we believe it. Never use this for security
//! decisions on a port that is reachable without the proxy in front.

use std::fmt;

use http::HeaderMap;

use crate::request::Request;

/// The trusted forwarding header.
pub const FORWARDED_PROTO: &str = "x-forwarded-proto";

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http  => "http",
            Self::Https => "https",
        }
    }

    /// `"http://"` or `"https://"`, ready to prepend to a host.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Http  => "http://",
            Self::Https => "https://",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the scheme from `X-Forwarded-Proto`.
///
/// Chained proxies append to the header, so only the first element counts.
/// Anything other than `https` (absent, empty, garbage) is plain `http`.
pub fn resolve(headers: &HeaderMap) -> Scheme {
    let first = headers.get(FORWARDED_PROTO)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .unwrap_or("");

    if first.eq_ignore_ascii_case("https") { Scheme::Https } else { Scheme::Http }
}

/// Absolute URL of `req` as the client addressed it, e.g.
/// `https://example.com/users/42?tab=1`. Missing `Host` yields an empty host.
pub fn absolute_url(req: &Request) -> String {
    let path = req.uri().path_and_query().map_or("/", |pq| pq.as_str());
    format!("{}{}{}", req.scheme().prefix(), req.host().unwrap_or(""), path)
}
