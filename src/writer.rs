//! The response sink every [`Endpoint`](crate::Endpoint) writes into.
//!
//! Handlers return a [`Response`](crate::Response) value. Somebody still has
//! to push its status, headers and bytes *somewhere*: the router does that
//! through [`ResponseWriter`], and middleware can slip its own writer in
//! between (see [`StatusWriter`](crate::StatusWriter)).

use std::io;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use tracing::warn;

/// The capability set of an outgoing response.
///
/// `Send` is a supertrait so `&mut dyn ResponseWriter` can be held across
/// `.await` points inside a spawned request task.
pub trait ResponseWriter: Send {
    /// Sets the response status. Must come before the first body write to
    /// take effect; implementations decide what a late call means.
    fn write_status(&mut self, status: StatusCode);

    fn append_header(&mut self, name: &str, value: &str);

    /// Writes body bytes and returns how many were accepted. Accepting only
    /// a prefix of `buf` is allowed, exactly like [`std::io::Write::write`].
    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;
}

/// In-memory response sink used by the server for every request.
///
/// The first body write without an explicit status commits `200 OK`, after
/// which further status changes are ignored, the same rule a streaming
/// HTTP/1.1 writer is bound by.
#[derive(Debug, Default)]
pub struct ResponseBuffer {
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status committed so far, if any.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Converts the buffered response into what hyper sends on the wire.
    ///
    /// A buffer nobody wrote to becomes an empty `200 OK`. Headers that are
    /// not valid HTTP tokens are dropped with a warning rather than failing
    /// the whole response.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status.unwrap_or(StatusCode::OK);

        let headers = res.headers_mut();
        for (name, value) in self.headers {
            match (HeaderName::try_from(name.as_str()), HeaderValue::try_from(value.as_str())) {
                (Ok(n), Ok(v)) => {
                    headers.append(n, v);
                }
                _ => warn!(header = %name, "dropping invalid response header"),
            }
        }
        res
    }
}

impl ResponseWriter for ResponseBuffer {
    fn write_status(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn append_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }
}
