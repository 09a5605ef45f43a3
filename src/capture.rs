//! Status and size capture for outgoing responses.
//!
//! [`StatusWriter`] sits between an endpoint and the real response sink and
//! remembers two things: which status went out, and how many body bytes the
//! sink actually accepted. It adds, drops and reorders nothing.

use std::io;

use http::StatusCode;

use crate::writer::ResponseWriter;

/// Observing decorator over any [`ResponseWriter`].
///
/// Borrows the underlying sink for as long as the request is being served,
/// so it is created fresh per request and cannot outlive it.
pub struct StatusWriter<'a, W: ?Sized> {
    inner: &'a mut W,
    status: Option<StatusCode>,
    size: usize,
}

impl<'a, W: ResponseWriter + ?Sized> StatusWriter<'a, W> {
    pub fn new(inner: &'a mut W) -> Self {
        Self { inner, status: None, size: 0 }
    }

    /// The first status observed: explicit, or the implicit `200 OK`
    /// committed by a body write. `None` if neither happened.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Body bytes accepted by the underlying sink so far.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl<W: ResponseWriter + ?Sized> ResponseWriter for StatusWriter<'_, W> {
    fn write_status(&mut self, status: StatusCode) {
        self.status.get_or_insert(status);
        self.inner.write_status(status);
    }

    fn append_header(&mut self, name: &str, value: &str) {
        self.inner.append_header(name, value);
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.get_or_insert(StatusCode::OK);
        let written = self.inner.write(buf)?;
        self.size += written;
        Ok(written)
    }
}
