//! Static files: `/assets/…`, `/robots.txt` and the two favicons.
//!
//! ```rust,no_run
//! use waymark::{Assets, Router};
//!
//! let app = Assets::new("./assets").routes(Router::new());
//! ```
//!
//! | Route | File |
//! |---|---|
//! | `GET`/`HEAD /assets/{*path}` | `<root>/<path>` (percent-decoded) |
//! | `GET`/`HEAD /robots.txt` | `<root>/robots.txt` |
//! | `GET`/`HEAD /favicon.ico` | `<root>/favicon.ico` |
//! | `GET`/`HEAD /favicon.png` | `<root>/favicon.png` |
//!
//! Every hit carries `Last-Modified`; a request whose `If-Modified-Since`
//! is not older than the file gets `304 Not Modified` and no body, so
//! browsers and proxies can cache. Files are read whole; directories are
//! never listed.

use std::borrow::Cow;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use tracing::error;

use crate::error::Error;
use crate::handler::Handler;
use crate::request::Request;
use crate::response::{ContentType, Response};
use crate::router::Router;

/// RFC 9110 IMF-fixdate, always GMT.
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A directory of static files.
#[derive(Clone, Debug)]
pub struct Assets {
    root: Arc<PathBuf>,
}

/// A file read from the asset root.
struct Asset {
    body: Vec<u8>,
    content_type: ContentType,
    modified: Option<DateTime<Utc>>,
}

impl Assets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: Arc::new(root.into()) }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads `path` (relative to the root, already decoded) into a `200 OK`
    /// response with a content type guessed from the extension and a
    /// `Last-Modified` header.
    ///
    /// Missing files, directories and paths that try to leave the root are
    /// all [`Error::NotFound`]; the caller cannot tell them apart.
    pub async fn load(&self, path: &str) -> Result<Response, Error> {
        Ok(self.read(path).await?.into_response())
    }

    async fn read(&self, path: &str) -> Result<Asset, Error> {
        let not_found = || Error::NotFound(path.to_owned());

        let file = confine(&self.root, path).ok_or_else(not_found)?;
        let meta = tokio::fs::metadata(&file).await.map_err(|_| not_found())?;
        if !meta.is_file() {
            return Err(not_found());
        }

        let body = tokio::fs::read(&file).await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => not_found(),
            _ => Error::Io(e),
        })?;

        let content_type = file.extension()
            .and_then(OsStr::to_str)
            .map_or(ContentType::OctetStream, ContentType::from_extension);

        Ok(Asset { body, content_type, modified: meta.modified().ok().map(DateTime::from) })
    }

    /// Registers the asset routes on `router`, each for `GET` and `HEAD`.
    pub fn routes(self, router: Router) -> Router {
        let tree = self.clone();
        let tree = move |req: Request| {
            let assets = tree.clone();
            async move {
                match decode(req.param("path").unwrap_or("")) {
                    Some(path) => assets.respond(&req, &path).await,
                    None => Response::status(StatusCode::NOT_FOUND),
                }
            }
        };

        let mut router = router
            .on(Method::GET, "/assets/{*path}", tree.clone())
            .on(Method::HEAD, "/assets/{*path}", tree);
        for file in ["robots.txt", "favicon.ico", "favicon.png"] {
            let route = format!("/{file}");
            router = router
                .on(Method::GET, &route, fixed(self.clone(), file))
                .on(Method::HEAD, &route, fixed(self.clone(), file));
        }
        router
    }

    /// Full request handling: conditional GET, HEAD, and error mapping.
    async fn respond(&self, req: &Request, path: &str) -> Response {
        let asset = match self.read(path).await {
            Ok(asset) => asset,
            Err(Error::NotFound(_)) => return Response::status(StatusCode::NOT_FOUND),
            Err(e) => {
                error!(path, "asset read failed: {e}");
                return Response::status(StatusCode::INTERNAL_SERVER_ERROR);
            }
        };

        if let Some(modified) = asset.modified {
            if unmodified_since(req.header("if-modified-since"), modified) {
                return Response::builder()
                    .status(StatusCode::NOT_MODIFIED)
                    .header("last-modified", &http_date(modified))
                    .no_body();
            }
        }

        let res = asset.into_response();
        if req.method() == Method::HEAD { res.into_head() } else { res }
    }
}

impl Asset {
    fn into_response(self) -> Response {
        let mut builder = Response::builder();
        if let Some(modified) = self.modified {
            builder = builder.header("last-modified", &http_date(modified));
        }
        builder.bytes(self.content_type, self.body)
    }
}

fn fixed(assets: Assets, file: &'static str) -> impl Handler {
    move |req: Request| {
        let assets = assets.clone();
        async move { assets.respond(&req, file).await }
    }
}

/// Serves `dir/file` for `req`: `404 Not Found` if it does not exist, `304`
/// if the client's copy is current, headers only for `HEAD`.
pub async fn serve_content(req: &Request, dir: impl AsRef<Path>, file: &str) -> Response {
    Assets::new(dir.as_ref()).respond(req, file).await
}

/// Percent-decodes a URL path. Invalid UTF-8 after decoding is unservable.
fn decode(path: &str) -> Option<Cow<'_, str>> {
    percent_decode_str(path).decode_utf8().ok()
}

/// Joins `path` onto `root`, refusing anything that could step outside it.
fn confine(root: &Path, path: &str) -> Option<PathBuf> {
    let mut out = root.to_path_buf();
    for part in Path::new(path.trim_start_matches('/')).components() {
        match part {
            Component::Normal(seg) => out.push(seg),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(out)
}

fn http_date(t: DateTime<Utc>) -> String {
    t.format(HTTP_DATE).to_string()
}

/// `If-Modified-Since` has one-second resolution; an unparsable value is
/// ignored, as if absent.
fn unmodified_since(header: Option<&str>, modified: DateTime<Utc>) -> bool {
    match header.and_then(|h| DateTime::parse_from_rfc2822(h).ok()) {
        Some(since) => modified.timestamp() <= since.timestamp(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confine_rejects_parent_components() {
        let root = Path::new("/srv/assets");
        assert_eq!(confine(root, "css/site.css"), Some(root.join("css/site.css")));
        assert_eq!(confine(root, "/./css/site.css"), Some(root.join("css/site.css")));
        assert_eq!(confine(root, "../secret"), None);
        assert_eq!(confine(root, "css/../../secret"), None);
    }

    #[test]
    fn decoded_dot_dot_is_still_rejected() {
        let root = Path::new("/srv/assets");
        let path = decode("%2e%2e/secret").unwrap();
        assert_eq!(path, "../secret");
        assert_eq!(confine(root, &path), None);
        assert_eq!(decode("my%20file.css").unwrap(), "my file.css");
        assert_eq!(decode("%ff"), None);
    }

    #[test]
    fn http_date_format() {
        let t = DateTime::from_timestamp(1_136_214_245, 0).unwrap();
        assert_eq!(http_date(t), "Mon, 02 Jan 2006 15:04:05 GMT");
    }

    #[test]
    fn if_modified_since_comparison() {
        let t = DateTime::from_timestamp(1_136_214_245, 0).unwrap();
        assert!(unmodified_since(Some("Mon, 02 Jan 2006 15:04:05 GMT"), t));
        assert!(unmodified_since(Some("Tue, 03 Jan 2006 00:00:00 GMT"), t));
        assert!(!unmodified_since(Some("Mon, 02 Jan 2006 15:04:04 GMT"), t));
        assert!(!unmodified_since(Some("yesterday"), t));
        assert!(!unmodified_since(None, t));
    }
}
