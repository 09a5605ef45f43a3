//! Per-request access log.
//!
//! Two lines per request, written synchronously from the request's own task:
//!
//! ```text
//! 2026/10/19 14:03:11.042 HTTP: Started GET "/users/42" |Host: "api.example.com" |RawURL: "" |UserAgent: "curl/8.5.0" |Scheme: https:// |IP: "203.0.113.9" from 10.0.0.2:51544
//! 2026/10/19 14:03:11.045 HTTP: Returning 200 for "/users/42" in 2.871ms (27 bytes)
//! ```
//!
//! If the request future is dropped before the downstream endpoint finishes
//! (client hang-up, timeout, shutdown) the second line is
//! `Aborted "/users/42" after …` instead.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use http::{Method, StatusCode};
use tracing::{debug, error, warn};

use crate::capture::StatusWriter;
use crate::config::{AccessLogConfig, SinkPolicy};
use crate::error::Error;
use crate::handler::{BoxFuture, Endpoint};
use crate::middleware::sink::{FileSink, LogSink, StderrSink};
use crate::request::Request;
use crate::scheme::Scheme;
use crate::timing::Timer;
use crate::writer::ResponseWriter;

const RAW_URL: &str = "x-raw-url";
const FORWARDED_FOR: &str = "x-forwarded-for";

/// Access-logging middleware around any [`Endpoint`].
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use waymark::middleware::{AccessLog, FileSink};
/// use waymark::{Router, Server};
///
/// # async fn run() -> Result<(), waymark::Error> {
/// let app = AccessLog::new(Router::new(), Arc::new(FileSink::open("./http.log")?));
/// Server::bind("0.0.0.0:3000")?.serve(app).await
/// # }
/// ```
pub struct AccessLog<E> {
    inner: E,
    recorder: Recorder,
}

impl<E: Endpoint> AccessLog<E> {
    pub fn new(inner: E, sink: Arc<dyn LogSink>) -> Self {
        Self {
            inner,
            recorder: Recorder { sink, fallback: Arc::new(StderrSink), debug: false },
        }
    }

    /// Opens the configured log file, applying `on_sink_error` if that fails.
    pub fn from_config(inner: E, config: &AccessLogConfig) -> Result<Self, Error> {
        let sink: Arc<dyn LogSink> = match FileSink::open(&config.path) {
            Ok(file) => Arc::new(file),
            Err(e) => match config.on_sink_error {
                SinkPolicy::Fail => return Err(e),
                SinkPolicy::Fallback => {
                    warn!("{e}; access log records go to stderr");
                    Arc::new(StderrSink)
                }
            },
        };
        Ok(Self::new(inner, sink).debug(config.debug))
    }

    /// Mirror records to `tracing` (target `waymark::access`) and time the
    /// downstream call.
    pub fn debug(mut self, enabled: bool) -> Self {
        self.recorder.debug = enabled;
        self
    }

    /// Where records go when the primary sink rejects them. Stderr by default.
    pub fn fallback(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.recorder.fallback = sink;
        self
    }
}

impl<E: Endpoint> Endpoint for AccessLog<E> {
    fn serve<'a>(&'a self, req: Request, res: &'a mut dyn ResponseWriter) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            let in_flight = self.recorder.start(&req);
            let mut writer = StatusWriter::new(res);
            {
                let _timer = Timer::start("downstream", self.recorder.debug);
                self.inner.serve(req, &mut writer).await;
            }
            in_flight.finish(writer.status(), writer.size());
        })
    }
}

// ── Recorder ──────────────────────────────────────────────────────────────────

struct Recorder {
    sink: Arc<dyn LogSink>,
    fallback: Arc<dyn LogSink>,
    debug: bool,
}

impl Recorder {
    fn start(&self, req: &Request) -> InFlight<'_> {
        let url = req.uri().to_string();
        let start = Instant::now();

        self.emit(&Record::Started {
            method: req.method(),
            url: &url,
            host: req.host().unwrap_or(""),
            raw_url: req.header(RAW_URL).unwrap_or(""),
            user_agent: req.header("user-agent").unwrap_or(""),
            scheme: req.scheme(),
            forwarded_for: req.header(FORWARDED_FOR).unwrap_or(""),
            remote: req.remote_addr(),
        });

        InFlight { recorder: self, url, start, finished: false }
    }

    /// Appends one record. Never fails the request: a rejected append goes
    /// to the fallback, and a rejected fallback is reported to `tracing`.
    fn emit(&self, record: &Record<'_>) {
        let line = format!(
            "{} HTTP: {record}",
            chrono::Local::now().format("%Y/%m/%d %H:%M:%S%.3f"),
        );

        if self.debug {
            debug!(target: "waymark::access", "{line}");
        }

        if let Err(e) = self.sink.append(&line) {
            warn!("access log append failed, using fallback: {e}");
            if let Err(e) = self.fallback.append(&line) {
                error!("access log fallback failed, record lost: {e}");
            }
        }
    }
}

/// The end-of-request half of a log pair.
///
/// Writes `Returning` via [`finish`](InFlight::finish), or `Aborted` when
/// dropped without it.
struct InFlight<'a> {
    recorder: &'a Recorder,
    url: String,
    start: Instant,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, status: Option<StatusCode>, size: usize) {
        self.finished = true;
        self.recorder.emit(&Record::Returning {
            status,
            url: &self.url,
            elapsed: self.start.elapsed(),
            size,
        });
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.recorder.emit(&Record::Aborted { url: &self.url, elapsed: self.start.elapsed() });
        }
    }
}

// ── Record ────────────────────────────────────────────────────────────────────

/// One access-log line, minus timestamp and prefix.
///
/// Header-derived fields are Debug-quoted: a hostile `User-Agent` can not
/// break a record across lines or fake a field separator.
enum Record<'a> {
    Started {
        method: &'a Method,
        url: &'a str,
        host: &'a str,
        raw_url: &'a str,
        user_agent: &'a str,
        scheme: Scheme,
        forwarded_for: &'a str,
        remote: Option<SocketAddr>,
    },
    Returning {
        status: Option<StatusCode>,
        url: &'a str,
        elapsed: Duration,
        size: usize,
    },
    Aborted {
        url: &'a str,
        elapsed: Duration,
    },
}

impl fmt::Display for Record<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started { method, url, host, raw_url, user_agent, scheme, forwarded_for, remote } => {
                write!(
                    f,
                    "Started {method} {url:?} |Host: {host:?} |RawURL: {raw_url:?} \
                     |UserAgent: {user_agent:?} |Scheme: {} |IP: {forwarded_for:?} from ",
                    scheme.prefix(),
                )?;
                match remote {
                    Some(addr) => write!(f, "{addr}"),
                    None => f.write_str("-"),
                }
            }
            Self::Returning { status, url, elapsed, size } => {
                f.write_str("Returning ")?;
                match status {
                    Some(code) => write!(f, "{}", code.as_u16())?,
                    None => f.write_str("-")?,
                }
                write!(f, " for {url:?} in {:.3}ms ({size} bytes)", millis(*elapsed))
            }
            Self::Aborted { url, elapsed } => {
                write!(f, "Aborted {url:?} after {:.3}ms", millis(*elapsed))
            }
        }
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::sink::MemorySink;
    use crate::response::Response;
    use crate::router::Router;
    use crate::writer::ResponseBuffer;
    use bytes::Bytes;
    use std::io;

    struct Broken;

    impl LogSink for Broken {
        fn append(&self, _: &str) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    fn request(uri: &str) -> Request {
        http::Request::builder()
            .uri(uri)
            .header("host", "example.com")
            .header("user-agent", "test \"agent\"")
            .header("x-forwarded-for", "203.0.113.9")
            .header("x-forwarded-proto", "https")
            .header("x-raw-url", "/raw")
            .body(Bytes::new())
            .unwrap()
            .into()
    }

    fn app() -> Router {
        Router::new()
            .get("/hello", |_req: Request| async { "hello" })
            .get("/gone", |_req: Request| async { StatusCode::GONE })
            .get("/hang", |_req: Request| async {
                std::future::pending::<()>().await;
                Response::text("never")
            })
    }

    /// Strips the timestamp, keeping everything after `HTTP: `.
    fn body(line: &str) -> &str {
        line.split_once(" HTTP: ").map(|(_, rest)| rest).unwrap()
    }

    #[tokio::test]
    async fn start_record_fields() {
        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), memory.clone());

        let req = request("/hello?x=1").with_remote_addr("10.0.0.2:5000".parse().unwrap());
        log.serve(req, &mut ResponseBuffer::new()).await;

        let lines = memory.lines();
        assert_eq!(
            body(&lines[0]),
            r#"Started GET "/hello?x=1" |Host: "example.com" |RawURL: "/raw" |UserAgent: "test \"agent\"" |Scheme: https:// |IP: "203.0.113.9" from 10.0.0.2:5000"#,
        );
    }

    #[tokio::test]
    async fn end_record_has_status_and_size() {
        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), memory.clone());

        let mut buf = ResponseBuffer::new();
        log.serve(request("/hello"), &mut buf).await;
        log.serve(request("/gone"), &mut ResponseBuffer::new()).await;

        let lines = memory.lines();
        assert_eq!(lines.len(), 4);
        assert!(body(&lines[1]).starts_with(r#"Returning 200 for "/hello" in "#), "{}", lines[1]);
        assert!(lines[1].ends_with("ms (5 bytes)"), "{}", lines[1]);
        assert!(body(&lines[3]).starts_with(r#"Returning 410 for "/gone" in "#), "{}", lines[3]);
        assert!(lines[3].ends_with("(0 bytes)"));
        assert_eq!(buf.body(), b"hello");
    }

    #[tokio::test]
    async fn missing_headers_and_peer() {
        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), memory.clone());

        let req: Request = http::Request::builder().uri("/hello").body(Bytes::new()).unwrap().into();
        log.serve(req, &mut ResponseBuffer::new()).await;

        assert_eq!(
            body(&memory.lines()[0]),
            r#"Started GET "/hello" |Host: "" |RawURL: "" |UserAgent: "" |Scheme: http:// |IP: "" from -"#,
        );
    }

    #[tokio::test]
    async fn dropped_request_logs_aborted() {
        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), memory.clone());

        let mut buf = ResponseBuffer::new();
        let timed_out = tokio::time::timeout(
            Duration::from_millis(20),
            log.serve(request("/hang"), &mut buf),
        )
        .await;
        assert!(timed_out.is_err());

        let lines = memory.lines();
        assert_eq!(lines.len(), 2);
        assert!(body(&lines[1]).starts_with(r#"Aborted "/hang" after "#), "{}", lines[1]);
    }

    #[tokio::test]
    async fn failing_sink_falls_back_and_request_still_served() {
        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), Arc::new(Broken)).fallback(memory.clone());

        let mut buf = ResponseBuffer::new();
        log.serve(request("/hello"), &mut buf).await;

        assert_eq!(buf.status(), Some(StatusCode::OK));
        assert_eq!(buf.body(), b"hello");
        assert_eq!(memory.lines().len(), 2);
    }

    #[test]
    fn sink_policy_fail_surfaces_the_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = AccessLogConfig {
            path: dir.path().to_path_buf(),
            on_sink_error: SinkPolicy::Fail,
            ..AccessLogConfig::default()
        };
        let err = AccessLog::from_config(Router::new(), &config).err().unwrap();
        assert!(matches!(err, Error::SinkUnavailable { .. }));
    }

    #[test]
    fn sink_policy_fallback_keeps_going() {
        let dir = tempfile::tempdir().unwrap();
        let config = AccessLogConfig {
            path: dir.path().to_path_buf(),
            ..AccessLogConfig::default()
        };
        assert!(AccessLog::from_config(Router::new(), &config).is_ok());
    }

    /// Collects formatted `tracing` output.
    #[derive(Clone, Default)]
    struct Captured(Arc<std::sync::Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Serves `/hello` once and returns the `tracing` output and sink records.
    async fn traced(debug: bool) -> (String, Vec<String>) {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let memory = Arc::new(MemorySink::new());
        let log = AccessLog::new(app(), memory.clone()).debug(debug);
        log.serve(request("/hello"), &mut ResponseBuffer::new()).await;

        let text = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        (text, memory.lines())
    }

    #[tokio::test]
    async fn debug_mirrors_records_and_times_downstream() {
        let (text, lines) = traced(true).await;

        assert!(text.contains("waymark::access"), "{text}");
        assert!(text.contains(r#"HTTP: Started GET "/hello""#), "{text}");
        assert!(text.contains(r#"HTTP: Returning 200 for "/hello""#), "{text}");
        assert!(text.contains("[timer] downstream took"), "{text}");

        // the sink sees exactly what it would without debug
        assert_eq!(lines.len(), 2);
        assert!(body(&lines[0]).starts_with(r#"Started GET "/hello" "#), "{}", lines[0]);
        assert!(body(&lines[1]).starts_with(r#"Returning 200 for "/hello" in "#), "{}", lines[1]);
    }

    #[tokio::test]
    async fn no_mirroring_without_debug() {
        let (text, lines) = traced(false).await;

        assert!(!text.contains("waymark::access"), "{text}");
        assert!(!text.contains("[timer]"), "{text}");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn unset_status_prints_dash() {
        let record = Record::Returning {
            status: None,
            url: "/x",
            elapsed: Duration::from_micros(1500),
            size: 0,
        };
        assert_eq!(record.to_string(), r#"Returning - for "/x" in 1.500ms (0 bytes)"#);
    }
}
