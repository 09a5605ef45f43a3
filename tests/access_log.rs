//! Access log behaviour end to end: router + middleware + real sinks.
//!
//! Requests are fed straight into the endpoint with an in-memory response
//! buffer, no TCP involved.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use http::StatusCode;
use waymark::middleware::{AccessLog, FileSink, MemorySink};
use waymark::{Endpoint, Request, ResponseBuffer, Response, Router};

// ── Helpers ───────────────────────────────────────────────────

fn get(uri: &str) -> Request {
    http::Request::builder()
        .uri(uri)
        .header("host", "example.com")
        .body(Bytes::new())
        .unwrap()
        .into()
}

async fn item(req: Request) -> Response {
    let id = req.param("id").unwrap_or("?");
    tokio::task::yield_now().await;
    Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
}

async fn slow(_req: Request) -> &'static str {
    tokio::time::sleep(Duration::from_millis(30)).await;
    "done"
}

/// A parsed record line: `(phase, url)` plus the latency for end records.
#[derive(Debug)]
struct Parsed {
    phase: String,
    url: String,
    latency_ms: Option<f64>,
}

fn parse(line: &str) -> Parsed {
    let (_, record) = line.split_once(" HTTP: ").expect("record prefix");
    let (phase, rest) = record.split_once(' ').expect("phase");
    match phase {
        "Started" => {
            let (_method, rest) = rest.split_once(' ').expect("method");
            let url = rest.split('"').nth(1).expect("quoted url");
            assert!(rest.contains(" |Host: \"example.com\" |"), "{line}");
            assert!(rest.ends_with(" from -"), "{line}");
            Parsed { phase: phase.to_owned(), url: url.to_owned(), latency_ms: None }
        }
        "Returning" => {
            let (status, rest) = rest.split_once(" for ").expect("status");
            assert_eq!(status, "200", "{line}");
            let url = rest.split('"').nth(1).expect("quoted url");
            let latency = rest.split(" in ").nth(1).expect("latency")
                .split("ms").next().unwrap()
                .parse::<f64>()
                .expect("numeric latency");
            assert!(rest.ends_with(" bytes)"), "{line}");
            Parsed { phase: phase.to_owned(), url: url.to_owned(), latency_ms: Some(latency) }
        }
        other => panic!("unexpected phase {other:?} in {line}"),
    }
}

// ── Ordering and latency ──────────────────────────────────────

#[tokio::test]
async fn start_precedes_end_and_latency_matches_wall_clock() {
    let memory = Arc::new(MemorySink::new());
    let log = AccessLog::new(Router::new().get("/slow", slow), memory.clone());

    let mut buf = ResponseBuffer::new();
    let wall = Instant::now();
    log.serve(get("/slow"), &mut buf).await;
    let wall_ms = wall.elapsed().as_secs_f64() * 1000.0;

    let lines = memory.lines();
    assert_eq!(lines.len(), 2);
    let start = parse(&lines[0]);
    let end = parse(&lines[1]);
    assert_eq!(start.phase, "Started");
    assert_eq!(end.phase, "Returning");
    assert_eq!(start.url, "/slow");
    assert_eq!(end.url, "/slow");

    let latency = end.latency_ms.unwrap();
    assert!(latency >= 30.0, "latency {latency}ms shorter than the handler sleep");
    assert!(latency <= wall_ms + 1.0, "latency {latency}ms longer than wall clock {wall_ms}ms");
    assert_eq!(buf.body(), b"done");
}

#[tokio::test]
async fn unmatched_route_is_logged_as_404() {
    let memory = Arc::new(MemorySink::new());
    let log = AccessLog::new(Router::new(), memory.clone());

    let mut buf = ResponseBuffer::new();
    log.serve(get("/missing"), &mut buf).await;

    assert_eq!(buf.status(), Some(StatusCode::NOT_FOUND));
    let end = &memory.lines()[1];
    assert!(end.contains(r#"HTTP: Returning 404 for "/missing" in "#), "{end}");
}

// ── Concurrent appends ────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_never_interleave_records() {
    const N: usize = 200;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("http.log");
    let sink = Arc::new(FileSink::open(&path).unwrap());
    let log = Arc::new(AccessLog::new(Router::new().get("/items/{id}", item), sink));

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..N {
        let log = Arc::clone(&log);
        tasks.spawn(async move {
            let mut buf = ResponseBuffer::new();
            log.serve(get(&format!("/items/{i}")), &mut buf).await;
            assert_eq!(buf.status(), Some(StatusCode::OK));
        });
    }
    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2 * N);

    let mut started = vec![0usize; N];
    let mut ended = vec![0usize; N];
    for line in lines {
        let parsed = parse(line);
        let id: usize = parsed.url.trim_start_matches("/items/").parse().expect(line);
        match parsed.phase.as_str() {
            "Started" => {
                assert_eq!(ended[id], 0, "end before start for {id}");
                started[id] += 1;
            }
            _ => ended[id] += 1,
        }
    }
    assert!(started.iter().all(|&n| n == 1));
    assert!(ended.iter().all(|&n| n == 1));
}
