//! # waymark
//!
//! Request logging and small HTTP helpers for services behind a reverse
//! proxy.
//!
//! ## What's in the box
//!
//! - **Access log** — [`middleware::AccessLog`] writes a start and an end
//!   record for every request: method, URL, host, proxy headers, status,
//!   bytes sent, latency. One long-lived file, one atomic append per record.
//! - **Response capture** — [`StatusWriter`] observes the status and size
//!   that actually went out, without touching them.
//! - **Scheme resolution** — [`scheme::resolve`] trusts `X-Forwarded-Proto`
//!   so absolute URLs come out right behind nginx.
//! - **Tokens** — [`token::generate`] turns OS entropy into URL-safe text.
//! - **Static assets** — [`Assets`] serves `/assets/…`, `/robots.txt` and
//!   the favicons.
//!
//! Underneath sits just enough framework to run them: a radix-tree
//! [`Router`], async handlers, and a hyper [`Server`] with graceful
//! shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use waymark::config::Config;
//! use waymark::middleware::AccessLog;
//! use waymark::{Assets, Request, Response, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), waymark::Error> {
//!     let config = Config::default();
//!
//!     let router = Router::new().get("/users/{id}", get_user);
//!     let router = Assets::new(&config.assets).routes(router);
//!     let app = AccessLog::from_config(router, &config.access_log)?;
//!
//!     Server::bind(&config.listen)?.serve(app).await
//! }
//!
//! async fn get_user(req: Request) -> Response {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes())
//! }
//! ```

mod assets;
mod capture;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;
mod writer;

pub mod config;
pub mod format;
pub mod middleware;
pub mod scheme;
pub mod timing;
pub mod token;

pub use assets::{Assets, serve_content};
pub use capture::StatusWriter;
pub use error::Error;
pub use handler::{BoxFuture, Endpoint, Handler};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
pub use writer::{ResponseBuffer, ResponseWriter};
