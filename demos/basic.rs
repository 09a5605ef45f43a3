//! Minimal waymark service — JSON endpoints, static assets, access log.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic [config.toml]
//!
//! Try:
//!   curl http://localhost:3000/users/42
//!   curl -H 'x-forwarded-proto: https' http://localhost:3000/whoami
//!   curl -X POST http://localhost:3000/sessions
//!   curl http://localhost:3000/robots.txt
//!   tail -f http.log

use http::StatusCode;
use tracing_subscriber::EnvFilter;
use waymark::config::Config;
use waymark::middleware::AccessLog;
use waymark::{Assets, Request, Response, Router, Server, scheme, token};

#[tokio::main]
async fn main() -> Result<(), waymark::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let router = Router::new()
        .get("/users/{id}", get_user)
        .get("/whoami",     whoami)
        .post("/sessions",  create_session);
    let router = Assets::new(&config.assets).routes(router);

    let app = AccessLog::from_config(router, &config.access_log)?;

    Server::bind(&config.listen)?.serve(app).await
}

// GET /users/{id}
async fn get_user(req: Request) -> Response {
    let id = req.param("id").unwrap_or("unknown");
    Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes())
}

// GET /whoami — the URL as the client typed it, scheme courtesy of the proxy
async fn whoami(req: Request) -> String {
    scheme::absolute_url(&req)
}

// POST /sessions → 201 with a fresh session id
async fn create_session(_req: Request) -> Response {
    match token::generate(32) {
        Ok(id) => Response::builder()
            .status(StatusCode::CREATED)
            .header("set-cookie", &format!("session={id}; HttpOnly; Secure; Path=/"))
            .json(format!(r#"{{"session":"{id}"}}"#).into_bytes()),
        Err(e) => {
            tracing::error!("session id generation failed: {e}");
            Response::status(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
