#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use reqwest::StatusCode;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use giftcert_api::auth::{generate_jwt, Claims};
use giftcert_api::config::config;
use giftcert_api::database::DatabaseManager;
use giftcert_api::{app, AppState};

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Inherit DATABASE_URL when present; the server starts even if the database is absent
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_giftcert-api"));
        cmd.env("API_PORT", port.to_string())
            .env("DATABASE_RUN_MIGRATIONS", "false")
            .env("DATABASE_CONNECTION_TIMEOUT", "2")
            .env("SEED_INITIAL_RECORDS", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

/// In-process router on a pool that never connects unless a handler reaches the database
pub fn router() -> axum::Router {
    let pool = DatabaseManager::connect_lazy(&config().database).expect("lazy pool");
    app(AppState::new(pool))
}

pub fn bearer(user_id: i64, roles: &[&str]) -> String {
    let claims = Claims::new(
        format!("user{}", user_id),
        user_id,
        format!("user{}@mail.com", user_id),
        roles.iter().map(|r| r.to_string()).collect(),
    );
    format!("Bearer {}", generate_jwt(&claims).expect("token"))
}

/// Router and pool on a migrated database; `None` when DATABASE_URL is not configured
pub async fn database() -> Option<(axum::Router, PgPool)> {
    let _ = dotenvy::dotenv();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping database test");
        return None;
    }

    let pool = DatabaseManager::connect(&config().database).await.expect("database connection");
    DatabaseManager::migrate(&pool).await.expect("migrations");
    Some((app(AppState::new(pool.clone())), pool))
}

/// Short random suffix so parallel tests and repeated runs never share names
pub fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &uuid::Uuid::new_v4().simple().to_string()[..10])
}

/// One request through the router; returns the status and the JSON body (Null when empty)
pub async fn call(
    router: &axum::Router,
    method: Method,
    uri: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> (axum::http::StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}
