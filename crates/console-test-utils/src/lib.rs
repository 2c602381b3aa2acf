//! Testing utilities for the Multiverse Console workspace
//!
//! An in-process mock API served by `warp` on an ephemeral port, plus small
//! helpers shared by the security and app crates' tests.

#![allow(missing_docs)]

use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use warp::http::{HeaderMap, StatusCode};
use warp::Filter;

/// Credential value the generative-text route refuses
pub const REJECTED_KEY: &str = "rejected-key";

/// Prompt the generative-text route never answers
pub const STALL_PROMPT: &str = "stall";

/// Mock console backend
///
/// Routes:
/// - `GET /ok` → 200 `{"ok":true}`
/// - `GET /unauthorized` → 401
/// - `GET /forbidden` → 403
/// - `GET /hang` → never answers
/// - `GET /headers` → 200 with the request headers as a JSON object
/// - `GET /not-json` → 200 with an HTML body
/// - `POST /v1beta/models/{model}:generateContent` with `x-goog-api-key` → generated text
#[derive(Debug)]
pub struct MockApi {
    addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl MockApi {
    /// Bind on `127.0.0.1:0` and serve in the background
    pub async fn start() -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let count = warp::any()
            .map(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .untuple_one();

        let ok = warp::path!("ok").map(|| warp::reply::json(&json!({ "ok": true })));

        let unauthorized = warp::path!("unauthorized").map(|| {
            warp::reply::with_status(
                warp::reply::json(&json!({ "error": "token expired" })),
                StatusCode::UNAUTHORIZED,
            )
        });

        let forbidden = warp::path!("forbidden")
            .map(|| warp::reply::with_status("forbidden", StatusCode::FORBIDDEN));

        let hang = warp::path!("hang").and_then(|| async {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&json!({ "ok": true })))
        });

        let headers = warp::path!("headers")
            .and(warp::header::headers_cloned())
            .map(|headers: HeaderMap| warp::reply::json(&headers_to_json(&headers)));

        let not_json = warp::path!("not-json").map(|| "<html>maintenance</html>");

        let generate = warp::post()
            .and(warp::path!("v1beta" / "models" / String))
            .and(warp::header::optional::<String>("x-goog-api-key"))
            .and(warp::body::json())
            .and_then(|target: String, key: Option<String>, body: Value| async move {
                if prompt_of(&body) == STALL_PROMPT {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
                Ok::<_, warp::Rejection>(generate_reply(&target, key.as_deref(), &body))
            });

        let routes = count.and(
            ok.or(unauthorized)
                .or(forbidden)
                .or(hang)
                .or(headers)
                .or(not_json)
                .or(generate),
        );

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async move {
                let _ = rx.await;
            });
        tokio::spawn(server);

        Self {
            addr,
            hits,
            shutdown: Some(tx),
        }
    }

    /// Bound address
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL without trailing slash
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
    }

    /// Requests received so far
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// URL on a port nothing listens on
#[must_use]
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{addr}/ok")
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map: Map<String, Value> = headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(value.to_str().unwrap_or_default().to_string()),
            )
        })
        .collect();
    Value::Object(map)
}

fn prompt_of(body: &Value) -> &str {
    body.pointer("/contents/0/parts/0/text")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

fn generate_reply(
    target: &str,
    key: Option<&str>,
    body: &Value,
) -> warp::reply::WithStatus<warp::reply::Json> {
    let key = key.unwrap_or_default();
    if !target.ends_with(":generateContent") || key.is_empty() {
        return warp::reply::with_status(
            warp::reply::json(&json!({ "error": "bad request" })),
            StatusCode::BAD_REQUEST,
        );
    }
    if key == REJECTED_KEY {
        return warp::reply::with_status(
            warp::reply::json(&json!({ "error": "permission denied" })),
            StatusCode::FORBIDDEN,
        );
    }

    let prompt = prompt_of(body);
    let text = if prompt == "silence" {
        String::new()
    } else {
        format!("<b>{prompt}</b>")
    };

    warp::reply::with_status(
        warp::reply::json(&json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })),
        StatusCode::OK,
    )
}
