// src/test_utils/mock_generation_server.rs
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

use crate::generation::GenerationRequest;

/// Canned reply for one `/api/generate` call.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: String,
}

impl MockReply {
    /// Newline-delimited JSON body, one record per line.
    pub fn ndjson(lines: &[&str]) -> Self {
        let mut body = lines.join("\n");
        body.push('\n');
        Self {
            status: 200,
            content_type: "application/x-ndjson",
            body,
        }
    }

    pub fn json(body: &str) -> Self {
        Self {
            status: 200,
            content_type: "application/json",
            body: body.to_string(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain",
            body: body.to_string(),
        }
    }
}

#[derive(Clone)]
struct MockServerState {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

async fn generate_handler(
    axum::extract::State(state): axum::extract::State<MockServerState>,
    Json(payload): Json<GenerationRequest>,
) -> axum::response::Response {
    log::debug!("Mock generation server received request for model {}", payload.model);
    state.requests.lock().unwrap().push(payload);

    let reply = state.replies.lock().unwrap().pop_front();
    match reply {
        Some(reply) => {
            let status = StatusCode::from_u16(reply.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(axum::http::header::CONTENT_TYPE, reply.content_type)],
                reply.body,
            )
                .into_response()
        }
        None => {
            log::error!("Mock generation server ran out of replies!");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

async fn root_handler() -> &'static str {
    "Ollama is running"
}

pub struct MockGenerationServer {
    addr: SocketAddr,
    shutdown_tx: tokio::sync::oneshot::Sender<()>,
    pub recorded_requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerationServer {
    pub async fn start(replies: Vec<MockReply>) -> Self {
        let state = MockServerState {
            replies: Arc::new(Mutex::new(VecDeque::from(replies))),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let recorded_requests = state.requests.clone();

        let app = Router::new()
            .route("/", get(root_handler))
            .route("/api/generate", post(generate_handler))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap_or_else(|e| {
            panic!("Failed to bind mock server to 127.0.0.1:0. Error: {}", e);
        });
        let addr = listener.local_addr().unwrap();
        log::info!("Mock generation server listening on {}", addr);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap_or_else(|e| {
                    log::error!("Mock generation server error: {}", e);
                });
        });

        MockGenerationServer {
            addr,
            shutdown_tx,
            recorded_requests,
        }
    }

    pub fn address(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(self) {
        if self.shutdown_tx.send(()).is_err() {
            log::warn!("Mock generation server shutdown signal already sent or receiver dropped.");
        }
        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
    }

    pub fn get_requests(&self) -> Vec<GenerationRequest> {
        self.recorded_requests.lock().unwrap().clone()
    }
}
