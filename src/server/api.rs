use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use log::{error, info};
use serde_json::Value;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};

use crate::conversation::{validate_and_window, ValidationError};
use crate::llm::chat::ChatClient;
use crate::models::chat::{ChatReply, ErrorBody};

/// Returned in place of an empty upstream reply.
pub const NO_RESPONSE_FALLBACK: &str = "(No response text returned.)";

pub const MISSING_API_KEY_MESSAGE: &str =
    "Server is missing a Gemini API key. Set GEMINI_API_KEY (preferred) in .env or the environment.";

#[derive(Clone)]
pub struct AppState {
    /// Absent when no credential was configured at startup. The server
    /// still runs; only /api/chat reports the configuration error.
    pub client: Option<Arc<dyn ChatClient>>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", MISSING_API_KEY_MESSAGE)]
    MissingApiKey,

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error("{0}")]
    Upstream(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Invalid(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingApiKey | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState,
) -> Result<(), Box<dyn StdError + Send + Sync>> {
    let addr = addr.parse::<SocketAddr>()?;
    info!("Starting HTTP API server on: http://{}", addr);

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

async fn chat_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ChatReply>, ApiError> {
    let client = state.client.clone().ok_or(ApiError::MissingApiKey)?;

    let body: Value =
        serde_json::from_slice(&body).map_err(|_| ValidationError::ExpectedObject)?;
    let turns = validate_and_window(&body)?;

    let completion = client
        .complete(&turns.history, &turns.prompt)
        .await
        .map_err(|e| {
            error!("Upstream chat completion failed: {}", e);
            ApiError::Upstream(e.to_string())
        })?;

    let reply = completion.response.trim();
    Ok(Json(ChatReply {
        reply: if reply.is_empty() {
            NO_RESPONSE_FALLBACK.to_string()
        } else {
            reply.to_string()
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::CompletionResponse;
    use crate::models::chat::ChatMessage;
    use axum::body::Body;
    use axum::http::{header, Request};
    use serde_json::json;
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubClient {
        reply: String,
        fail: Option<String>,
        seen: Mutex<Option<(Vec<ChatMessage>, String)>>,
    }

    impl StubClient {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                ..Self::default()
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                fail: Some(message.to_string()),
                ..Self::default()
            })
        }
    }

    #[async_trait::async_trait]
    impl ChatClient for StubClient {
        async fn complete(
            &self,
            history: &[ChatMessage],
            prompt: &str,
        ) -> Result<CompletionResponse, Box<dyn StdError + Send + Sync>> {
            *self.seen.lock().unwrap() = Some((history.to_vec(), prompt.to_string()));
            if let Some(message) = &self.fail {
                return Err(message.clone().into());
            }
            Ok(CompletionResponse {
                response: self.reply.clone(),
            })
        }

        fn get_model(&self) -> String {
            "stub".to_string()
        }
    }

    fn app_with(client: Arc<StubClient>) -> Router {
        router(AppState {
            client: Some(client),
        })
    }

    async fn post_raw(app: Router, body: String) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/chat")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_chat(app: Router, body: Value) -> (StatusCode, Value) {
        post_raw(app, body.to_string()).await
    }

    fn user(content: &str) -> Value {
        json!({ "role": "user", "content": content })
    }

    fn model(content: &str) -> Value {
        json!({ "role": "model", "content": content })
    }

    #[tokio::test]
    async fn round_trip_against_echo_stub() {
        let stub = StubClient::replying("pong");
        let (status, body) = post_chat(
            app_with(stub),
            json!({ "messages": [user("Find me pizza")] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "reply": "pong" }));
    }

    #[tokio::test]
    async fn unparseable_body_is_bad_request() {
        let (status, body) = post_raw(app_with(StubClient::replying("x")), "{not json".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expected JSON object body");
    }

    #[tokio::test]
    async fn non_object_body_is_bad_request() {
        let (status, body) = post_chat(app_with(StubClient::replying("x")), json!([1, 2])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expected JSON object body");
    }

    #[tokio::test]
    async fn missing_messages_is_bad_request() {
        let (status, body) = post_chat(app_with(StubClient::replying("x")), json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expected { messages: [] }");
    }

    #[tokio::test]
    async fn non_array_messages_is_bad_request() {
        let (status, body) = post_chat(
            app_with(StubClient::replying("x")),
            json!({ "messages": "hello" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Expected { messages: [] }");
    }

    #[tokio::test]
    async fn all_malformed_entries_is_bad_request() {
        let (status, body) = post_chat(
            app_with(StubClient::replying("x")),
            json!({ "messages": [
                { "role": "assistant", "content": "wrong role" },
                { "role": "user", "content": "   " },
                { "role": "user", "content": 7 },
            ]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "messages must be a non-empty array");
    }

    #[tokio::test]
    async fn trailing_model_turn_is_bad_request() {
        let (status, body) = post_chat(
            app_with(StubClient::replying("x")),
            json!({ "messages": [user("hi"), model("hello!")] }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Last message must have role 'user'");
    }

    #[tokio::test]
    async fn malformed_entries_are_dropped_before_forwarding() {
        let stub = StubClient::replying("ok");
        let (status, _) = post_chat(
            app_with(stub.clone()),
            json!({ "messages": [
                { "role": "bot", "content": "dropped" },
                model("Welcome!"),
                { "role": "user", "content": "" },
                user("Find tacos"),
            ]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let seen = stub.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0.len(), 1);
        assert_eq!(seen.0[0].content, "Welcome!");
        assert_eq!(seen.1, "Find tacos");
    }

    #[tokio::test]
    async fn long_conversations_are_windowed_before_forwarding() {
        let stub = StubClient::replying("ok");
        let entries: Vec<Value> = (0..25)
            .map(|i| {
                let content = format!("msg-{}", i);
                if i % 2 == 0 {
                    user(&content)
                } else {
                    model(&content)
                }
            })
            .collect();
        let (status, _) = post_chat(app_with(stub.clone()), json!({ "messages": entries })).await;
        assert_eq!(status, StatusCode::OK);
        let seen = stub.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0.len(), 19);
        assert_eq!(seen.1, "msg-24");
    }

    #[tokio::test]
    async fn empty_upstream_reply_uses_fallback() {
        let (status, body) = post_chat(
            app_with(StubClient::replying("  \n ")),
            json!({ "messages": [user("anything")] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], NO_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn reply_text_is_trimmed() {
        let (status, body) = post_chat(
            app_with(StubClient::replying("  Try Luigi's.  ")),
            json!({ "messages": [user("pizza?")] }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Try Luigi's.");
    }

    #[tokio::test]
    async fn upstream_failure_is_internal_error() {
        let (status, body) = post_chat(
            app_with(StubClient::failing("connection reset")),
            json!({ "messages": [user("hi")] }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "connection reset");
    }

    #[tokio::test]
    async fn missing_credential_is_internal_error_before_upstream() {
        let app = router(AppState { client: None });
        let (status, body) = post_chat(app, json!({ "messages": [user("hi")] })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], MISSING_API_KEY_MESSAGE);
    }
}
