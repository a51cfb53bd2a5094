//! HTTP API
//!
//! - `GET /api/board` - The board, created on first fetch
//! - `POST /api/board/update` - Reconcile a submitted snapshot
//! - `GET /health` - Liveness
//!
//! Callers that also hold a realtime session can name it in the
//! `X-Session-Id` header to be left out of the resulting fan-out.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use taskboard_core::{BoardError, BoardService, BoardSnapshot, SessionId};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, warn};

/// Header naming the caller's realtime session
pub const SESSION_HEADER: &str = "x-session-id";

/// Build the API router
pub fn router(service: BoardService, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/board", get(get_board))
        .route("/api/board/update", post(update_board))
        .route("/health", get(health_check))
        .layer(cors_layer(allowed_origins))
        .with_state(service)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Response body of a successful update
#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub message: &'static str,
    pub lists_created: usize,
    pub lists_updated: usize,
    pub cards_created: usize,
    pub cards_updated: usize,
    pub cards_moved: usize,
}

async fn get_board(State(service): State<BoardService>) -> Result<Json<BoardSnapshot>, ApiError> {
    Ok(Json(service.fetch_board().await?))
}

async fn update_board(
    State(service): State<BoardService>,
    headers: HeaderMap,
    payload: Result<Json<BoardSnapshot>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    let Json(snapshot) = payload.map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    let origin = session_from_headers(&headers);

    let report = service.update_board(snapshot, origin).await?;
    let outcome = &report.outcome;

    Ok(Json(UpdateResponse {
        message: "Board updated successfully",
        lists_created: outcome.lists_created(),
        lists_updated: outcome.lists_updated(),
        cards_created: outcome.cards_created(),
        cards_updated: outcome.cards_updated(),
        cards_moved: outcome.cards_moved(),
    }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// An unparseable session header is ignored, not rejected
fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    let value = headers.get(SESSION_HEADER)?;
    match value.to_str().ok().and_then(|s| s.parse().ok()) {
        Some(id) => Some(id),
        None => {
            warn!("Ignoring malformed {} header: {:?}", SESSION_HEADER, value);
            None
        }
    }
}

/// Errors as seen by HTTP clients
#[derive(Debug)]
pub enum ApiError {
    Board(BoardError),
    /// Body is not a well-formed snapshot
    InvalidBody(String),
}

impl From<BoardError> for ApiError {
    fn from(error: BoardError) -> Self {
        ApiError::Board(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Board(BoardError::NotFound { .. }) => {
                (StatusCode::NOT_FOUND, "Board not found".to_string())
            }
            ApiError::Board(BoardError::Validation(msg)) | ApiError::InvalidBody(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg)
            }
            ApiError::Board(BoardError::Store(e)) => {
                error!("Store failure: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request};
    use serde_json::Value;
    use std::sync::Arc;
    use taskboard_core::{BoardStore, Broadcaster, Config, Event};
    use tower::ServiceExt;

    fn service() -> BoardService {
        BoardService::new(
            BoardStore::open_in_memory().unwrap(),
            Arc::new(Broadcaster::new()),
            &Config::default(),
        )
    }

    fn app(service: &BoardService) -> Router {
        router(service.clone(), &["http://localhost:3000".to_string()])
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn get_board_request() -> Request<Body> {
        Request::builder()
            .uri("/api/board")
            .body(Body::empty())
            .unwrap()
    }

    fn update_request(body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/board/update")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_board_creates_default() {
        let service = service();

        let (status, body) = call(app(&service), get_board_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["board_id"], 1);
        assert_eq!(body["title"], "My First Board");
        assert_eq!(body["lists"], json!([]));
    }

    #[tokio::test]
    async fn test_update_then_fetch() {
        let service = service();
        call(app(&service), get_board_request()).await;

        // Shape the web client sends: placeholder ids, no positions
        let submitted = json!({
            "lists": [
                {"list_id": 1700000000000i64, "title": "Todo", "cards": [
                    {"card_id": 1700000000001i64, "title": "Write docs"}
                ]},
                {"list_id": 1700000000002i64, "title": "Done", "cards": []}
            ]
        });
        let (status, body) = call(app(&service), update_request(submitted)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Board updated successfully");
        assert_eq!(body["lists_created"], 2);
        assert_eq!(body["cards_created"], 1);

        let (_, board) = call(app(&service), get_board_request()).await;
        let lists = board["lists"].as_array().unwrap();
        assert_eq!(lists.len(), 2);
        assert_eq!(lists[0]["title"], "Todo");
        assert_eq!(lists[0]["position"], 0);
        assert_eq!(lists[0]["cards"][0]["title"], "Write docs");
        assert_eq!(lists[0]["cards"][0]["description"], "");
        assert_eq!(lists[1]["title"], "Done");
    }

    #[tokio::test]
    async fn test_update_without_board_is_404() {
        let service = service();
        let (status, body) = call(app(&service), update_request(json!({"lists": []}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Board not found");
    }

    #[tokio::test]
    async fn test_malformed_body_is_422() {
        let service = service();
        call(app(&service), get_board_request()).await;

        let (status, body) = call(
            app(&service),
            update_request(json!({"lists": [{"list_id": "x", "title": "A"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].is_string());

        let (_, board) = call(app(&service), get_board_request()).await;
        assert_eq!(board["lists"], json!([]));
    }

    #[tokio::test]
    async fn test_blank_title_is_422() {
        let service = service();
        call(app(&service), get_board_request()).await;

        let (status, body) = call(
            app(&service),
            update_request(json!({"lists": [{"title": "   ", "cards": []}]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["detail"].as_str().unwrap().contains("lists[0].title"));
    }

    #[tokio::test]
    async fn test_store_failure_is_generic_500() {
        let service = service();
        call(app(&service), get_board_request()).await;
        service
            .shared_store()
            .lock()
            .await
            .connection()
            .execute_batch(
                "CREATE TRIGGER fail_doomed BEFORE INSERT ON lists
                 WHEN NEW.title = 'Doomed'
                 BEGIN SELECT RAISE(ABORT, 'simulated store fault'); END;",
            )
            .unwrap();

        let (status, body) = call(
            app(&service),
            update_request(json!({"lists": [{"title": "Doomed"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn test_session_header_excludes_caller() {
        let service = service();
        call(app(&service), get_board_request()).await;

        let (caller, mut caller_rx) = service.broadcaster().connect().await;
        let (_peer, mut peer_rx) = service.broadcaster().connect().await;
        caller_rx.recv().await.unwrap();
        peer_rx.recv().await.unwrap();

        let mut request = update_request(json!({"lists": [{"title": "Todo"}]}));
        request
            .headers_mut()
            .insert(SESSION_HEADER, caller.to_string().parse().unwrap());
        let (status, _) = call(app(&service), request).await;
        assert_eq!(status, StatusCode::OK);

        match Event::decode(&peer_rx.recv().await.unwrap()).unwrap() {
            Event::UpdateBoard(board) => assert_eq!(board["lists"][0]["title"], "Todo"),
            other => panic!("Expected board update, got {:?}", other),
        }
        assert!(caller_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_health() {
        let service = service();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = call(app(&service), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let service = service();
        let request = Request::builder()
            .uri("/api/board")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app(&service).oneshot(request).await.unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_malformed_session_header_is_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static("not-a-session"));
        assert!(session_from_headers(&headers).is_none());

        let id = SessionId::new();
        headers.insert(SESSION_HEADER, id.to_string().parse().unwrap());
        assert_eq!(session_from_headers(&headers), Some(id));
    }
}
