//! Stub Telegram Bot API for integration tests: getUpdates, sendMessage, getFile, getMe.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use fileshare::config::Settings;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "123456:stub-secret-token";

pub struct StubState {
    token: String,
    updates: Vec<Value>,
    files: HashMap<String, String>,
    pub sent: Mutex<Vec<Value>>,
    pub get_file_calls: AtomicUsize,
}

pub struct StubBotApi {
    pub base_url: String,
    pub state: Arc<StubState>,
}

impl StubBotApi {
    pub fn sent(&self) -> Vec<Value> {
        self.state.sent.lock().unwrap().clone()
    }

    pub fn get_file_calls(&self) -> usize {
        self.state.get_file_calls.load(Ordering::SeqCst)
    }
}

/// Start the stub on a free loopback port. `files` maps file_id -> file_path ("" = no path).
pub async fn spawn_stub(token: &str, files: &[(&str, &str)], updates: Vec<Value>) -> StubBotApi {
    let state = Arc::new(StubState {
        token: token.to_string(),
        updates,
        files: files
            .iter()
            .map(|(id, path)| (id.to_string(), path.to_string()))
            .collect(),
        sent: Mutex::new(Vec::new()),
        get_file_calls: AtomicUsize::new(0),
    });
    let app = Router::new()
        .route("/:bot/getUpdates", get(get_updates))
        .route("/:bot/sendMessage", post(send_message))
        .route("/:bot/getFile", post(get_file))
        .route("/:bot/getMe", get(get_me))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    StubBotApi {
        base_url: format!("http://{}", addr),
        state,
    }
}

/// A backend that accepts connections and never answers. Returns its base URL.
pub async fn spawn_silent_backend() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent backend");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}

/// Loopback settings pointed at `api_base`, with short poll and retry intervals.
pub fn settings(api_base: &str, port: u16) -> Settings {
    Settings {
        bot_token: TOKEN.to_string(),
        file_server_url: "https://files.example.com".to_string(),
        api_base: api_base.to_string(),
        poll_timeout: Duration::from_secs(1),
        retry_delay: Duration::from_millis(50),
        request_timeout: Duration::from_secs(1),
        bind: "127.0.0.1".to_string(),
        port,
    }
}

pub fn document_update(update_id: i64, chat_id: i64, message_id: i64, file_id: &str) -> Value {
    json!({
        "update_id": update_id,
        "message": {
            "message_id": message_id,
            "chat": { "id": chat_id, "type": "private" },
            "from": { "id": 1, "is_bot": false, "username": "alice" },
            "document": { "file_id": file_id, "file_unique_id": "u1", "file_name": "a.pdf" }
        }
    })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "ok": false, "error_code": 401, "description": "Unauthorized" })),
    )
        .into_response()
}

fn authorized(state: &StubState, bot: &str) -> bool {
    bot.strip_prefix("bot") == Some(state.token.as_str())
}

#[derive(Deserialize)]
struct UpdatesQuery {
    offset: Option<i64>,
}

async fn get_updates(
    State(state): State<Arc<StubState>>,
    Path(bot): Path<String>,
    Query(q): Query<UpdatesQuery>,
) -> Response {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    let offset = q.offset.unwrap_or(i64::MIN);
    let pending: Vec<Value> = state
        .updates
        .iter()
        .filter(|u| u["update_id"].as_i64().unwrap_or(0) >= offset)
        .cloned()
        .collect();
    if pending.is_empty() {
        // Short stand-in for an idle long poll.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Json(json!({ "ok": true, "result": pending })).into_response()
}

async fn send_message(
    State(state): State<Arc<StubState>>,
    Path(bot): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    state.sent.lock().unwrap().push(body);
    Json(json!({ "ok": true, "result": { "message_id": 1000 } })).into_response()
}

#[derive(Deserialize)]
struct FileForm {
    file_id: String,
}

async fn get_file(
    State(state): State<Arc<StubState>>,
    Path(bot): Path<String>,
    Form(form): Form<FileForm>,
) -> Response {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    state.get_file_calls.fetch_add(1, Ordering::SeqCst);
    match state.files.get(&form.file_id) {
        Some(path) if path.is_empty() => {
            Json(json!({ "ok": true, "result": { "file_id": form.file_id } })).into_response()
        }
        Some(path) => Json(json!({
            "ok": true,
            "result": { "file_id": form.file_id, "file_size": 1024, "file_path": path }
        }))
        .into_response(),
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: invalid file_id"
            })),
        )
            .into_response(),
    }
}

async fn get_me(State(state): State<Arc<StubState>>, Path(bot): Path<String>) -> Response {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    Json(json!({ "ok": true, "result": { "id": 1, "is_bot": true, "username": "file_bot" } }))
        .into_response()
}
