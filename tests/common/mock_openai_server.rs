//! Mock OpenAI API for testing

#![allow(dead_code)]

use actix_web::dev::ServerHandle;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
use bytes::Bytes;
use futures::stream;
use serde_json::{Value, json};
use std::net::{SocketAddr, TcpListener};
use std::sync::Mutex;

/// Inputs containing this marker are flagged by the mock moderation endpoint
pub const FLAG_MARKER: &str = "FLAG_ME";

pub const SSE_CHUNKS: [&str; 2] = [
    "data: {\"id\":\"chatcmpl-123\",\"object\":\"chat.completion.chunk\",\"choices\":[{\"index\":0,\"delta\":{\"content\":\"Wow. Riveting.\"},\"finish_reason\":null}]}\n\n",
    "data: [DONE]\n\n",
];

#[derive(Default)]
pub struct MockState {
    pub completion_status: u16,
    pub moderation_inputs: Mutex<Vec<String>>,
    pub completion_requests: Mutex<Vec<Value>>,
    pub auth_headers: Mutex<Vec<String>>,
}

pub struct MockOpenAIServer {
    addr: SocketAddr,
    state: web::Data<MockState>,
    handle: ServerHandle,
}

impl MockOpenAIServer {
    pub async fn new() -> Self {
        Self::with_completion_status(200).await
    }

    /// Start a mock whose completion endpoint answers with `status`
    pub async fn with_completion_status(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let state = web::Data::new(MockState {
            completion_status: status,
            ..Default::default()
        });
        let app_state = state.clone();

        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .route("/v1/moderations", web::post().to(mock_moderations))
                .route("/v1/chat/completions", web::post().to(mock_chat_completions))
        })
        .workers(1)
        .listen(listener)
        .unwrap()
        .run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            addr,
            state,
            handle,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn moderation_inputs(&self) -> Vec<String> {
        self.state.moderation_inputs.lock().unwrap().clone()
    }

    pub fn completion_requests(&self) -> Vec<Value> {
        self.state.completion_requests.lock().unwrap().clone()
    }

    pub fn auth_headers(&self) -> Vec<String> {
        self.state.auth_headers.lock().unwrap().clone()
    }

    pub async fn stop(self) {
        self.handle.stop(false).await;
    }
}

fn record_auth(req: &HttpRequest, state: &MockState) {
    if let Some(auth) = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    {
        state.auth_headers.lock().unwrap().push(auth.to_string());
    }
}

async fn mock_moderations(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<MockState>,
) -> HttpResponse {
    record_auth(&req, &state);
    let input = body["input"].as_str().unwrap_or_default().to_string();
    let flagged = input.contains(FLAG_MARKER);
    state.moderation_inputs.lock().unwrap().push(input);

    HttpResponse::Ok().json(json!({
        "id": "modr-123",
        "model": "text-moderation-007",
        "results": [{
            "flagged": flagged,
            "categories": {"harassment": flagged},
            "category_scores": {"harassment": if flagged { 0.98 } else { 0.01 }}
        }]
    }))
}

async fn mock_chat_completions(
    req: HttpRequest,
    body: web::Json<Value>,
    state: web::Data<MockState>,
) -> HttpResponse {
    record_auth(&req, &state);
    state
        .completion_requests
        .lock()
        .unwrap()
        .push(body.into_inner());

    if state.completion_status != 200 {
        let status = actix_web::http::StatusCode::from_u16(state.completion_status)
            .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
        return HttpResponse::build(status).json(json!({
            "error": {
                "message": "upstream exploded",
                "type": "server_error"
            }
        }));
    }

    let chunks = SSE_CHUNKS
        .iter()
        .map(|chunk| Ok::<_, actix_web::Error>(Bytes::from(chunk.to_string())))
        .collect::<Vec<_>>();
    HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(stream::iter(chunks))
}
