use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::handler::ChatProxy;
use actix_web::{HttpRequest, HttpResponse, HttpServer, get, post, web};
use bytes::BytesMut;
use futures::StreamExt;

/// Request bodies above this size are refused. A conversation inside the
/// token ceiling is a small fraction of it.
pub const MAX_PAYLOAD_BYTES: usize = 256 * 1024;

#[get("/health")]
pub async fn health(_req: HttpRequest) -> HttpResponse {
    HttpResponse::Ok().body("Ok")
}

/// Drain the request body, failing once it grows past `limit`.
async fn read_body(mut payload: web::Payload, limit: usize) -> Result<BytesMut, ProxyError> {
    let mut body = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk =
            chunk.map_err(|e| ProxyError::InvalidInput(format!("failed to read body: {}", e)))?;
        if body.len() + chunk.len() > limit {
            return Err(ProxyError::InvalidInput(format!(
                "payload exceeds {} bytes",
                limit
            )));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

#[post("/api/chat")]
pub async fn chat(
    payload: web::Payload,
    proxy: web::Data<ChatProxy>,
) -> Result<HttpResponse, actix_web::Error> {
    let result = match read_body(payload, MAX_PAYLOAD_BYTES).await {
        Ok(body) => proxy.handle(&body).await,
        Err(e) => Err(e),
    };
    let stream = match result {
        Ok(stream) => stream,
        Err(e) => {
            log::error!("Chat request failed: {}", e);
            return Err(e.into());
        }
    };

    let body = stream.map(|chunk| {
        chunk.map_err(|e| {
            log::error!("Completion stream aborted: {}", e);
            actix_web::error::ErrorBadGateway(e)
        })
    });
    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .streaming(body))
}

/// Register the proxy routes on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(chat);
}

pub async fn startup(config: ProxyConfig, proxy: ChatProxy) -> std::io::Result<()> {
    let proxy = web::Data::new(proxy);

    log::info!("Starting server at {}:{}", config.host, config.port);

    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(proxy.clone())
            .configure(configure)
    })
    .bind((config.host, config.port))?
    .run()
    .await
}
