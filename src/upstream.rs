use crate::config::ProxyConfig;
use crate::error::{ProxyError, ProxyResult};
use crate::protocol::{CompletionRequest, ModerationRequest, ModerationResponse};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::RequestBuilder;
use std::pin::Pin;
use std::time::Duration;

/// Raw completion body, forwarded to the caller as-is.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, ProxyError>> + Send>>;

#[async_trait]
pub trait Moderator: Send + Sync {
    /// `true` when the moderation service flags `input`.
    async fn is_flagged(&self, input: &str) -> ProxyResult<bool>;
}

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn stream_completion(&self, request: &CompletionRequest) -> ProxyResult<ByteStream>;
}

/// Talks to an OpenAI-compatible API for both moderation and chat completions.
#[derive(Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    api_key: Option<String>,
    moderation_url: String,
    completion_url: String,
}

impl std::fmt::Debug for OpenAIClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIClient")
            .field("moderation_url", &self.moderation_url)
            .field("completion_url", &self.completion_url)
            .finish()
    }
}

impl OpenAIClient {
    pub fn new(config: &ProxyConfig) -> anyhow::Result<Self> {
        // The request timeout also bounds how long a completion may stream.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key().map(str::to_string),
            moderation_url: config.moderation_url(),
            completion_url: config.completion_url(),
        })
    }

    fn post(&self, url: &str) -> RequestBuilder {
        let builder = self.client.post(url);
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl Moderator for OpenAIClient {
    async fn is_flagged(&self, input: &str) -> ProxyResult<bool> {
        let resp = self
            .post(&self.moderation_url)
            .json(&ModerationRequest { input })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let moderation: ModerationResponse = resp
            .json()
            .await
            .map_err(|e| ProxyError::MalformedModeration(e.to_string()))?;
        let result = moderation
            .results
            .first()
            .ok_or_else(|| ProxyError::MalformedModeration("empty results".to_string()))?;
        Ok(result.flagged)
    }
}

#[async_trait]
impl CompletionBackend for OpenAIClient {
    async fn stream_completion(&self, request: &CompletionRequest) -> ProxyResult<ByteStream> {
        let resp = self
            .post(&self.completion_url)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let stream = resp.bytes_stream().map(|chunk| chunk.map_err(ProxyError::from));
        Ok(Box::pin(stream))
    }
}
