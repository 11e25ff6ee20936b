use crate::config::{PolicyConfig, ProxyConfig};
use crate::error::{ProxyError, ProxyResult};
use crate::persona::{SYSTEM_PROMPT, append_reminder, with_persona};
use crate::protocol::{ChatReqInput, CompletionRequest};
use crate::tokenizer::{TiktokenCounter, TokenCounter};
use crate::upstream::{ByteStream, CompletionBackend, Moderator, OpenAIClient};
use std::sync::Arc;

/// Validates a chat request, moderates it, wraps it in the persona and
/// opens the completion stream.
///
/// Holds no per-request state; one instance is shared by every worker.
#[derive(Clone)]
pub struct ChatProxy {
    has_api_key: bool,
    policy: PolicyConfig,
    moderator: Arc<dyn Moderator>,
    backend: Arc<dyn CompletionBackend>,
    tokens: Arc<dyn TokenCounter>,
}

impl ChatProxy {
    pub fn new(
        config: &ProxyConfig,
        moderator: Arc<dyn Moderator>,
        backend: Arc<dyn CompletionBackend>,
        tokens: Arc<dyn TokenCounter>,
    ) -> Self {
        Self {
            has_api_key: config.api_key().is_some(),
            policy: config.policy.clone(),
            moderator,
            backend,
            tokens,
        }
    }

    /// Wire the proxy to the OpenAI API with a tiktoken counter for the configured model.
    pub fn from_config(config: &ProxyConfig) -> anyhow::Result<Self> {
        let client = Arc::new(OpenAIClient::new(config)?);
        let tokens = Arc::new(TiktokenCounter::for_model(&config.policy.model)?);
        Ok(Self::new(config, client.clone(), client, tokens))
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub async fn handle(&self, body: &[u8]) -> ProxyResult<ByteStream> {
        if !self.has_api_key {
            return Err(ProxyError::ConfigurationMissing);
        }

        if body.is_empty() {
            return Err(ProxyError::InvalidInput("no request data".to_string()));
        }
        let input: ChatReqInput = serde_json::from_slice(body)
            .map_err(|e| ProxyError::InvalidInput(format!("malformed body: {}", e)))?;
        let mut messages = input
            .messages
            .ok_or_else(|| ProxyError::InvalidInput("no messages provided".to_string()))?;

        // Counted before the reminder is appended.
        let mut token_count: usize = messages
            .iter()
            .map(|msg| self.tokens.count_tokens(&msg.content))
            .sum();

        let last = append_reminder(&mut messages)
            .map(str::to_string)
            .ok_or_else(|| ProxyError::InvalidInput("messages is empty".to_string()))?;

        if self.moderator.is_flagged(&last).await? {
            return Err(ProxyError::ContentFlagged);
        }

        token_count += self.tokens.count_tokens(SYSTEM_PROMPT);
        if token_count >= self.policy.token_limit {
            return Err(ProxyError::QueryTooLarge {
                tokens: token_count,
                limit: self.policy.token_limit,
            });
        }

        let request = CompletionRequest {
            model: self.policy.model.clone(),
            messages: with_persona(messages),
            temperature: self.policy.temperature,
            stream: true,
        };
        log::debug!(
            "Forwarding {} messages ({} tokens) to {}",
            request.messages.len(),
            token_count,
            request.model
        );

        self.backend.stream_completion(&request).await
    }
}
