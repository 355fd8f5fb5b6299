// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The LLM collaborator boundary. No concrete provider lives in this
//! workspace; `LlmClient` is the seam a caller plugs a real model behind.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::state::{Message, ToolCall};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("llm call timed out after {0:?}")]
    Timeout(Duration),

    #[error("llm provider error: {0}")]
    Provider(String),
}

/// Describes one tool the model may choose to call, in the shape a
/// function-calling provider expects.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters_schema: Value,
}

/// What the model produced for one turn: free text, and/or a request to
/// invoke one or more tools.
#[derive(Debug, Clone, Default)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl LlmResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }
}

/// Opaque language-model collaborator. Implementations own their own
/// provider SDK, auth, and model selection; this trait only fixes the
/// request/response shape and the retry/timeout contract every caller can
/// rely on.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A single completion call, with no timeout or retry applied — callers
    /// normally go through [`call_with_retry`] instead of this directly.
    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSpec],
    ) -> Result<LlmResponse, LlmError>;
}

/// Call `client.complete`, bounding each attempt at `timeout` and retrying
/// up to `max_retries` additional times on timeout or a transient provider
/// error.
pub async fn call_with_retry(
    client: &dyn LlmClient,
    messages: &[Message],
    tools: &[ToolSpec],
    timeout: Duration,
    max_retries: u32,
) -> Result<LlmResponse, LlmError> {
    let mut attempt = 0;
    loop {
        let result = tokio::time::timeout(timeout, client.complete(messages, tools))
            .await
            .map_err(|_| LlmError::Timeout(timeout))
            .and_then(|inner| inner);

        match result {
            Ok(response) => return Ok(response),
            Err(err) if attempt < max_retries => {
                attempt += 1;
                warn!(attempt, error = %err, "llm_call_retry");
            }
            Err(err) => return Err(err),
        }
    }
}

/// Fixed, scriptable sequence of responses for deterministic tests. Each
/// call to `complete` returns the next response in order; panics in test
/// code if the sequence is exhausted, signaling a miscounted test.
pub struct MockLlmClient {
    responses: std::sync::Mutex<std::collections::VecDeque<LlmResponse>>,
}

impl MockLlmClient {
    pub fn new(responses: impl IntoIterator<Item = LlmResponse>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
        }
    }

    pub fn single(response: LlmResponse) -> Arc<Self> {
        Arc::new(Self::new([response]))
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmResponse, LlmError> {
        let mut responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        responses
            .pop_front()
            .ok_or_else(|| LlmError::Provider("mock response sequence exhausted".into()))
    }
}

/// No-op client for running the demo binary without a model configured.
/// Always escalates, so tickets routed through it surface to a human
/// rather than silently hanging.
pub struct NullLlmClient;

#[async_trait]
impl LlmClient for NullLlmClient {
    async fn complete(
        &self,
        _messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<LlmResponse, LlmError> {
        Ok(LlmResponse::text(
            "No language model is configured; this ticket has been escalated to a human agent.",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_client_returns_responses_in_order() {
        let client = MockLlmClient::new([LlmResponse::text("first"), LlmResponse::text("second")]);
        let first = client.complete(&[], &[]).await.unwrap();
        assert_eq!(first.content.as_deref(), Some("first"));
        let second = client.complete(&[], &[]).await.unwrap();
        assert_eq!(second.content.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_retries() {
        struct AlwaysFails;
        #[async_trait]
        impl LlmClient for AlwaysFails {
            async fn complete(
                &self,
                _messages: &[Message],
                _tools: &[ToolSpec],
            ) -> Result<LlmResponse, LlmError> {
                Err(LlmError::Provider("boom".into()))
            }
        }

        let result = call_with_retry(&AlwaysFails, &[], &[], Duration::from_secs(1), 2).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn null_client_always_escalates() {
        let response = NullLlmClient.complete(&[], &[]).await.unwrap();
        assert!(response.content.unwrap().contains("escalated"));
    }
}
