//! Chat model gateway
//!
//! Defines the `ChatModel` trait that abstracts the upstream generative model
//! (OpenAI-compatible HTTP APIs in production, mocks in tests) together with
//! the error taxonomy every implementation classifies its failures into.

mod openai;

pub use openai::OpenAiGateway;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// A finite sequence of text deltas from a streaming model call.
///
/// Exhaustion of the stream is the completion signal; an `Err` item is
/// terminal and no further deltas follow it.
pub type DeltaStream = Pin<Box<dyn Stream<Item = Result<String, GatewayError>> + Send>>;

/// Message role accepted by the chat endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

/// One (role, text) pair in a chat completion request
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Classified gateway failures
///
/// Every upstream failure is folded into one of these kinds; callers decide
/// what each kind means for the end user. The gateway never retries - a
/// failed call surfaces immediately.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("connection failed: {0}")]
    Connection(String),
    #[error("request timed out")]
    Timeout,
    #[error("upstream protocol error: {0}")]
    Protocol(String),
    #[error("unexpected gateway failure: {0}")]
    Unknown(String),
}

/// Trait for chat model backends
///
/// Implementations own the connection handling and the model name; calls are
/// single-attempt and safe to issue concurrently from any number of requests.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Issue a non-streaming chat completion and return the full response text
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, GatewayError>;

    /// Open a streaming chat completion
    ///
    /// Returns a stream of non-empty text deltas in emission order. Consuming
    /// the stream to exhaustion is the only way to observe completion.
    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<DeltaStream, GatewayError>;

    /// Whether the backend has a usable credential configured
    async fn is_available(&self) -> bool;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}
