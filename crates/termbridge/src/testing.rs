//! Test utilities for termbridge - a scriptable chat model mock
//!
//! `MockChatModel` implements the `ChatModel` trait with pre-scripted
//! completion and stream behavior so pipeline tests run without a network.

use async_trait::async_trait;
use std::time::Duration;

use crate::gateway::{ChatMessage, ChatModel, DeltaStream, GatewayError};

/// Scriptable chat model for deterministic tests
///
/// Defaults: available, no scripted completion (completing fails with
/// `Unknown`), an empty delta stream that completes immediately.
pub struct MockChatModel {
    completion: Option<Result<String, GatewayError>>,
    open_error: Option<GatewayError>,
    open_delay: Option<Duration>,
    deltas: Vec<Result<String, GatewayError>>,
    available: bool,
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            completion: None,
            open_error: None,
            open_delay: None,
            deltas: Vec::new(),
            available: true,
        }
    }

    /// Script the non-streaming completion response
    pub fn with_completion(mut self, text: impl Into<String>) -> Self {
        self.completion = Some(Ok(text.into()));
        self
    }

    /// Script a non-streaming completion failure
    pub fn with_completion_error(mut self, error: GatewayError) -> Self {
        self.completion = Some(Err(error));
        self
    }

    /// Script the stream deltas yielded after a successful open
    pub fn with_deltas(mut self, deltas: &[&str]) -> Self {
        self.deltas
            .extend(deltas.iter().map(|d| Ok(d.to_string())));
        self
    }

    /// Script a mid-stream failure after any scripted deltas
    pub fn with_stream_error(mut self, error: GatewayError) -> Self {
        self.deltas.push(Err(error));
        self
    }

    /// Script a failure when opening the stream
    pub fn with_open_error(mut self, error: GatewayError) -> Self {
        self.open_error = Some(error);
        self
    }

    /// Delay stream opening, for timeout tests
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    /// Report the backend as having no credential configured
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(
        &self,
        _messages: &[ChatMessage],
        _temperature: Option<f32>,
    ) -> Result<String, GatewayError> {
        match &self.completion {
            Some(result) => result.clone(),
            None => Err(GatewayError::Unknown("no completion scripted".to_string())),
        }
    }

    async fn open_stream(&self, _messages: &[ChatMessage]) -> Result<DeltaStream, GatewayError> {
        if let Some(delay) = self.open_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = &self.open_error {
            return Err(error.clone());
        }
        Ok(Box::pin(futures::stream::iter(self.deltas.clone())))
    }

    async fn is_available(&self) -> bool {
        self.available
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
