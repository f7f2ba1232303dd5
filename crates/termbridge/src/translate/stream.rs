//! Streaming translation
//!
//! Drives a streaming model call for a known direction and renders the
//! outcome as a sequence of `StreamEvent`s ending in exactly one terminal
//! marker. Upstream failures become user-safe error markers; raw vendor
//! error text goes to the logs only.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, error, info};

use futures::StreamExt;

use crate::gateway::{ChatMessage, ChatModel, GatewayError};
use crate::translate::prompts::system_prompt;
use crate::translate::types::{StreamEvent, TranslationDirection};

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Streaming translator for a known direction
pub struct StreamTranslator {
    gateway: Arc<dyn ChatModel>,
    timeout: Duration,
}

impl StreamTranslator {
    pub fn new(gateway: Arc<dyn ChatModel>, timeout: Duration) -> Self {
        Self { gateway, timeout }
    }

    /// Translate content in the given direction as a live event stream.
    ///
    /// The timeout bounds opening the model stream, not per-chunk delivery.
    /// Exactly one terminal marker (`Done` or `Error`) closes the sequence.
    /// Dropping the returned stream abandons the upstream call.
    pub fn translate(
        &self,
        content: String,
        direction: TranslationDirection,
    ) -> ReceiverStream<StreamEvent> {
        info!(
            direction = %direction,
            content_length = content.chars().count(),
            "Translation started"
        );

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let gateway = Arc::clone(&self.gateway);
        let deadline = self.timeout;

        tokio::spawn(async move {
            let messages = vec![
                ChatMessage::system(system_prompt(direction)),
                ChatMessage::user(content),
            ];

            let opened = tokio::time::timeout(deadline, gateway.open_stream(&messages)).await;

            let mut deltas = match opened {
                Err(_elapsed) => {
                    error!(
                        timeout_secs = deadline.as_secs(),
                        "Translation request timed out"
                    );
                    let _ = tx
                        .send(StreamEvent::Error(
                            user_safe_message(&GatewayError::Timeout).to_string(),
                        ))
                        .await;
                    return;
                }
                Ok(Err(e)) => {
                    error!("Failed to open translation stream: {e}");
                    let _ = tx
                        .send(StreamEvent::Error(user_safe_message(&e).to_string()))
                        .await;
                    return;
                }
                Ok(Ok(stream)) => stream,
            };

            let mut fragments = 0usize;
            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) => {
                        if text.is_empty() {
                            continue;
                        }
                        fragments += 1;
                        if tx.send(StreamEvent::Fragment(text)).await.is_err() {
                            debug!("Client disconnected, abandoning translation stream");
                            return;
                        }
                    }
                    Err(e) => {
                        error!(fragments, "Translation stream failed: {e}");
                        let _ = tx
                            .send(StreamEvent::Error(user_safe_message(&e).to_string()))
                            .await;
                        return;
                    }
                }
            }

            info!(fragments, "Translation completed successfully");
            let _ = tx.send(StreamEvent::Done).await;
        });

        ReceiverStream::new(rx)
    }
}

/// Fixed mapping from gateway failure kind to the message shown to the user
pub fn user_safe_message(error: &GatewayError) -> &'static str {
    match error {
        GatewayError::Auth(_) => "translation service is misconfigured, contact the administrator",
        GatewayError::RateLimited(_) => "too many requests, retry in a moment",
        GatewayError::Connection(_) => {
            "network issue while reaching the translation service, retry later"
        }
        GatewayError::Timeout => "translation service timed out, retry later",
        GatewayError::Protocol(_) | GatewayError::Unknown(_) => {
            "translation service is temporarily unavailable, retry later"
        }
    }
}
