//! OpenAI-compatible chat gateway
//!
//! Implements the `ChatModel` trait over an OpenAI-compatible HTTP endpoint
//! (DeepSeek by default). Supports non-streaming completions and SSE
//! streaming, with configurable URL, model, and API key via environment
//! variable. Calls are single-attempt; failures are classified, never retried.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::config::ModelConfig;
use crate::gateway::{ChatMessage, ChatModel, DeltaStream, GatewayError};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DELTA_CHANNEL_CAPACITY: usize = 32;

/// Chat gateway over an OpenAI-compatible HTTP API
#[derive(Debug)]
pub struct OpenAiGateway {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    request_timeout: Duration,
}

/// OpenAI-compatible chat completion request
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Message in the chat completion request
#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

/// Choice in the chat completion response
#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

/// Message in the response choice
#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// One SSE chunk of a streaming completion
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

impl OpenAiGateway {
    /// Create a new gateway from the model configuration.
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env`; an unset variable leaves the gateway
    /// unavailable rather than failing construction, so the server can
    /// report the misconfiguration per request.
    pub fn new(config: &ModelConfig) -> Result<Self, GatewayError> {
        let api_key = config.api_key();

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Unknown(e.to_string()))?;

        let endpoint = format!("{}/chat/completions", config.api_url.trim_end_matches('/'));

        info!(
            "OpenAiGateway initialized with model: {}, endpoint: {}",
            config.model, endpoint
        );

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
            request_timeout: config.timeout(),
        })
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        stream: bool,
        temperature: Option<f32>,
    ) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str(),
                    content: m.content.clone(),
                })
                .collect(),
            stream,
            temperature,
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiGateway {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: Option<f32>,
    ) -> Result<String, GatewayError> {
        let request = self.build_request(messages, false, temperature);
        debug!("Calling chat endpoint at: {}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Protocol(format!("malformed completion body: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GatewayError::Protocol("empty response".to_string()))
    }

    async fn open_stream(&self, messages: &[ChatMessage]) -> Result<DeltaStream, GatewayError> {
        let request = self.build_request(messages, true, None);
        debug!("Opening streaming completion at: {}", self.endpoint);

        // No request-level timeout here: the caller bounds stream creation,
        // and an established stream may legitimately outlive any fixed ceiling.
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(classify_status(status, &body));
        }

        let (tx, rx) = mpsc::channel(DELTA_CHANNEL_CAPACITY);
        tokio::spawn(pump_deltas(response, tx));

        Ok(Box::pin(ReceiverStream::new(rx)))
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn name(&self) -> &'static str {
        "openai-compatible"
    }
}

/// Forward SSE text deltas from the upstream body into the channel.
///
/// Ends silently on the `[DONE]` sentinel or body exhaustion; forwards a
/// single classified error otherwise. A closed receiver aborts the pump,
/// which drops the upstream connection.
async fn pump_deltas(response: reqwest::Response, tx: mpsc::Sender<Result<String, GatewayError>>) {
    let mut upstream = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = upstream.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(e) => {
                let _ = tx.send(Err(classify_transport(e))).await;
                return;
            }
        };

        buffer.push_str(&String::from_utf8_lossy(&bytes));

        while let Some(newline) = buffer.find('\n') {
            let line: String = buffer.drain(..=newline).collect();
            let line = line.trim_end();

            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();

            if data == "[DONE]" {
                return;
            }

            let Ok(parsed) = serde_json::from_str::<StreamChunk>(data) else {
                debug!("Skipping unparseable stream line: {data}");
                continue;
            };

            if let Some(text) = parsed.choices.into_iter().next().and_then(|c| c.delta.content)
            {
                if !text.is_empty() && tx.send(Ok(text)).await.is_err() {
                    return;
                }
            }
        }
    }
}

fn classify_status(status: StatusCode, body: &str) -> GatewayError {
    match status.as_u16() {
        401 | 403 => GatewayError::Auth(format!("upstream rejected credentials ({status})")),
        429 => GatewayError::RateLimited(format!("upstream throttled the request ({status})")),
        _ => GatewayError::Protocol(format!("upstream returned {status}: {body}")),
    }
}

fn classify_transport(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else if e.is_body() || e.is_decode() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::Unknown(e.to_string())
    }
}
