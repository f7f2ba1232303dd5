//! Core types for the translation pipeline
//!
//! Defines the translation direction, validated requests, intent results,
//! and the outgoing stream protocol events.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::LimitsConfig;

/// Which of the two translation modes applies to a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranslationDirection {
    /// Product requirement -> technical implementation language
    ProductToDev,
    /// Technical update -> business language
    DevToProduct,
}

impl TranslationDirection {
    /// Wire token for this direction
    pub fn as_token(self) -> &'static str {
        match self {
            TranslationDirection::ProductToDev => "product_to_dev",
            TranslationDirection::DevToProduct => "dev_to_product",
        }
    }

    /// Parse a wire token; anything other than the two known tokens fails
    pub fn from_token(token: &str) -> Result<Self, UnknownDirection> {
        match token {
            "product_to_dev" => Ok(TranslationDirection::ProductToDev),
            "dev_to_product" => Ok(TranslationDirection::DevToProduct),
            other => Err(UnknownDirection(other.to_string())),
        }
    }
}

impl fmt::Display for TranslationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// A direction token outside the closed two-value set
#[derive(Debug, thiserror::Error)]
#[error("unknown translation direction: {0}")]
pub struct UnknownDirection(pub String);

/// Result of one intent classification attempt
#[derive(Debug, Clone)]
pub struct IntentResult {
    pub direction: TranslationDirection,
    /// Confidence in [0.0, 1.0], clamped at the parsing boundary
    pub confidence: f32,
    /// Free-text rationale, may be empty
    pub reasoning: String,
}

/// Classification metadata emitted ahead of an auto-detected translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentMetadata {
    pub detected_direction: TranslationDirection,
    pub confidence: f32,
    pub reasoning: String,
}

/// One unit of the outgoing event stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Detected direction, confidence, and reasoning (auto-detect path only)
    Metadata(IntentMetadata),
    /// Caution that the direction was guessed, not chosen
    Advisory(String),
    /// One incremental piece of translated text
    Fragment(String),
    /// Terminal success marker
    Done,
    /// Terminal error marker with a user-safe message
    Error(String),
}

/// A validated translation request
///
/// Construction is the only way to obtain an instance, so the cross-field
/// invariant (no auto-detect means an explicit direction) always holds.
#[derive(Debug, Clone)]
pub struct TranslateRequest {
    content: String,
    direction: Option<TranslationDirection>,
    auto_detect: bool,
}

impl TranslateRequest {
    pub fn new(
        content: String,
        direction: Option<TranslationDirection>,
        auto_detect: bool,
        limits: &LimitsConfig,
    ) -> Result<Self, RequestError> {
        let length = content.chars().count();
        if length < limits.content_min_chars || length > limits.content_max_chars {
            return Err(RequestError::ContentLength {
                min: limits.content_min_chars,
                max: limits.content_max_chars,
                actual: length,
            });
        }

        if !auto_detect && direction.is_none() {
            return Err(RequestError::MissingDirection);
        }

        Ok(Self {
            content,
            direction,
            auto_detect,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn direction(&self) -> Option<TranslationDirection> {
        self.direction
    }

    pub fn auto_detect(&self) -> bool {
        self.auto_detect
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

/// Request validation failures, surfaced before the pipeline runs
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("content must be between {min} and {max} characters, got {actual}")]
    ContentLength {
        min: usize,
        max: usize,
        actual: usize,
    },
    #[error("direction is required when auto_detect is false")]
    MissingDirection,
}

impl RequestError {
    /// Machine-readable error code for the HTTP surface
    pub fn code(&self) -> &'static str {
        match self {
            RequestError::ContentLength { .. } => "INVALID_CONTENT",
            RequestError::MissingDirection => "MISSING_DIRECTION",
        }
    }
}
