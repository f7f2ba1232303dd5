//! Request orchestration
//!
//! Composes intent detection and streaming translation into one outgoing
//! event sequence per request. The flow is strictly linear: an explicit
//! direction goes straight to translation; an absent one is classified
//! first, then either rejected or translated with metadata up front.

use futures::{Stream, StreamExt, stream};
use std::pin::Pin;
use tracing::{info, warn};

use crate::config::IntentConfig;
use crate::translate::intent::IntentClassifier;
use crate::translate::stream::StreamTranslator;
use crate::translate::types::{IntentMetadata, StreamEvent, TranslateRequest};

/// Outgoing event sequence for one request
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

const ADVISORY_NOTICE: &str =
    "direction was detected automatically, switch to manual selection if this looks wrong";

/// Failures that end a request before any stream is opened
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// The classifier was not confident enough to pick a direction
    #[error("could not determine the content type with enough confidence ({confidence:.2})")]
    LowConfidence { confidence: f32 },
}

/// Per-request composition of classifier and translator
pub struct Orchestrator {
    classifier: IntentClassifier,
    translator: StreamTranslator,
    policy: IntentConfig,
}

impl Orchestrator {
    pub fn new(
        classifier: IntentClassifier,
        translator: StreamTranslator,
        policy: IntentConfig,
    ) -> Self {
        Self {
            classifier,
            translator,
            policy,
        }
    }

    /// Produce the full outgoing event sequence for a validated request.
    ///
    /// Classification, when it happens, completes before the stream is
    /// returned; a low-confidence verdict rejects the request without
    /// opening any translation stream.
    pub async fn run(&self, request: TranslateRequest) -> Result<EventStream, TranslateError> {
        if let Some(direction) = request.direction() {
            info!(%direction, auto_detect = request.auto_detect(), "Translating with explicit direction");
            let translation = self.translator.translate(request.into_content(), direction);
            return Ok(Box::pin(translation));
        }

        // Direction absent: the request invariant guarantees auto_detect here
        let intent = self.classifier.detect(request.content()).await;

        if intent.confidence < self.policy.reject_threshold {
            warn!(
                confidence = intent.confidence,
                threshold = self.policy.reject_threshold,
                "Intent confidence below threshold, rejecting"
            );
            return Err(TranslateError::LowConfidence {
                confidence: intent.confidence,
            });
        }

        let direction = intent.direction;
        info!(%direction, confidence = intent.confidence, "Translating with detected direction");

        let mut prelude = vec![StreamEvent::Metadata(IntentMetadata {
            detected_direction: direction,
            confidence: intent.confidence,
            reasoning: intent.reasoning,
        })];

        if intent.confidence < self.policy.advisory_threshold {
            prelude.push(StreamEvent::Advisory(ADVISORY_NOTICE.to_string()));
        }

        let translation = self.translator.translate(request.into_content(), direction);
        Ok(Box::pin(stream::iter(prelude).chain(translation)))
    }
}
