//! Intent classification
//!
//! Decides which translation direction a piece of ambiguous content belongs
//! to by asking the chat model for a JSON verdict. Never fails upward: every
//! failure mode degrades into an `IntentResult` with a low confidence so the
//! orchestrator's threshold policy can resolve it uniformly.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::gateway::{ChatMessage, ChatModel};
use crate::translate::prompts::INTENT_PROMPT;
use crate::translate::types::{IntentResult, TranslationDirection};

/// Confidence reported when the model answered but the answer was unusable.
/// Distinct from the 0.0 used when the model was unreachable.
const PARSE_FAILURE_CONFIDENCE: f32 = 0.3;

/// LLM-backed intent classifier
pub struct IntentClassifier {
    gateway: Arc<dyn ChatModel>,
    temperature: f32,
}

impl IntentClassifier {
    pub fn new(gateway: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self {
            gateway,
            temperature,
        }
    }

    /// Classify content into a translation direction.
    ///
    /// Issues one non-streaming, low-temperature model call. Gateway
    /// failures yield confidence 0.0; unusable responses yield
    /// confidence 0.3.
    pub async fn detect(&self, content: &str) -> IntentResult {
        info!(
            content_length = content.chars().count(),
            "Intent detection started"
        );

        let messages = vec![
            ChatMessage::system(INTENT_PROMPT),
            ChatMessage::user(content),
        ];

        match self.gateway.complete(&messages, Some(self.temperature)).await {
            Ok(response) => {
                debug!("Intent model response: {response}");
                let result = parse_intent_response(&response);
                info!(
                    direction = %result.direction,
                    confidence = result.confidence,
                    "Intent detected"
                );
                result
            }
            Err(e) => {
                warn!("Intent detection call failed: {e}");
                IntentResult {
                    direction: TranslationDirection::ProductToDev,
                    confidence: 0.0,
                    reasoning: format!("intent model unavailable: {e}"),
                }
            }
        }
    }
}

/// Parse the model's JSON verdict, tolerating markdown fences and defaulting
/// every missing or invalid field.
fn parse_intent_response(response: &str) -> IntentResult {
    let payload = strip_code_fences(response);

    let value: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            warn!("Intent response is not valid JSON: {e}");
            return parse_failure_result();
        }
    };

    let Some(object) = value.as_object() else {
        warn!("Intent response is not a JSON object");
        return parse_failure_result();
    };

    let direction = match object.get("direction").and_then(|v| v.as_str()) {
        Some(token) => match TranslationDirection::from_token(token) {
            Ok(direction) => direction,
            Err(_) => {
                warn!("Unknown direction '{token}', defaulting to product_to_dev");
                TranslationDirection::ProductToDev
            }
        },
        None => TranslationDirection::ProductToDev,
    };

    let confidence = object
        .get("confidence")
        .and_then(|v| v.as_f64())
        .unwrap_or(0.5)
        .clamp(0.0, 1.0) as f32;

    let reasoning = object
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    IntentResult {
        direction,
        confidence,
        reasoning,
    }
}

fn parse_failure_result() -> IntentResult {
    IntentResult {
        direction: TranslationDirection::ProductToDev,
        confidence: PARSE_FAILURE_CONFIDENCE,
        reasoning: "could not parse the intent response, defaulted".to_string(),
    }
}

/// Strip a ```json or bare ``` fence, returning the inner payload.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();

    let body = if let Some((_, rest)) = trimmed.split_once("```json") {
        rest
    } else if let Some((_, rest)) = trimmed.split_once("```") {
        rest
    } else {
        return trimmed;
    };

    match body.split_once("```") {
        Some((inner, _)) => inner.trim(),
        None => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayError;
    use crate::testing::MockChatModel;

    #[test]
    fn test_parse_plain_json() {
        let result = parse_intent_response(
            r#"{"direction": "dev_to_product", "confidence": 0.92, "reasoning": "performance talk"}"#,
        );
        assert_eq!(result.direction, TranslationDirection::DevToProduct);
        assert_eq!(result.confidence, 0.92);
        assert_eq!(result.reasoning, "performance talk");
    }

    #[test]
    fn test_parse_json_fenced_block() {
        let fenced = "```json\n{\"direction\": \"product_to_dev\", \"confidence\": 0.85, \"reasoning\": \"feature ask\"}\n```";
        let result = parse_intent_response(fenced);
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_parse_bare_fenced_block() {
        let fenced = "```\n{\"direction\": \"product_to_dev\", \"confidence\": 0.85}\n```";
        let result = parse_intent_response(fenced);
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.85);
    }

    #[test]
    fn test_fenced_and_unfenced_parse_identically() {
        let raw = r#"{"direction": "dev_to_product", "confidence": 0.7, "reasoning": "r"}"#;
        let plain = parse_intent_response(raw);
        let fenced = parse_intent_response(&format!("```json\n{raw}\n```"));
        assert_eq!(plain.direction, fenced.direction);
        assert_eq!(plain.confidence, fenced.confidence);
        assert_eq!(plain.reasoning, fenced.reasoning);
    }

    #[test]
    fn test_unknown_direction_defaults_preserving_confidence() {
        let result = parse_intent_response(
            r#"{"direction": "sideways", "confidence": 0.77, "reasoning": "?"}"#,
        );
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.77);
    }

    #[test]
    fn test_confidence_clamped_above() {
        let result =
            parse_intent_response(r#"{"direction": "product_to_dev", "confidence": 1.5}"#);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_confidence_clamped_below() {
        let result =
            parse_intent_response(r#"{"direction": "product_to_dev", "confidence": -0.3}"#);
        assert_eq!(result.confidence, 0.0);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let result = parse_intent_response("{}");
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.reasoning, "");
    }

    #[test]
    fn test_prose_yields_parse_failure_result() {
        let result = parse_intent_response("I think this is a product requirement.");
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.3);
        assert!(result.reasoning.contains("could not parse"));
    }

    #[test]
    fn test_non_object_json_yields_parse_failure_result() {
        let result = parse_intent_response(r#""just a string""#);
        assert_eq!(result.confidence, 0.3);
    }

    #[test]
    fn test_strip_fences_passthrough_for_plain_text() {
        assert_eq!(strip_code_fences("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_detect_gateway_failure_degrades_to_zero_confidence() {
        let gateway = Arc::new(
            MockChatModel::new()
                .with_completion_error(GatewayError::Connection("refused".to_string())),
        );
        let classifier = IntentClassifier::new(gateway, 0.1);

        let result = classifier.detect("some ambiguous content").await;
        assert_eq!(result.direction, TranslationDirection::ProductToDev);
        assert_eq!(result.confidence, 0.0);
        assert!(result.reasoning.contains("unavailable"));
    }

    #[tokio::test]
    async fn test_detect_happy_path() {
        let gateway = Arc::new(MockChatModel::new().with_completion(
            r#"{"direction": "dev_to_product", "confidence": 0.9, "reasoning": "metrics"}"#,
        ));
        let classifier = IntentClassifier::new(gateway, 0.1);

        let result = classifier.detect("QPS went up thirty percent").await;
        assert_eq!(result.direction, TranslationDirection::DevToProduct);
        assert_eq!(result.confidence, 0.9);
    }
}
