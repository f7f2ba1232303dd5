//! System instructions for the chat model
//!
//! One instruction per translation direction plus the classification
//! instruction used by intent detection.

use crate::translate::types::TranslationDirection;

/// Classification instruction for intent detection
///
/// Makes the model emit a JSON object with `direction`, `confidence`,
/// and `reasoning` fields and nothing else.
pub const INTENT_PROMPT: &str = r#"You classify a piece of text written by someone on a software team.

Decide which of two categories the text belongs to:
- "product_to_dev": product-requirement language describing a desired feature, user value, or business goal that needs a technical rendering
- "dev_to_product": technical-implementation language describing architecture, code changes, or performance work that needs a business rendering

Respond with ONLY a JSON object in this exact format:
{
  "direction": "product_to_dev",
  "confidence": 0.92,
  "reasoning": "one short sentence explaining the call"
}

"confidence" is a number between 0.0 and 1.0 expressing how certain you are. Do not add any text outside the JSON object."#;

/// Instruction for rendering a product requirement in technical language
pub const PRODUCT_TO_DEV_PROMPT: &str = r#"You are a senior technical architect. The user gives you a product requirement written in business language.

Rewrite it as concrete technical implementation guidance:
- the core capabilities to build, in priority order
- data, API, and integration considerations
- complexity hotspots and technical risks worth flagging early
- a rough effort signal (small / medium / large) with one line of justification

Answer in the same language the user wrote in. Be specific and practical; do not pad."#;

/// Instruction for rendering a technical update in business language
pub const DEV_TO_PRODUCT_PROMPT: &str = r#"You are a product-minded technical advisor. The user gives you a technical update written in engineering language.

Rewrite it in business language:
- what changed from the user's point of view
- the product value delivered (speed, reliability, capability, cost)
- any user-facing impact, limitation, or rollout risk worth knowing

Avoid jargon; if a technical term is unavoidable, explain it in one clause. Answer in the same language the user wrote in."#;

/// System instruction for a translation direction
pub fn system_prompt(direction: TranslationDirection) -> &'static str {
    match direction {
        TranslationDirection::ProductToDev => PRODUCT_TO_DEV_PROMPT,
        TranslationDirection::DevToProduct => DEV_TO_PRODUCT_PROMPT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_are_direction_specific() {
        let product = system_prompt(TranslationDirection::ProductToDev);
        let dev = system_prompt(TranslationDirection::DevToProduct);

        assert!(product.contains("technical architect"));
        assert!(dev.contains("business language"));
        assert_ne!(product, dev);
    }

    #[test]
    fn test_intent_prompt_names_both_tokens() {
        assert!(INTENT_PROMPT.contains("product_to_dev"));
        assert!(INTENT_PROMPT.contains("dev_to_product"));
        assert!(INTENT_PROMPT.contains("confidence"));
    }
}
