//! Translation pipeline
//!
//! Intent detection, streaming translation, and the per-request orchestration
//! that ties them together into one outgoing event sequence.

pub mod intent;
pub mod orchestrator;
pub mod prompts;
pub mod stream;
pub mod types;

pub use intent::IntentClassifier;
pub use orchestrator::{EventStream, Orchestrator, TranslateError};
pub use stream::{StreamTranslator, user_safe_message};
pub use types::{
    IntentMetadata, IntentResult, RequestError, StreamEvent, TranslateRequest,
    TranslationDirection, UnknownDirection,
};
