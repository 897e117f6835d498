//! Kernel module - server infrastructure and dependencies.

pub mod ai;
pub mod deps;
pub mod test_dependencies;
pub mod traits;
pub mod vision;

/// Default model for field extraction and image classification.
pub const GPT_4O_MINI: &str = "gpt-4o-mini";

pub use ai::OpenAIChat;
pub use deps::{ServerDeps, DEFAULT_MAX_FIELD_LENGTH};
pub use test_dependencies::{MockAI, MockImageClassifier};
pub use traits::*;
pub use vision::OpenAIVisionClassifier;
