//! Message model, compression configuration and window building

mod config;
mod types;
mod window;

pub use config::{
    clean_model_id, CompletionConfig, CompressionConfig, ModelThresholds, RetentionPolicy,
    ThresholdConfig, SUMMARY_PROMPT_BUFFER_TOKENS,
};
pub use types::{
    estimate_message_tokens, Content, ContentPart, ConversationSummary, Message, Role, TextKind,
    TextPart,
};
pub use window::{build_window, summary_message, Window};
