//! Summary persistence, LLM summarization and background scheduling

pub mod compressor;
mod error;
mod status;
mod storage;
mod summarizer;
mod tasks;
mod types;

pub use compressor::{
    build_summary_prompt, format_transcript, CompletionClient, CompletionRequest,
    OpenAiCompatClient, UserInfo,
};
pub use error::{CompressError, StoreError, StoreResult};
pub use status::{HostEvent, StatusSender, StatusUpdate};
pub use storage::{SqliteSummaryBackend, SummaryBackend, SummaryStore};
pub use summarizer::{trim_to_budget, CompressionJob, Summarizer};
pub use tasks::BackgroundQueue;
pub use types::{RunOutcome, SaveOutcome};
