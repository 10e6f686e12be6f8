//! Telemetry record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a background compression run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    Saved,
    Stale,
    BelowThreshold,
    EmptyMiddle,
    NoSummaryModel,
    TrimmedAway,
    EmptySummary,
    Failed,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Saved => "saved",
            EventOutcome::Stale => "stale",
            EventOutcome::BelowThreshold => "below_threshold",
            EventOutcome::EmptyMiddle => "empty_middle",
            EventOutcome::NoSummaryModel => "no_summary_model",
            EventOutcome::TrimmedAway => "trimmed_away",
            EventOutcome::EmptySummary => "empty_summary",
            EventOutcome::Failed => "failed",
        }
    }
}

/// One finished background compression run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionEvent {
    pub conversation_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub model: Option<String>,
    pub outcome: EventOutcome,
    #[serde(default)]
    pub total_tokens: usize,
    #[serde(default)]
    pub messages_summarized: usize,
    #[serde(default)]
    pub compressed_through: Option<usize>,
    #[serde(default)]
    pub summary_chars: usize,
    #[serde(default)]
    pub error: Option<String>,
}
