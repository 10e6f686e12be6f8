use condenser_telemetry::EventOutcome;

/// Result of a forward-only summary write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created,
    Updated { previous: usize },
    /// Stored progress was already at or past the new value
    Stale { stored: usize },
    /// Backend error, already logged
    Failed,
}

/// How one background summarization run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    BelowThreshold { tokens: usize, threshold: usize },
    EmptyMiddle,
    NoSummaryModel,
    /// Every middle message was dropped to fit the summary model
    TrimmedAway,
    EmptySummary,
    Persisted {
        save: SaveOutcome,
        summarized: usize,
        compressed_through: usize,
        summary_chars: usize,
    },
    Failed(String),
}

impl RunOutcome {
    pub fn event_outcome(&self) -> EventOutcome {
        match self {
            RunOutcome::BelowThreshold { .. } => EventOutcome::BelowThreshold,
            RunOutcome::EmptyMiddle => EventOutcome::EmptyMiddle,
            RunOutcome::NoSummaryModel => EventOutcome::NoSummaryModel,
            RunOutcome::TrimmedAway => EventOutcome::TrimmedAway,
            RunOutcome::EmptySummary => EventOutcome::EmptySummary,
            RunOutcome::Persisted {
                save: SaveOutcome::Created | SaveOutcome::Updated { .. },
                ..
            } => EventOutcome::Saved,
            RunOutcome::Persisted {
                save: SaveOutcome::Stale { .. },
                ..
            } => EventOutcome::Stale,
            RunOutcome::Persisted {
                save: SaveOutcome::Failed,
                ..
            }
            | RunOutcome::Failed(_) => EventOutcome::Failed,
        }
    }
}
