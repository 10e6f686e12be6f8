//! Compression trigger and background summarization

use crate::compressor::{build_summary_prompt, CompletionClient, CompletionRequest, UserInfo};
use crate::error::CompressError;
use crate::status::StatusSender;
use crate::storage::SummaryStore;
use crate::types::{RunOutcome, SaveOutcome};
use chrono::Utc;
use condenser_core::{
    clean_model_id, estimate_message_tokens, CompressionConfig, Message,
    SUMMARY_PROMPT_BUFFER_TOKENS,
};
use condenser_telemetry::{append_jsonl, CompressionEvent};
use std::path::PathBuf;
use std::sync::Arc;

const STATUS_ERROR_CHARS: usize = 100;

/// One post-response compression request
#[derive(Debug, Clone)]
pub struct CompressionJob {
    pub conversation_id: String,
    /// Model the conversation is using
    pub model: Option<String>,
    pub messages: Arc<[Message]>,
    pub target_compressed_through: usize,
    pub user: Option<UserInfo>,
    pub status: Option<StatusSender>,
}

#[derive(Debug, Default)]
struct RunStats {
    total_tokens: usize,
    summary_model: Option<String>,
}

/// Number of leading messages to drop so `token_counts` plus the prompt
/// buffer fits in `max_context_tokens`
pub fn trim_to_budget(token_counts: &[usize], max_context_tokens: usize) -> usize {
    let mut total: usize = token_counts.iter().sum();
    let mut dropped = 0;
    while dropped < token_counts.len() && total + SUMMARY_PROMPT_BUFFER_TOKENS > max_context_tokens {
        total -= token_counts[dropped];
        dropped += 1;
    }
    dropped
}

fn truncate_error(message: &str) -> String {
    match message.char_indices().nth(STATUS_ERROR_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

async fn blocking<T, F>(func: F) -> Result<T, CompressError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(func)
        .await
        .map_err(|e| CompressError::Task(e.to_string()))
}

pub struct Summarizer {
    config: Arc<CompressionConfig>,
    store: SummaryStore,
    client: Arc<dyn CompletionClient>,
    event_log: Option<PathBuf>,
}

impl Summarizer {
    pub fn new(
        config: Arc<CompressionConfig>,
        store: SummaryStore,
        client: Arc<dyn CompletionClient>,
    ) -> Self {
        Self {
            config,
            store,
            client,
            event_log: None,
        }
    }

    /// Append a [`CompressionEvent`] to `path` after every run
    pub fn with_event_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.event_log = Some(path.into());
        self
    }

    pub fn store(&self) -> &SummaryStore {
        &self.store
    }

    /// Run one job to completion. Never fails; errors become
    /// [`RunOutcome::Failed`] and an optional status notification.
    pub async fn run(&self, job: CompressionJob) -> RunOutcome {
        let mut stats = RunStats::default();

        let outcome = match self.try_run(&job, &mut stats).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = e.to_string();
                if self.config.summary_model.is_none() {
                    tracing::error!(
                        conversation_id = %job.conversation_id,
                        error = %message,
                        hint = "set summary_model to a model with a large context window",
                        "summary generation failed"
                    );
                } else {
                    tracing::error!(
                        conversation_id = %job.conversation_id,
                        error = %message,
                        "summary generation failed"
                    );
                }
                self.notify(&job, format!("Summary error: {}", truncate_error(&message)), true);
                RunOutcome::Failed(message)
            }
        };

        self.record(&job, &outcome, &stats).await;
        outcome
    }

    async fn try_run(
        &self,
        job: &CompressionJob,
        stats: &mut RunStats,
    ) -> Result<RunOutcome, CompressError> {
        let conversation_model = clean_model_id(job.model.as_deref()).unwrap_or_default();
        let thresholds = self.config.resolve_thresholds(&conversation_model);

        let messages = job.messages.clone();
        let total_tokens = blocking(move || estimate_message_tokens(&messages)).await?;
        stats.total_tokens = total_tokens;

        if total_tokens < thresholds.compression_threshold_tokens {
            tracing::debug!(
                conversation_id = %job.conversation_id,
                tokens = total_tokens,
                threshold = thresholds.compression_threshold_tokens,
                "below compression threshold"
            );
            return Ok(RunOutcome::BelowThreshold {
                tokens: total_tokens,
                threshold: thresholds.compression_threshold_tokens,
            });
        }

        tracing::info!(
            conversation_id = %job.conversation_id,
            tokens = total_tokens,
            threshold = thresholds.compression_threshold_tokens,
            "compression threshold reached"
        );

        let Some(range) = self.config.retention().middle(job.messages.len()) else {
            tracing::debug!(conversation_id = %job.conversation_id, "middle segment empty, nothing to summarize");
            return Ok(RunOutcome::EmptyMiddle);
        };

        let Some(summary_model) = self.config.summary_model_for(job.model.as_deref()) else {
            tracing::warn!(
                conversation_id = %job.conversation_id,
                "no summary model available, skipping compression"
            );
            return Ok(RunOutcome::NoSummaryModel);
        };
        stats.summary_model = Some(summary_model.clone());

        let budget = self.config.resolve_thresholds(&summary_model).max_context_tokens;
        let middle: Vec<Message> = job.messages[range].to_vec();
        let (middle, counts) = blocking(move || {
            let counts: Vec<usize> = middle.iter().map(Message::estimated_tokens).collect();
            (middle, counts)
        })
        .await?;

        let dropped = trim_to_budget(&counts, budget);
        if dropped > 0 {
            tracing::warn!(
                conversation_id = %job.conversation_id,
                model = %summary_model,
                dropped,
                budget,
                "middle segment exceeds summary model context, dropping oldest messages"
            );
        }
        let middle = &middle[dropped..];
        if middle.is_empty() {
            return Ok(RunOutcome::TrimmedAway);
        }

        self.notify(job, "Generating context summary in background...", false);

        let request = CompletionRequest {
            model: summary_model,
            prompt: build_summary_prompt(middle, self.config.max_summary_tokens),
            max_tokens: self.config.max_summary_tokens,
            temperature: self.config.summary_temperature,
        };
        let summary = self
            .client
            .complete(&request, job.user.as_ref())
            .await
            .map_err(|e| match e {
                CompressError::Api { status: 404, .. } => {
                    CompressError::ModelNotFound(request.model.clone())
                }
                other => other,
            })?;
        if summary.trim().is_empty() {
            tracing::warn!(conversation_id = %job.conversation_id, "summary model returned empty text");
            return Ok(RunOutcome::EmptySummary);
        }

        let save = self
            .store
            .save(&job.conversation_id, &summary, job.target_compressed_through)
            .await;
        if matches!(save, SaveOutcome::Created | SaveOutcome::Updated { .. }) {
            self.notify(
                job,
                format!("Context summary updated (compressed {} messages)", middle.len()),
                true,
            );
        }

        Ok(RunOutcome::Persisted {
            save,
            summarized: middle.len(),
            compressed_through: job.target_compressed_through,
            summary_chars: summary.chars().count(),
        })
    }

    fn notify(&self, job: &CompressionJob, description: impl Into<String>, done: bool) {
        if !self.config.emit_status {
            return;
        }
        if let Some(status) = &job.status {
            status.status(description, done);
        }
    }

    async fn record(&self, job: &CompressionJob, outcome: &RunOutcome, stats: &RunStats) {
        let Some(path) = self.event_log.clone() else {
            return;
        };

        let mut event = CompressionEvent {
            conversation_id: job.conversation_id.clone(),
            timestamp: Utc::now(),
            model: stats
                .summary_model
                .clone()
                .or_else(|| clean_model_id(job.model.as_deref())),
            outcome: outcome.event_outcome(),
            total_tokens: stats.total_tokens,
            messages_summarized: 0,
            compressed_through: None,
            summary_chars: 0,
            error: None,
        };
        match outcome {
            RunOutcome::Persisted {
                summarized,
                compressed_through,
                summary_chars,
                ..
            } => {
                event.messages_summarized = *summarized;
                event.compressed_through = Some(*compressed_through);
                event.summary_chars = *summary_chars;
            }
            RunOutcome::Failed(message) => event.error = Some(message.clone()),
            _ => {}
        }

        let result = tokio::task::spawn_blocking(move || append_jsonl(&path, &event)).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "failed to append compression event"),
            Err(e) => tracing::warn!(error = %e, "compression event task failed"),
        }
    }
}
