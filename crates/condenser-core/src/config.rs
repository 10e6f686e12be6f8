//! Configuration for context compression

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Buffer added to the middle-segment estimate for the prompt and the output
pub const SUMMARY_PROMPT_BUFFER_TOKENS: usize = 2000;

/// Active thresholds for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Total tokens at or above which a summary is generated
    pub compression_threshold_tokens: usize,
    /// Context ceiling of the model
    pub max_context_tokens: usize,
}

/// Per-model override; absent fields use the global value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelThresholds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_threshold_tokens: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_context_tokens: Option<usize>,
}

/// Messages that are never summarized away
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub keep_first: usize,
    pub keep_last: usize,
}

impl RetentionPolicy {
    pub fn new(keep_first: usize, keep_last: usize) -> Self {
        Self {
            keep_first,
            keep_last,
        }
    }

    /// Progress marker a summary of `n` messages should record
    pub fn target_compressed_through(&self, n: usize) -> usize {
        n.saturating_sub(self.keep_last)
    }

    /// Index range of the summarization candidates, `None` when empty
    pub fn middle(&self, n: usize) -> Option<std::ops::Range<usize>> {
        let start = self.keep_first;
        let end = if self.keep_last == 0 {
            n
        } else {
            n.saturating_sub(self.keep_last)
        };
        (start < end).then_some(start..end)
    }
}

/// OpenAI-compatible completion endpoint settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    /// Environment variable holding the bearer token
    pub api_key_env: Option<String>,
    /// Request timeout for the summary call
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: 120,
        }
    }
}

/// Compression configuration, loaded once and shared read-only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Master switch for the filter
    pub enabled: bool,
    /// Emit status notifications to the host
    pub emit_status: bool,
    pub compression_threshold_tokens: usize,
    pub max_context_tokens: usize,
    pub model_thresholds: HashMap<String, ModelThresholds>,
    pub keep_first: usize,
    pub keep_last: usize,
    /// Model used for summaries; the conversation model when unset
    pub summary_model: Option<String>,
    pub max_summary_tokens: u32,
    pub summary_temperature: f32,
    pub completion: CompletionConfig,
}

impl CompressionConfig {
    pub fn new() -> Self {
        Self {
            enabled: true,
            emit_status: true,
            compression_threshold_tokens: 64_000,
            max_context_tokens: 128_000,
            model_thresholds: HashMap::new(),
            keep_first: 1,
            keep_last: 6,
            summary_model: None,
            max_summary_tokens: 16_384,
            summary_temperature: 0.1,
            completion: CompletionConfig::default(),
        }
    }

    /// Clamp values into their accepted ranges
    pub fn normalized(mut self) -> Self {
        self.max_summary_tokens = self.max_summary_tokens.max(1);
        self.summary_temperature = if self.summary_temperature.is_finite() {
            self.summary_temperature.clamp(0.0, 2.0)
        } else {
            0.1
        };
        self
    }

    pub fn retention(&self) -> RetentionPolicy {
        RetentionPolicy::new(self.keep_first, self.keep_last)
    }

    /// Thresholds for `model_id`: its override when present, else the globals
    pub fn resolve_thresholds(&self, model_id: &str) -> ThresholdConfig {
        match self.model_thresholds.get(model_id) {
            Some(over) => {
                tracing::debug!(model = model_id, "using model-specific thresholds");
                ThresholdConfig {
                    compression_threshold_tokens: over
                        .compression_threshold_tokens
                        .unwrap_or(self.compression_threshold_tokens),
                    max_context_tokens: over.max_context_tokens.unwrap_or(self.max_context_tokens),
                }
            }
            None => {
                tracing::debug!(model = model_id, "no model thresholds, using globals");
                ThresholdConfig {
                    compression_threshold_tokens: self.compression_threshold_tokens,
                    max_context_tokens: self.max_context_tokens,
                }
            }
        }
    }

    /// Model to summarize with: `summary_model`, else the conversation model
    pub fn summary_model_for(&self, conversation_model: Option<&str>) -> Option<String> {
        clean_model_id(self.summary_model.as_deref()).or_else(|| clean_model_id(conversation_model))
    }
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Trim whitespace and surrounding quotes; empty ids become `None`
pub fn clean_model_id(model_id: Option<&str>) -> Option<String> {
    let cleaned = model_id?.trim().trim_matches(&['"', '\''][..]);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
