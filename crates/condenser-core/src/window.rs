//! Compressed message window: head + summary + tail

use crate::config::RetentionPolicy;
use crate::types::{ConversationSummary, Message};

const SUMMARY_PREAMBLE: &str = "[Context note: the following is a summary of the earlier \
conversation, provided for context only. Do not reply to the summary itself; answer the \
latest messages directly.]";

const SUMMARY_TRAILER: &str = "---\nThe recent conversation follows:";

/// Result of building the outgoing window
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    pub messages: Vec<Message>,
    /// Effective `compressed_through` after clamping
    pub hidden: usize,
    pub head_len: usize,
    pub tail_len: usize,
    /// Whether a summary message was inserted
    pub summarized: bool,
}

/// Synthetic assistant message carrying the stored summary
pub fn summary_message(summary_text: &str) -> Message {
    Message::assistant(format!(
        "{}\n\n{}\n\n{}",
        SUMMARY_PREAMBLE, summary_text, SUMMARY_TRAILER
    ))
}

/// Build the window sent to the completion call
///
/// Without a summary the messages pass through unchanged. With one, the
/// output is `messages[..keep_first]`, one summary message, then
/// `messages[max(c, keep_first)..]`. A stored `compressed_through` beyond the
/// current length is replaced by `n - keep_last`.
pub fn build_window(
    messages: &[Message],
    policy: RetentionPolicy,
    summary: Option<&ConversationSummary>,
) -> Window {
    let n = messages.len();

    let Some(summary) = summary else {
        return Window {
            messages: messages.to_vec(),
            hidden: 0,
            head_len: 0,
            tail_len: n,
            summarized: false,
        };
    };

    let mut compressed = summary.compressed_through;
    if compressed > n {
        let recomputed = policy.target_compressed_through(n);
        tracing::warn!(
            conversation_id = %summary.conversation_id,
            stored = compressed,
            messages = n,
            recomputed,
            "stored progress exceeds message count, recomputing"
        );
        compressed = recomputed;
    }

    let head_end = policy.keep_first.min(n);
    let start = compressed.max(policy.keep_first).min(n);

    let mut output = Vec::with_capacity(head_end + 1 + (n - start));
    output.extend_from_slice(&messages[..head_end]);
    output.push(summary_message(&summary.summary_text));
    output.extend_from_slice(&messages[start..]);

    Window {
        messages: output,
        hidden: compressed,
        head_len: head_end,
        tail_len: n - start,
        summarized: true,
    }
}
