//! Token estimation utilities

#[cfg(feature = "tiktoken")]
use std::sync::OnceLock;

/// Characters per token used when no BPE encoder is available
const CHARS_PER_TOKEN: usize = 4;

#[cfg(feature = "tiktoken")]
static ENCODER: OnceLock<Option<tiktoken_rs::CoreBPE>> = OnceLock::new();

#[cfg(feature = "tiktoken")]
fn encoder() -> Option<&'static tiktoken_rs::CoreBPE> {
    ENCODER
        .get_or_init(|| match tiktoken_rs::o200k_base() {
            Ok(bpe) => Some(bpe),
            Err(e) => {
                tracing::warn!(error = %e, "o200k_base encoder unavailable, using character heuristic");
                None
            }
        })
        .as_ref()
}

/// Estimate BPE token count from text
///
/// Uses the `o200k_base` encoding when the `tiktoken` feature is enabled and
/// the encoder loads. Otherwise falls back to [`heuristic_tokens`].
/// Returns 0 for empty text.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    #[cfg(feature = "tiktoken")]
    if let Some(bpe) = encoder() {
        let encoded = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            bpe.encode_ordinary(text).len()
        }));
        match encoded {
            Ok(count) => return count,
            Err(_) => tracing::debug!("tokenizer failed, falling back to character estimate"),
        }
    }

    heuristic_tokens(text)
}

/// Character-length estimate: ~4 chars per token, rounded up.
///
/// Monotonic in the number of characters.
pub fn heuristic_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}
