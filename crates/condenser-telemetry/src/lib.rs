//! Token estimation, state paths and the compression event log

mod io;
mod paths;
mod tokens;
mod types;

pub use io::{append_jsonl, atomic_write, read_jsonl};
pub use paths::{Paths, HOME_ENV};
pub use tokens::{estimate_tokens, heuristic_tokens};
pub use types::{CompressionEvent, EventOutcome};
