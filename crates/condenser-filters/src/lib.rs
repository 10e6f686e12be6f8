//! Host filters: hook contract, filter chain and the context compression filter

pub mod base;
pub mod compression;
pub mod registry;

pub use base::{conversation_id, Filter, HookMetadata, RequestBody, RequestContext};
pub use compression::ContextCompressionFilter;
pub use registry::FilterRegistry;
