//! Ordered chain of filters

use crate::base::{Filter, RequestBody, RequestContext};

/// Runs registered filters in registration order
pub struct FilterRegistry {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Register a filter; disabled filters are dropped
    pub fn register(&mut self, filter: Box<dyn Filter>) {
        if filter.is_enabled() {
            self.filters.push(filter);
        } else {
            tracing::debug!(filter = filter.name(), "filter disabled, not registered");
        }
    }

    pub async fn inlet(&self, mut body: RequestBody, ctx: &RequestContext) -> RequestBody {
        for filter in &self.filters {
            body = filter.inlet(body, ctx).await;
        }
        body
    }

    pub async fn outlet(&self, mut body: RequestBody, ctx: &RequestContext) -> RequestBody {
        for filter in &self.filters {
            body = filter.outlet(body, ctx).await;
        }
        body
    }

    pub fn names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
