//! Context compression filter: summary injection on the way in, background
//! summarization on the way out

use crate::base::{conversation_id, Filter, RequestBody, RequestContext};
use async_trait::async_trait;
use condenser_compress::{BackgroundQueue, CompressionJob, Summarizer};
use condenser_core::{build_window, CompressionConfig};
use std::sync::Arc;

pub struct ContextCompressionFilter {
    config: Arc<CompressionConfig>,
    summarizer: Arc<Summarizer>,
    queue: BackgroundQueue,
}

impl ContextCompressionFilter {
    pub fn new(
        config: Arc<CompressionConfig>,
        summarizer: Arc<Summarizer>,
        queue: BackgroundQueue,
    ) -> Self {
        Self {
            config,
            summarizer,
            queue,
        }
    }

    pub fn queue(&self) -> &BackgroundQueue {
        &self.queue
    }
}

#[async_trait]
impl Filter for ContextCompressionFilter {
    fn name(&self) -> &str {
        "context_compression"
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    async fn inlet(&self, mut body: RequestBody, ctx: &RequestContext) -> RequestBody {
        let Some(id) = conversation_id(&body, ctx) else {
            tracing::warn!("inlet: missing conversation id, skipping compression");
            return body;
        };

        let summary = self.summarizer.store().load(&id).await;
        let window = build_window(&body.messages, self.config.retention(), summary.as_ref());
        if !window.summarized {
            tracing::debug!(conversation_id = %id, messages = body.messages.len(), "no summary, passing through");
            return body;
        }

        tracing::info!(
            conversation_id = %id,
            received = body.messages.len(),
            head = window.head_len,
            tail = window.tail_len,
            hidden = window.hidden,
            "applied summary"
        );

        if self.config.emit_status {
            if let Some(status) = &ctx.status {
                status.status(
                    format!(
                        "Loaded historical summary (hidden {} historical messages)",
                        window.hidden
                    ),
                    true,
                );
            }
        }

        body.messages = window.messages;
        body
    }

    async fn outlet(&self, body: RequestBody, ctx: &RequestContext) -> RequestBody {
        let Some(id) = conversation_id(&body, ctx) else {
            tracing::warn!("outlet: missing conversation id, skipping compression");
            return body;
        };

        let target = self
            .config
            .retention()
            .target_compressed_through(body.messages.len());

        let job = CompressionJob {
            conversation_id: id,
            model: body.model.clone(),
            messages: body.messages.clone().into(),
            target_compressed_through: target,
            user: ctx.user.clone(),
            status: ctx.status.clone(),
        };

        let summarizer = self.summarizer.clone();
        self.queue.submit("summarize", async move {
            let conversation_id = job.conversation_id.clone();
            let outcome = summarizer.run(job).await;
            tracing::debug!(%conversation_id, outcome = outcome.event_outcome().as_str(), "background compression finished");
        });

        body
    }
}
