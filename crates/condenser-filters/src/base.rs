//! Host hook contract shared by all filters

use async_trait::async_trait;
use condenser_compress::{StatusSender, UserInfo};
use condenser_core::Message;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Host-supplied metadata attached to a request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Chat request body as seen by the hooks
///
/// Unknown top-level fields are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HookMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Everything the host passes alongside the body
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user: Option<UserInfo>,
    pub metadata: Option<HookMetadata>,
    pub status: Option<StatusSender>,
}

fn clean_id(raw: Option<&String>) -> Option<String> {
    let trimmed = raw?.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Conversation id from `body.chat_id`, then `body.metadata.chat_id`, then
/// the hook metadata
pub fn conversation_id(body: &RequestBody, ctx: &RequestContext) -> Option<String> {
    clean_id(body.chat_id.as_ref())
        .or_else(|| clean_id(body.metadata.as_ref().and_then(|m| m.chat_id.as_ref())))
        .or_else(|| clean_id(ctx.metadata.as_ref().and_then(|m| m.chat_id.as_ref())))
}

/// A request/response filter installed in the chat host
#[async_trait]
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn is_enabled(&self) -> bool {
        true
    }

    /// Runs before the request is sent to the model
    async fn inlet(&self, body: RequestBody, _ctx: &RequestContext) -> RequestBody {
        body
    }

    /// Runs after the response is complete
    async fn outlet(&self, body: RequestBody, _ctx: &RequestContext) -> RequestBody {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn metadata(chat_id: &str) -> HookMetadata {
        HookMetadata {
            chat_id: Some(chat_id.to_string()),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_conversation_id_precedence() {
        let mut body = RequestBody {
            chat_id: Some("  from-body ".into()),
            metadata: Some(metadata("from-body-metadata")),
            ..Default::default()
        };
        let ctx = RequestContext {
            metadata: Some(metadata("from-hook")),
            ..Default::default()
        };
        assert_eq!(conversation_id(&body, &ctx).as_deref(), Some("from-body"));

        body.chat_id = Some("   ".into());
        assert_eq!(conversation_id(&body, &ctx).as_deref(), Some("from-body-metadata"));

        body.metadata = None;
        assert_eq!(conversation_id(&body, &ctx).as_deref(), Some("from-hook"));

        assert_eq!(conversation_id(&body, &RequestContext::default()), None);
    }

    #[test]
    fn test_body_preserves_unknown_fields() {
        let raw = json!({
            "model": "gpt-4o",
            "stream": true,
            "messages": [{"role": "user", "content": "hi", "name": "ana"}],
            "metadata": {"chat_id": "c1", "message_id": "m9"}
        });
        let body: RequestBody = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(body.metadata.as_ref().unwrap().chat_id.as_deref(), Some("c1"));
        assert_eq!(serde_json::to_value(&body).unwrap(), raw);
    }

    struct Passthrough;

    #[async_trait]
    impl Filter for Passthrough {
        fn name(&self) -> &str {
            "passthrough"
        }
    }

    #[tokio::test]
    async fn test_filter_defaults_pass_through() {
        let body = RequestBody {
            messages: vec![Message::user("hello")],
            ..Default::default()
        };
        let ctx = RequestContext::default();
        let filter = Passthrough;
        assert!(filter.is_enabled());
        assert_eq!(filter.inlet(body.clone(), &ctx).await, body);
        assert_eq!(filter.outlet(body.clone(), &ctx).await, body);
    }
}
