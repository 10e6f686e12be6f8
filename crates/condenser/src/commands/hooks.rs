use super::config::load_config;
use anyhow::Context;
use condenser_compress::{
    BackgroundQueue, OpenAiCompatClient, StatusSender, Summarizer, SummaryStore, UserInfo,
};
use condenser_filters::{
    ContextCompressionFilter, FilterRegistry, HookMetadata, RequestBody, RequestContext,
};
use condenser_telemetry::Paths;
use serde::Deserialize;
use serde_json::Value;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Inlet,
    Outlet,
}

/// Hook payload read from stdin
#[derive(Debug, Deserialize)]
struct HookInput {
    body: Value,
    #[serde(default)]
    user: Option<UserInfo>,
    #[serde(default)]
    metadata: Option<HookMetadata>,
}

/// Filter chain plus the queue its background work lands on
pub struct HookRuntime {
    registry: FilterRegistry,
    queue: BackgroundQueue,
}

impl HookRuntime {
    pub async fn build(paths: &Paths) -> anyhow::Result<Self> {
        let config = Arc::new(load_config(&paths.config_file()));

        let store = SummaryStore::sqlite(paths.database_path());
        if let Err(e) = store.initialize().await {
            tracing::warn!(error = %e, "summary store unavailable, continuing without summaries");
        }

        let client = OpenAiCompatClient::from_config(&config.completion)?;
        let summarizer = Arc::new(
            Summarizer::new(config.clone(), store, Arc::new(client))
                .with_event_log(paths.events_file()),
        );

        let queue = BackgroundQueue::new();
        let mut registry = FilterRegistry::new();
        registry.register(Box::new(ContextCompressionFilter::new(
            config,
            summarizer,
            queue.clone(),
        )));

        Ok(Self { registry, queue })
    }

    /// Run one hook stage over raw stdin text and return the stdout text
    ///
    /// Input that cannot be parsed is returned unchanged.
    pub async fn process(
        &self,
        stage: Stage,
        input: &str,
        status: Option<StatusSender>,
    ) -> anyhow::Result<String> {
        let request = match decode(input)? {
            Decoded::Echo(text) => return Ok(text),
            Decoded::Request(request) => *request,
        };

        let ctx = RequestContext {
            user: request.user,
            metadata: request.metadata,
            status,
        };

        let body = match stage {
            Stage::Inlet => self.registry.inlet(request.body, &ctx).await,
            Stage::Outlet => self.registry.outlet(request.body, &ctx).await,
        };

        Ok(serde_json::to_string(&body)?)
    }

    pub async fn drain(&self) {
        self.queue.drain().await;
    }
}

struct DecodedRequest {
    body: RequestBody,
    user: Option<UserInfo>,
    metadata: Option<HookMetadata>,
}

enum Decoded {
    /// Written back as-is
    Echo(String),
    Request(Box<DecodedRequest>),
}

fn decode(input: &str) -> anyhow::Result<Decoded> {
    if input.trim().is_empty() {
        return Ok(Decoded::Echo(String::new()));
    }

    let hook_input: HookInput = match serde_json::from_str(input) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "unreadable hook input, passing through");
            return Ok(Decoded::Echo(input.to_string()));
        }
    };

    match serde_json::from_value::<RequestBody>(hook_input.body.clone()) {
        Ok(body) => Ok(Decoded::Request(Box::new(DecodedRequest {
            body,
            user: hook_input.user,
            metadata: hook_input.metadata,
        }))),
        Err(e) => {
            tracing::warn!(error = %e, "unexpected request body shape, passing through");
            Ok(Decoded::Echo(serde_json::to_string(&hook_input.body)?))
        }
    }
}

fn write_stdout(output: &str) -> io::Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()
}

fn read_stdin() -> io::Result<String> {
    let mut input = String::new();
    io::stdin().read_to_string(&mut input)?;
    Ok(input)
}

pub async fn hook_inlet() -> anyhow::Result<()> {
    let input = read_stdin()?;

    let paths = Paths::new()?;
    let runtime = HookRuntime::build(&paths).await?;

    // Status events go to stderr as JSON lines
    let (status, mut events) = StatusSender::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                eprintln!("{}", line);
            }
        }
    });

    let output = runtime.process(Stage::Inlet, &input, Some(status)).await?;
    write_stdout(&output)?;

    runtime.drain().await;
    drop(runtime);
    if let Err(e) = printer.await {
        tracing::debug!(error = %e, "status printer ended abnormally");
    }

    Ok(())
}

/// Answer the host right away and hand summarization to a detached worker
///
/// The outlet never changes the body, so the response is the decoded body.
/// The worker re-reads the same hook input on its stdin.
pub async fn hook_outlet() -> anyhow::Result<()> {
    let input = read_stdin()?;

    match decode(&input)? {
        Decoded::Echo(text) => write_stdout(&text)?,
        Decoded::Request(request) => {
            write_stdout(&serde_json::to_string(&request.body)?)?;
            if let Err(e) = spawn_outlet_worker(&input) {
                tracing::warn!(error = %e, "could not start summary worker");
            }
        }
    }

    Ok(())
}

fn spawn_outlet_worker(input: &str) -> anyhow::Result<()> {
    let exe = std::env::current_exe().context("locating condenser executable")?;
    let mut child = Command::new(&exe)
        .args(["hook:outlet", "--worker"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("spawning {}", exe.display()))?;

    let mut stdin = child.stdin.take().context("worker stdin unavailable")?;
    stdin.write_all(input.as_bytes())?;
    drop(stdin);

    tracing::debug!(pid = child.id(), "summary worker started");
    Ok(())
}

/// Worker side of `hook:outlet`: run the filter chain and wait for the
/// background summaries it schedules
pub async fn outlet_worker() -> anyhow::Result<()> {
    let input = read_stdin()?;

    let paths = Paths::new()?;
    let runtime = HookRuntime::build(&paths).await?;

    // Nobody reads the worker's output; the host already has its response
    runtime.process(Stage::Outlet, &input, None).await?;
    runtime.drain().await;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use condenser_compress::HostEvent;
    use condenser_core::Message;
    use serde_json::json;
    use tempfile::TempDir;

    async fn runtime_in(temp: &TempDir) -> (Paths, HookRuntime) {
        let paths = Paths::with_home(temp.path());
        let runtime = HookRuntime::build(&paths).await.unwrap();
        (paths, runtime)
    }

    fn payload(chat_id: &str, n: usize) -> String {
        let messages: Vec<Message> = (0..n)
            .map(|i| Message::user(format!("message {}", i)))
            .collect();
        json!({
            "body": {
                "model": "gpt-4o",
                "stream": true,
                "messages": messages,
                "metadata": { "chat_id": chat_id }
            },
            "user": { "id": "u-1", "name": "Sam" }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_inlet_without_summary_echoes_body() {
        let temp = TempDir::new().unwrap();
        let (_paths, runtime) = runtime_in(&temp).await;

        let input = payload("chat-1", 20);
        let output = runtime.process(Stage::Inlet, &input, None).await.unwrap();

        let expected: Value = serde_json::from_str::<Value>(&input).unwrap()["body"].clone();
        let actual: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(actual, expected);
    }

    #[tokio::test]
    async fn test_inlet_applies_stored_summary() {
        let temp = TempDir::new().unwrap();
        let (paths, runtime) = runtime_in(&temp).await;
        SummaryStore::sqlite(paths.database_path())
            .save("chat-1", "earlier context", 14)
            .await;

        let (status, mut events) = StatusSender::channel();
        let output = runtime
            .process(Stage::Inlet, &payload("chat-1", 20), Some(status))
            .await
            .unwrap();

        let body: Value = serde_json::from_str(&output).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 8);
        assert_eq!(messages[1]["role"], "assistant");
        assert!(messages[1]["content"]
            .as_str()
            .unwrap()
            .contains("earlier context"));
        assert_eq!(body["stream"], true);

        let HostEvent::Status(update) = events.try_recv().unwrap();
        assert!(update.description.contains("hidden 14"));
    }

    #[tokio::test]
    async fn test_inlet_keeps_unknown_roles_in_window() {
        let temp = TempDir::new().unwrap();
        let (paths, runtime) = runtime_in(&temp).await;
        SummaryStore::sqlite(paths.database_path())
            .save("chat-3", "earlier context", 14)
            .await;

        let mut input: Value = serde_json::from_str(&payload("chat-3", 20)).unwrap();
        input["body"]["messages"][19] = json!({"role": "developer", "content": "use tabs"});

        let output = runtime
            .process(Stage::Inlet, &input.to_string(), None)
            .await
            .unwrap();

        let body: Value = serde_json::from_str(&output).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 8);
        assert_eq!(
            messages[7],
            json!({"role": "developer", "content": "use tabs"})
        );
    }

    #[tokio::test]
    async fn test_outlet_echoes_body_below_threshold() {
        let temp = TempDir::new().unwrap();
        let (paths, runtime) = runtime_in(&temp).await;

        let input = payload("chat-2", 20);
        let output = runtime.process(Stage::Outlet, &input, None).await.unwrap();
        runtime.drain().await;

        let expected: Value = serde_json::from_str::<Value>(&input).unwrap()["body"].clone();
        assert_eq!(serde_json::from_str::<Value>(&output).unwrap(), expected);

        let store = SummaryStore::sqlite(paths.database_path());
        assert!(store.load("chat-2").await.is_none());
        assert!(paths.events_file().exists());
    }

    #[tokio::test]
    async fn test_malformed_input_passes_through() {
        let temp = TempDir::new().unwrap();
        let (_paths, runtime) = runtime_in(&temp).await;

        let output = runtime.process(Stage::Inlet, "not json", None).await.unwrap();
        assert_eq!(output, "not json");

        let odd_body = json!({ "body": { "messages": "oops" } }).to_string();
        let output = runtime.process(Stage::Inlet, &odd_body, None).await.unwrap();
        assert_eq!(output, r#"{"messages":"oops"}"#);

        assert_eq!(runtime.process(Stage::Outlet, "  ", None).await.unwrap(), "");
    }
}
