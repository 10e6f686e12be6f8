use condenser_compress::SummaryStore;
use condenser_core::Message;
use serde_json::{json, Value};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

fn run_hook(home: &std::path::Path, hook: &str, input: &str) -> (String, String) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_condenser"))
        .arg(hook)
        .env("CONDENSER_HOME", home)
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{} failed", hook);

    (
        String::from_utf8(output.stdout).unwrap(),
        String::from_utf8(output.stderr).unwrap(),
    )
}

fn payload(n: usize) -> String {
    let messages: Vec<Message> = (0..n)
        .map(|i| Message::user(format!("message {}", i)))
        .collect();
    json!({
        "body": { "model": "gpt-4o", "chat_id": "chat-bin", "messages": messages }
    })
    .to_string()
}

#[tokio::test]
async fn test_inlet_binary_rewrites_with_summary() {
    let temp = tempfile::TempDir::new().unwrap();
    let store = SummaryStore::sqlite(temp.path().join("summaries.db"));
    store.initialize().await.unwrap();
    store.save("chat-bin", "binary summary", 14).await;

    let (stdout, stderr) = run_hook(temp.path(), "hook:inlet", &payload(20));

    let body: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(body["messages"].as_array().unwrap().len(), 8);
    assert_eq!(body["chat_id"], "chat-bin");

    let status: Value = stderr
        .lines()
        .find_map(|line| serde_json::from_str::<Value>(line).ok())
        .unwrap();
    assert_eq!(status["type"], "status");
    assert_eq!(status["data"]["done"], true);
}

fn wait_for(path: &Path, limit: Duration) -> bool {
    let started = Instant::now();
    while started.elapsed() < limit {
        if path.exists() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    path.exists()
}

#[test]
fn test_outlet_binary_echoes_body() {
    let temp = tempfile::TempDir::new().unwrap();
    let input = payload(20);

    let (stdout, _stderr) = run_hook(temp.path(), "hook:outlet", &input);

    let expected = serde_json::from_str::<Value>(&input).unwrap()["body"].clone();
    assert_eq!(serde_json::from_str::<Value>(&stdout).unwrap(), expected);

    // The below-threshold skip is recorded by the detached worker
    assert!(wait_for(
        &temp.path().join("events.jsonl"),
        Duration::from_secs(20)
    ));
}

#[test]
fn test_outlet_returns_while_summary_endpoint_stalls() {
    // Accepts connections and never answers
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });

    let temp = tempfile::TempDir::new().unwrap();
    let config = json!({
        "compression_threshold_tokens": 1,
        "completion": {
            "base_url": format!("http://{}/v1", addr),
            "api_key_env": null,
            "timeout_secs": 30
        }
    });
    std::fs::write(temp.path().join("config.json"), config.to_string()).unwrap();

    let input = payload(20);
    let started = Instant::now();
    let mut child = Command::new(env!("CARGO_BIN_EXE_condenser"))
        .arg("hook:outlet")
        .env("CONDENSER_HOME", temp.path())
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();

    let mut stdout = String::new();
    child
        .stdout
        .take()
        .unwrap()
        .read_to_string(&mut stdout)
        .unwrap();
    let eof_after = started.elapsed();
    assert!(child.wait().unwrap().success());
    let exit_after = started.elapsed();

    assert!(eof_after < Duration::from_secs(10), "stdout open for {:?}", eof_after);
    assert!(exit_after < Duration::from_secs(10), "exited after {:?}", exit_after);

    let expected = serde_json::from_str::<Value>(&input).unwrap()["body"].clone();
    assert_eq!(serde_json::from_str::<Value>(&stdout).unwrap(), expected);
}

#[test]
fn test_hook_passes_garbage_through() {
    let temp = tempfile::TempDir::new().unwrap();
    let (stdout, _stderr) = run_hook(temp.path(), "hook:inlet", "plain text");
    assert_eq!(stdout, "plain text");
}
