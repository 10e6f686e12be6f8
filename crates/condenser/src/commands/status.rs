use condenser_compress::SummaryStore;
use condenser_core::ConversationSummary;
use condenser_telemetry::Paths;
use serde_json::json;

const RECENT_LIMIT: usize = 20;
const PREVIEW_CHARS: usize = 60;

pub async fn run(conversation_id: Option<&str>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    if !paths.database_path().exists() {
        println!("No summaries stored (run `condenser init` first)");
        return Ok(());
    }

    let store = SummaryStore::sqlite(paths.database_path());
    match conversation_id {
        Some(id) => match store.load(id).await {
            Some(record) => println!("{}", render_detail(&record)),
            None => println!("No summary for {}", id),
        },
        None => {
            let records = store.list_recent(RECENT_LIMIT).await;
            println!("{}", render_list(&records));
        }
    }
    Ok(())
}

fn render_detail(record: &ConversationSummary) -> String {
    let output = json!({
        "conversation_id": record.conversation_id,
        "compressed_through": record.compressed_through,
        "created_at": record.created_at.to_rfc3339(),
        "updated_at": record.updated_at.to_rfc3339(),
        "summary_chars": record.summary_text.chars().count(),
        "summary": record.summary_text,
    });
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| output.to_string())
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &flat[..cut]),
        None => flat,
    }
}

fn render_list(records: &[ConversationSummary]) -> String {
    if records.is_empty() {
        return "No summaries stored".to_string();
    }

    let mut lines = vec![
        format!("Recent Summaries (last {})", records.len()),
        "========================".to_string(),
    ];
    for record in records {
        lines.push(format!(
            "  {} | {} | through:{} | {}",
            record.updated_at.format("%Y-%m-%d %H:%M"),
            record.conversation_id,
            record.compressed_through,
            preview(&record.summary_text),
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("Goals:\n  ship  it"), "Goals: ship it");
        let long = "x".repeat(100);
        assert_eq!(preview(&long), format!("{}...", "x".repeat(PREVIEW_CHARS)));
    }

    #[test]
    fn test_render_list() {
        assert_eq!(render_list(&[]), "No summaries stored");

        let records = vec![
            ConversationSummary::new("chat-a", "first", 14),
            ConversationSummary::new("chat-b", "second", 8),
        ];
        let output = render_list(&records);
        assert!(output.starts_with("Recent Summaries (last 2)"));
        assert!(output.contains("chat-a | through:14 | first"));
        assert!(output.contains("chat-b | through:8 | second"));
    }

    #[test]
    fn test_render_detail_is_json() {
        let record = ConversationSummary::new("chat-a", "the summary", 14);
        let value: serde_json::Value = serde_json::from_str(&render_detail(&record)).unwrap();
        assert_eq!(value["conversation_id"], "chat-a");
        assert_eq!(value["compressed_through"], 14);
        assert_eq!(value["summary_chars"], 11);
    }

    #[tokio::test]
    async fn test_store_listing_feeds_render() {
        let temp = tempfile::TempDir::new().unwrap();
        let store = SummaryStore::sqlite(temp.path().join("summaries.db"));
        store.initialize().await.unwrap();
        store.save("chat-a", "alpha", 3).await;

        let output = render_list(&store.list_recent(RECENT_LIMIT).await);
        assert!(output.contains("chat-a | through:3 | alpha"));
    }
}
