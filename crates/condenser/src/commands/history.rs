use condenser_telemetry::{read_jsonl, CompressionEvent, EventOutcome, Paths};
use std::collections::BTreeMap;

#[derive(Default)]
struct HistoryFilter {
    conversation: Option<String>,
    hours: Option<u64>,
    limit: Option<usize>,
}

fn filter_events<'a>(
    events: &'a [CompressionEvent],
    filter: &HistoryFilter,
) -> Vec<&'a CompressionEvent> {
    let cutoff = filter
        .hours
        .map(|h| chrono::Utc::now() - chrono::Duration::hours(h as i64));

    events
        .iter()
        .filter(|e| {
            if let Some(ref cutoff) = cutoff {
                if e.timestamp < *cutoff {
                    return false;
                }
            }
            if let Some(ref conversation) = filter.conversation {
                if &e.conversation_id != conversation {
                    return false;
                }
            }
            true
        })
        .collect()
}

fn compute_stats(events: &[&CompressionEvent]) -> String {
    if events.is_empty() {
        return "No runs to analyze.".to_string();
    }
    let total = events.len();

    let mut by_outcome: BTreeMap<&'static str, usize> = BTreeMap::new();
    for event in events {
        *by_outcome.entry(event.outcome.as_str()).or_default() += 1;
    }

    let saved: Vec<_> = events
        .iter()
        .filter(|e| e.outcome == EventOutcome::Saved)
        .collect();
    let summarized: usize = saved.iter().map(|e| e.messages_summarized).sum();
    let avg_tokens = events.iter().map(|e| e.total_tokens).sum::<usize>() / total;

    let mut lines = vec![
        format!("Total runs: {}", total),
        format!("Summaries saved: {}", saved.len()),
        format!("Messages summarized: {}", summarized),
        format!("Avg conversation size: {} tokens", avg_tokens),
        "Outcomes:".to_string(),
    ];
    for (outcome, count) in by_outcome {
        lines.push(format!("  {}: {}", outcome, count));
    }
    lines.join("\n")
}

fn format_event(event: &CompressionEvent) -> String {
    let mut line = format!(
        "  {} | {} | {} | tokens:{}",
        event.timestamp.format("%Y-%m-%d %H:%M"),
        event.conversation_id,
        event.outcome.as_str(),
        event.total_tokens,
    );
    if let Some(through) = event.compressed_through {
        line.push_str(&format!(
            " summarized:{} through:{}",
            event.messages_summarized, through
        ));
    }
    if let Some(error) = &event.error {
        line.push_str(&format!(" error:{}", error));
    }
    line
}

pub fn run(stats: bool, conversation: Option<String>, hours: Option<u64>) -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let events: Vec<CompressionEvent> = read_jsonl(&paths.events_file())?;

    if events.is_empty() {
        println!("No compression history");
        return Ok(());
    }

    let filter = HistoryFilter {
        conversation,
        hours,
        limit: Some(20),
    };
    let filtered = filter_events(&events, &filter);

    if stats {
        println!("{}", compute_stats(&filtered));
        return Ok(());
    }

    let display: Vec<_> = filtered
        .into_iter()
        .rev()
        .take(filter.limit.unwrap_or(20))
        .collect();

    println!("Recent Runs (last {})", display.len());
    println!("====================");
    for event in &display {
        println!("{}", format_event(event));
    }
    Ok(())
}
