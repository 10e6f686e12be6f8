mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries hook output, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init => commands::init::run().await,
        Commands::HookInlet => commands::hooks::hook_inlet().await,
        Commands::HookOutlet { worker: false } => commands::hooks::hook_outlet().await,
        Commands::HookOutlet { worker: true } => commands::hooks::outlet_worker().await,
        Commands::Status { conversation_id } => {
            commands::status::run(conversation_id.as_deref()).await
        }
        Commands::History {
            stats,
            conversation,
            hours,
        } => commands::history::run(stats, conversation, hours),
        Commands::Version => commands::version::run(),
    }
}
