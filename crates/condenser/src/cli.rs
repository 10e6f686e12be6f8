use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "condenser")]
#[command(version)]
#[command(about = "Asynchronous context compression for chat hosts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the home directory, default config and summary database
    Init,

    /// Hook: rewrite the outgoing request with the stored summary (stdin/stdout JSON)
    #[command(name = "hook:inlet")]
    HookInlet,

    /// Hook: schedule background summarization after a response (stdin/stdout JSON)
    #[command(name = "hook:outlet")]
    HookOutlet {
        /// Run the summarization half (started by the hook itself)
        #[arg(long, hide = true)]
        worker: bool,
    },

    /// Show stored summaries
    Status {
        /// Show a single conversation
        conversation_id: Option<String>,
    },

    /// View compression history
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,

        /// Only events for this conversation
        #[arg(long)]
        conversation: Option<String>,

        /// Only events from the last N hours
        #[arg(long)]
        hours: Option<u64>,
    },

    /// Print version information
    Version,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_version() {
        let cli = Cli::try_parse_from(["condenser", "version"]);
        assert!(cli.is_ok());
        assert!(matches!(cli.unwrap().command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_hook_commands() {
        for hook in ["hook:inlet", "hook:outlet"] {
            let cli = Cli::try_parse_from(["condenser", hook]);
            assert!(cli.is_ok(), "Failed to parse {}", hook);
        }
    }

    #[test]
    fn test_cli_parse_outlet_worker_flag() {
        let cli = Cli::try_parse_from(["condenser", "hook:outlet", "--worker"]).unwrap();
        assert!(matches!(cli.command, Commands::HookOutlet { worker: true }));

        let cli = Cli::try_parse_from(["condenser", "hook:outlet"]).unwrap();
        assert!(matches!(cli.command, Commands::HookOutlet { worker: false }));
    }

    #[test]
    fn test_cli_parse_status_with_id() {
        let cli = Cli::try_parse_from(["condenser", "status", "chat-1"]).unwrap();
        if let Commands::Status { conversation_id } = cli.command {
            assert_eq!(conversation_id.as_deref(), Some("chat-1"));
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_parse_history_filters() {
        let cli = Cli::try_parse_from([
            "condenser",
            "history",
            "--stats",
            "--conversation",
            "chat-1",
            "--hours",
            "24",
        ])
        .unwrap();
        if let Commands::History {
            stats,
            conversation,
            hours,
        } = cli.command
        {
            assert!(stats);
            assert_eq!(conversation.as_deref(), Some("chat-1"));
            assert_eq!(hours, Some(24));
        } else {
            panic!("Expected History command");
        }
    }
}
