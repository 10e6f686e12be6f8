//! Path resolution for condenser state files

use std::path::PathBuf;

/// Environment variable that overrides the state directory
pub const HOME_ENV: &str = "CONDENSER_HOME";

/// Resolves standard paths for config, database and event log
#[derive(Debug, Clone)]
pub struct Paths {
    pub home: PathBuf,
}

impl Paths {
    /// Resolve from `CONDENSER_HOME`, falling back to `~/.condenser`
    pub fn new() -> std::io::Result<Self> {
        if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
            return Ok(Self::with_home(dir));
        }

        let home = dirs::home_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "home directory not found")
        })?;

        Ok(Self::with_home(home.join(".condenser")))
    }

    /// Use an explicit state directory
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Get config.json path
    pub fn config_file(&self) -> PathBuf {
        self.home.join("config.json")
    }

    /// Get summaries.db path
    pub fn database_path(&self) -> PathBuf {
        self.home.join("summaries.db")
    }

    /// Get events.jsonl path
    pub fn events_file(&self) -> PathBuf {
        self.home.join("events.jsonl")
    }
}
