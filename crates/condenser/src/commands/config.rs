use anyhow::Context;
use condenser_core::CompressionConfig;
use std::path::Path;

/// Read and normalize `config.json`; a missing file yields the defaults
pub fn read_config(path: &Path) -> anyhow::Result<CompressionConfig> {
    if !path.exists() {
        return Ok(CompressionConfig::new());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let config: CompressionConfig = serde_json::from_str(&content)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config.normalized())
}

/// Like [`read_config`], but falls back to defaults on any error
pub fn load_config(path: &Path) -> CompressionConfig {
    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %format!("{:#}", e), "invalid config, using defaults");
            CompressionConfig::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = read_config(&temp.path().join("config.json")).unwrap();
        assert_eq!(config, CompressionConfig::new());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "keep_last": 4,
                "summary_model": "gemini-2.5-flash",
                "summary_temperature": 9.0,
                "model_thresholds": { "gpt-4o": { "max_context_tokens": 64000 } }
            }"#,
        )
        .unwrap();

        let config = load_config(&path);
        assert_eq!(config.keep_last, 4);
        assert_eq!(config.keep_first, 1);
        assert_eq!(config.summary_model.as_deref(), Some("gemini-2.5-flash"));
        assert_eq!(config.summary_temperature, 2.0);

        let thresholds = config.resolve_thresholds("gpt-4o");
        assert_eq!(thresholds.max_context_tokens, 64_000);
        assert_eq!(thresholds.compression_threshold_tokens, 64_000);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(read_config(&path).is_err());
        assert_eq!(load_config(&path), CompressionConfig::new());
    }
}
