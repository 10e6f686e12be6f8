use condenser_compress::SummaryStore;
use condenser_core::CompressionConfig;
use condenser_telemetry::Paths;

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new()?;
    let report = init_home(&paths).await?;

    println!("✓ condenser home: {}", paths.home.display());
    if report.wrote_config {
        println!("  - wrote default config.json");
    } else {
        println!("  - kept existing config.json");
    }
    println!("  - summary database: {}", paths.database_path().display());
    Ok(())
}

pub struct InitReport {
    pub wrote_config: bool,
}

/// Create the home directory, a default config if none exists, and the schema
pub async fn init_home(paths: &Paths) -> anyhow::Result<InitReport> {
    std::fs::create_dir_all(&paths.home)?;

    let config_path = paths.config_file();
    let wrote_config = if config_path.exists() {
        false
    } else {
        let json = serde_json::to_string_pretty(&CompressionConfig::new())?;
        condenser_telemetry::atomic_write(&config_path, json.as_bytes())?;
        true
    };

    SummaryStore::sqlite(paths.database_path())
        .initialize()
        .await?;

    Ok(InitReport { wrote_config })
}
