use clap::Parser;
use mapping_tools::app::report_failure;
use mapping_tools::utils::{logger, validation};
use mapping_tools::{LoadConfig, MappingLoader, Result};

fn run(config: &LoadConfig) -> Result<u64> {
    validation::validate_path("database_path", &config.database_path)?;
    validation::validate_path("source_csv_path", &config.source_csv_path)?;
    validation::validate_non_empty_string("table_name", &config.table_name)?;

    let mut loader = MappingLoader::open(&config.database_path, &config.table_name)?;

    let stdout = std::io::stdout();
    let mut progress = stdout.lock();
    let summary = loader.load_file(&config.source_csv_path, &mut progress)?;

    loader.close()?;
    Ok(summary.rows_inserted)
}

fn main() {
    // 參數不足時 clap 會印出用法並以非零碼結束，不會碰到資料庫
    let config = LoadConfig::parse();
    logger::init(config.log.verbose, config.log.log_json);

    tracing::info!(
        "🚀 Loading {} into {}:{}",
        config.source_csv_path,
        config.database_path,
        config.table_name
    );

    match run(&config) {
        Ok(rows) => tracing::info!("✅ Loaded {} rows", rows),
        Err(e) => std::process::exit(report_failure("load-mappings", &e)),
    }
}
