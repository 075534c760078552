use clap::Parser;
use mapping_tools::app::report_failure;
use mapping_tools::domain::ports::ConfigProvider;
use mapping_tools::utils::{logger, validation};
use mapping_tools::utils::validation::Validate;
use mapping_tools::{AsnConfig, AsnImporter, MappingKind, Result, TomlConfig};

async fn run(config: &AsnConfig) -> Result<()> {
    let file_config = TomlConfig::load_or_default(config.config.as_deref())?;
    file_config.validate()?;

    let endpoint = config
        .endpoint
        .clone()
        .unwrap_or_else(|| file_config.sources.asn_api.clone());
    let table = config
        .table
        .clone()
        .unwrap_or_else(|| file_config.table_name(MappingKind::Asn).to_string());

    validation::validate_url("endpoint", &endpoint)?;
    validation::validate_path("database_path", &config.database_path)?;

    let conn = rusqlite::Connection::open(&config.database_path)?;
    let mut importer = AsnImporter::new(conn, &endpoint, &table)?;

    let stdout = std::io::stdout();
    let mut progress = stdout.lock();
    let summary = importer.run(&mut progress).await?;

    tracing::info!(
        "✅ Imported {} pages, {} records, {} new rows",
        summary.pages,
        summary.records_seen,
        summary.rows_inserted
    );
    importer.close()
}

#[tokio::main]
async fn main() {
    let config = AsnConfig::parse();
    logger::init(config.log.verbose, config.log.log_json);

    if let Err(e) = run(&config).await {
        std::process::exit(report_failure("query-asn-names", &e));
    }
}
