use crate::config::{ExportConfig, TomlConfig};
use crate::core::exporter::MappingExporter;
use crate::core::fetch::SourceFetcher;
use crate::domain::model::MappingKind;
use crate::utils::error::{MappingError, Result};
use crate::utils::logger;
use crate::utils::validation::{self, Validate};

/// Resolves the source address: `--source`, then the config file, then the built-in default.
pub fn resolve_source(kind: MappingKind, config: &ExportConfig) -> Result<String> {
    let file_config = TomlConfig::load_or_default(config.config.as_deref())?;
    file_config.validate()?;

    let source = match &config.source {
        Some(source) => source.clone(),
        None => file_config
            .source_for(kind)
            .map(str::to_string)
            .ok_or_else(|| MappingError::MissingConfigError {
                field: format!("sources.{:?}", kind).to_lowercase(),
            })?,
    };

    validation::validate_source("source", &source)?;
    Ok(source)
}

/// Shared `main` of the region and county exporters.
pub async fn main(kind: MappingKind, name: &'static str) {
    let config = ExportConfig::parse_as(name);
    logger::init(config.log.verbose, config.log.log_json);

    let source = match resolve_source(kind, &config) {
        Ok(source) => source,
        Err(e) => std::process::exit(super::report_failure(name, &e)),
    };

    let exporter = MappingExporter::new(SourceFetcher::new(), source);
    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());

    if let Err(e) = exporter.run(&mut out).await {
        std::process::exit(super::report_failure(name, &e));
    }
}
