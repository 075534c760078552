use clap::{Args, CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};

/// Logging switches shared by every binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Args)]
pub struct LogArgs {
    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON on stderr")]
    pub log_json: bool,
}

/// `generate-region-mappings` / `generate-county-mappings`
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(about = "Fetch polygon metadata and print label,code,0,0 rows")]
pub struct ExportConfig {
    /// Read from this URL or local file instead of the built-in source
    #[arg(long)]
    pub source: Option<String>,

    /// Path to a mappings TOML file
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub log: LogArgs,
}

impl ExportConfig {
    /// 兩個 exporter 共用同一組參數，只有程式名稱不同
    pub fn parse_as(name: &'static str) -> Self {
        let matches = Self::command().name(name).get_matches();
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }
}

/// `load-mappings <database_path> <source_csv_path> <table_name>`
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "load-mappings")]
#[command(about = "Insert label,code,apply_from,apply_to rows into a SQLite table")]
pub struct LoadConfig {
    /// SQLite database file, created if absent
    pub database_path: String,

    /// Interchange CSV file without a header row
    pub source_csv_path: String,

    /// Table to create (if needed) and append to
    pub table_name: String,

    #[command(flatten)]
    pub log: LogArgs,
}

/// `query-asn-names <database_path>`
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "query-asn-names")]
#[command(about = "Page through the AS-to-organisation API and store ASN labels")]
pub struct AsnConfig {
    /// SQLite database file, created if absent
    pub database_path: String,

    /// Override the API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Override the ASN table name
    #[arg(long)]
    pub table: Option<String>,

    /// Path to a mappings TOML file
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(flatten)]
    pub log: LogArgs,
}

/// `tag-labels`
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "tag-labels")]
#[command(about = "Add human-readable labels to JSON-lines metrics")]
pub struct TagConfig {
    /// Path to a mappings TOML file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the database path from the config file
    #[arg(long)]
    pub database: Option<String>,

    /// Read metrics from this file instead of stdin
    #[arg(long)]
    pub input: Option<String>,

    #[command(flatten)]
    pub log: LogArgs,
}
