use crate::core::asn::DEFAULT_ASN_ENDPOINT;
use crate::core::exporter::{COUNTY_SOURCE, REGION_SOURCE};
use crate::domain::model::MappingKind;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{MappingError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_DATABASE: &str = "mappings.db";
pub const DEFAULT_RELOAD_FREQUENCY: i64 = 120;

/// Shared settings for all tools, usually read from `mappings.toml`.
///
/// Every section is optional; missing values fall back to the built-in
/// defaults so an empty file is a valid configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub database: DatabaseConfig,
    pub tables: TablesConfig,
    pub sources: SourcesConfig,
    pub labels: LabelsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub name: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_DATABASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub country: String,
    pub region: String,
    pub county: String,
    pub asn: String,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            country: MappingKind::Country.default_table().to_string(),
            region: MappingKind::Region.default_table().to_string(),
            county: MappingKind::County.default_table().to_string(),
            asn: MappingKind::Asn.default_table().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub region: String,
    pub county: String,
    pub asn_api: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            region: REGION_SOURCE.to_string(),
            county: COUNTY_SOURCE.to_string(),
            asn_api: DEFAULT_ASN_ENDPOINT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelsConfig {
    pub reload_frequency: i64,
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            reload_frequency: DEFAULT_RELOAD_FREQUENCY,
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MappingError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MappingError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads `path` when given, otherwise the defaults.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path);
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }

    /// 替換環境變數 (例如 ${MAPPINGS_DB})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MappingError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn source_for(&self, kind: MappingKind) -> Option<&str> {
        match kind {
            MappingKind::Region => Some(&self.sources.region),
            MappingKind::County => Some(&self.sources.county),
            MappingKind::Country | MappingKind::Asn => None,
        }
    }
}

impl ConfigProvider for TomlConfig {
    fn database_path(&self) -> &str {
        &self.database.name
    }

    fn table_name(&self, kind: MappingKind) -> &str {
        match kind {
            MappingKind::Country => &self.tables.country,
            MappingKind::Region => &self.tables.region,
            MappingKind::County => &self.tables.county,
            MappingKind::Asn => &self.tables.asn,
        }
    }

    fn reload_frequency(&self) -> i64 {
        self.labels.reload_frequency
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("database.name", &self.database.name)?;

        for kind in MappingKind::ALL {
            validation::validate_non_empty_string(kind.default_table(), self.table_name(kind))?;
        }

        validation::validate_source("sources.region", &self.sources.region)?;
        validation::validate_source("sources.county", &self.sources.county)?;
        validation::validate_url("sources.asn_api", &self.sources.asn_api)?;
        validation::validate_positive_number(
            "labels.reload_frequency",
            self.labels.reload_frequency,
            0,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TomlConfig::from_toml_str("").unwrap();

        assert_eq!(config.database_path(), DEFAULT_DATABASE);
        assert_eq!(config.table_name(MappingKind::Asn), "asn_mappings");
        assert_eq!(config.sources.region, REGION_SOURCE);
        assert_eq!(config.reload_frequency(), DEFAULT_RELOAD_FREQUENCY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[database]
name = "mysqlite.db"

[tables]
country = "countries"

[labels]
reload_frequency = 3600
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.database_path(), "mysqlite.db");
        assert_eq!(config.table_name(MappingKind::Country), "countries");
        assert_eq!(config.table_name(MappingKind::Region), "region_mappings");
        assert_eq!(config.reload_frequency(), 3600);
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MAPPING_TOOLS_TEST_DB", "/tmp/labels.db");

        let toml_content = r#"
[database]
name = "${MAPPING_TOOLS_TEST_DB}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.database.name, "/tmp/labels.db");

        std::env::remove_var("MAPPING_TOOLS_TEST_DB");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[sources]
asn_api = "not-a-url"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[sources]\nregion = \"./regions.csv.gz\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.source_for(MappingKind::Region), Some("./regions.csv.gz"));
        assert_eq!(config.source_for(MappingKind::Asn), None);
    }
}
