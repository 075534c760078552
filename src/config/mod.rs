#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{AsnConfig, ExportConfig, LoadConfig, LogArgs, TagConfig};
pub use toml_config::TomlConfig;
