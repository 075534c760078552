#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{AsnConfig, ExportConfig, LoadConfig, TagConfig};
pub use crate::config::TomlConfig;

pub use crate::core::{
    asn::AsnImporter, exporter::MappingExporter, fetch::SourceFetcher, labels::LabelResolver,
    loader::MappingLoader,
};
pub use crate::domain::model::{LabelSet, MappingKind, MappingRow, Metric};
pub use crate::utils::error::{MappingError, Result};
