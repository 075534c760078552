pub mod asn;
pub mod exporter;
pub mod fetch;
pub mod labels;
pub mod loader;

pub use crate::domain::model::{LabelSet, MappingKind, MappingRow, Metric};
pub use crate::domain::ports::{ConfigProvider, Fetcher};
pub use crate::utils::error::Result;
