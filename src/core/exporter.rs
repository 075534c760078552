use crate::core::fetch::decompressed_reader;
use crate::domain::model::MappingRow;
use crate::domain::ports::Fetcher;
use crate::utils::error::{MappingError, Result};
use std::io::{BufRead, Write};

pub const REGION_SOURCE: &str =
    "http://loki.caida.org:3282/natural-earth/polygons/ne_10m_admin_1.regions.v3.0.0.processed.polygons.csv.gz";
pub const COUNTY_SOURCE: &str =
    "http://loki.caida.org:3282/gadm/polygons/gadm.counties.v2.0.processed.polygons.csv.gz";

const CODE_FIELD: usize = 0;
const LABEL_FIELD: usize = 2;
const HEADER_LABEL: &str = "name";
const UNKNOWN_LABEL: &str = "\"Unknown\"";
const PLACEHOLDER_LABELS: [&str; 2] = ["\"\"", "\"?\""];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub lines_read: u64,
    pub rows_written: u64,
    pub lines_skipped: u64,
}

/// Turns one polygon-metadata line into a mapping row.
///
/// Returns `None` for lines without a comma and for the header. The label
/// keeps its source quoting so the output stays valid CSV.
pub fn transform_line(line: &str, line_no: u64) -> Result<Option<MappingRow>> {
    if !line.contains(',') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() <= LABEL_FIELD {
        return Err(MappingError::MalformedRowError {
            line: line_no,
            message: format!(
                "expected at least {} fields, found {}",
                LABEL_FIELD + 1,
                fields.len()
            ),
        });
    }

    let label = fields[LABEL_FIELD];
    if label == HEADER_LABEL {
        return Ok(None);
    }

    let label = if PLACEHOLDER_LABELS.contains(&label) {
        UNKNOWN_LABEL
    } else {
        label
    };

    Ok(Some(MappingRow::unbounded(fields[CODE_FIELD], label)))
}

/// Reformats every line of `reader` into `writer` as `label,code,0,0`.
pub fn export<R: BufRead, W: Write>(reader: R, writer: &mut W) -> Result<ExportSummary> {
    let mut summary = ExportSummary::default();

    for line in reader.lines() {
        let line = line?;
        summary.lines_read += 1;

        match transform_line(&line, summary.lines_read)? {
            Some(row) => {
                writeln!(writer, "{}", row.to_interchange_line())?;
                summary.rows_written += 1;
            }
            None => summary.lines_skipped += 1,
        }
    }

    writer.flush()?;
    Ok(summary)
}

/// Fetches one source and streams its reformatted rows to a writer.
pub struct MappingExporter<F: Fetcher> {
    fetcher: F,
    source: String,
}

impl<F: Fetcher> MappingExporter<F> {
    pub fn new(fetcher: F, source: impl Into<String>) -> Self {
        Self {
            fetcher,
            source: source.into(),
        }
    }

    pub async fn run<W: Write>(&self, writer: &mut W) -> Result<ExportSummary> {
        tracing::info!("📡 Fetching {}", self.source);
        let data = self.fetcher.fetch(&self.source).await?;

        let summary = export(decompressed_reader(data), writer)?;
        tracing::info!(
            "✅ Exported {} rows ({} lines read, {} skipped)",
            summary.rows_written,
            summary.lines_read,
            summary.lines_skipped
        );
        Ok(summary)
    }
}
