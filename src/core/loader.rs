use crate::domain::model::UNBOUNDED;
use crate::utils::error::{MappingError, Result};
use rusqlite::types::Value;
use rusqlite::{params, Connection};
use std::io::{Read, Write};
use std::path::Path;

const FIELD_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_inserted: u64,
}

/// One interchange row, ready to insert.
///
/// Validity columns are `Null` for unbounded, `Integer` for timestamps and
/// `Text` for anything else, which SQLite keeps as given.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRow {
    pub code: String,
    pub label: String,
    pub apply_from: Value,
    pub apply_to: Value,
}

/// Appends interchange CSV rows to one table of a SQLite database.
///
/// The table name is interpolated into the SQL as given; callers are trusted.
pub struct MappingLoader {
    conn: Connection,
    table: String,
}

impl MappingLoader {
    /// Opens (or creates) the database and makes sure the table exists.
    pub fn open<P: AsRef<Path>>(database_path: P, table: &str) -> Result<Self> {
        tracing::debug!("Opening database {}", database_path.as_ref().display());
        let conn = Connection::open(database_path)?;
        Self::with_connection(conn, table)
    }

    pub fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        let loader = Self {
            conn,
            table: table.to_string(),
        };
        loader.ensure_table()?;
        Ok(loader)
    }

    /// 建表在自動提交模式下執行，即使之後載入失敗表也會存在
    pub fn ensure_table(&self) -> Result<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (code text not null, label text not null, apply_from integer, apply_to integer)",
                self.table
            ),
            [],
        )?;
        Ok(())
    }

    pub fn load_file<P: AsRef<Path>, W: Write>(
        &mut self,
        path: P,
        progress: &mut W,
    ) -> Result<LoadSummary> {
        let file = std::fs::File::open(path)?;
        self.load_reader(file, progress)
    }

    /// Inserts every row of `reader` in a single transaction.
    ///
    /// Each inserted label is echoed to `progress`. Any malformed row aborts
    /// the load and nothing from this call is committed.
    pub fn load_reader<R: Read, W: Write>(
        &mut self,
        reader: R,
        progress: &mut W,
    ) -> Result<LoadSummary> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let insert = format!("INSERT into {} values (?1, ?2, ?3, ?4)", self.table);
        let tx = self.conn.transaction()?;
        let mut summary = LoadSummary::default();

        {
            let mut stmt = tx.prepare(&insert)?;
            for record in rdr.records() {
                let record = record?;
                let line = record
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(summary.rows_inserted + 1);
                let row = parse_row(&record, line)?;

                stmt.execute(params![row.code, row.label, row.apply_from, row.apply_to])?;
                writeln!(progress, "{}", row.label)?;
                summary.rows_inserted += 1;
            }
        }

        tx.commit()?;
        tracing::info!(
            "✅ Committed {} rows into {}",
            summary.rows_inserted,
            self.table
        );
        Ok(summary)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| MappingError::DatabaseError(e))
    }
}

/// Parses `[label, code, apply_from, apply_to]`; extra columns are ignored.
pub fn parse_row(record: &csv::StringRecord, line: u64) -> Result<LoadRow> {
    if record.len() < FIELD_COUNT {
        return Err(MappingError::MalformedRowError {
            line,
            message: format!(
                "expected {} fields, found {}",
                FIELD_COUNT,
                record.len()
            ),
        });
    }

    Ok(LoadRow {
        label: record[0].to_string(),
        code: record[1].to_string(),
        apply_from: parse_bound(&record[2]),
        apply_to: parse_bound(&record[3]),
    })
}

fn parse_bound(raw: &str) -> Value {
    let value = raw.trim();
    if value.is_empty() || value == UNBOUNDED {
        return Value::Null;
    }

    match value.parse::<i64>() {
        Ok(ts) => Value::Integer(ts),
        // 非數字原樣寫入，由 SQLite 的 integer affinity 決定存成 TEXT
        Err(_) => Value::Text(raw.to_string()),
    }
}
