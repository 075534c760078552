use crate::utils::error::{MappingError, Result};
use chrono::DateTime;
use reqwest::Client;
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::io::Write;
use std::time::Duration;

pub const DEFAULT_ASN_ENDPOINT: &str = "https://api.data.caida.org/as2org/dev/asns/";
pub const USER_AGENT: &str = "telegraf-friendlytagger";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const UNKNOWN_ASN_NAME: &str = "Name Unknown";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsnPage {
    #[serde(default)]
    pub page_info: PageInfo,
    #[serde(default)]
    pub data: Vec<AsnRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsnRecord {
    pub asn: String,
    #[serde(default)]
    pub asn_name: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub org_id: Option<AsOrg>,
    pub changed: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AsOrg {
    #[serde(default)]
    pub org_name: String,
}

impl AsnRecord {
    pub fn display_name(&self) -> &str {
        if self.asn_name.is_empty() {
            UNKNOWN_ASN_NAME
        } else {
            &self.asn_name
        }
    }

    /// `"<name>, <country>"`, the label stored for this ASN.
    pub fn label(&self) -> String {
        format!("{}, {}", self.display_name(), self.country)
    }

    pub fn org_name(&self) -> &str {
        self.org_id.as_ref().map(|o| o.org_name.as_str()).unwrap_or("")
    }

    pub fn changed_at(&self) -> Result<i64> {
        Ok(DateTime::parse_from_rfc3339(&self.changed)?.timestamp())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AsnSummary {
    pub pages: u32,
    pub records_seen: u64,
    pub rows_inserted: u64,
}

/// Pages through the AS-to-organisation API into an ASN mapping table.
pub struct AsnImporter {
    client: Client,
    endpoint: String,
    conn: Connection,
    table: String,
}

impl AsnImporter {
    pub fn new(conn: Connection, endpoint: &str, table: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        let importer = Self {
            client,
            endpoint: endpoint.to_string(),
            conn,
            table: table.to_string(),
        };
        importer.ensure_table()?;
        Ok(importer)
    }

    pub fn ensure_table(&self) -> Result<()> {
        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (code text NOT NULL, label text NOT NULL, orgname text, apply_from INTEGER, apply_to INTEGER, UNIQUE(code, apply_from))",
                self.table
            ),
            [],
        )?;
        Ok(())
    }

    pub async fn fetch_page(&self, page: u32) -> Result<AsnPage> {
        tracing::debug!("Requesting ASN page {} from {}", page, self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("verbose", "true"), ("page", page.to_string().as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(MappingError::SourceStatusError {
                url: self.endpoint.clone(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.json::<AsnPage>().await?)
    }

    /// 每一頁一個交易，任何錯誤都會讓該頁整個回滾
    pub fn store_page<W: Write>(&mut self, page: &AsnPage, progress: &mut W) -> Result<u64> {
        let insert = format!(
            "INSERT OR IGNORE INTO {}(code, label, orgname, apply_from) VALUES (?1, ?2, ?3, ?4)",
            self.table
        );
        let tx = self.conn.transaction()?;
        let mut inserted = 0u64;

        {
            let mut stmt = tx.prepare(&insert)?;
            for record in &page.data {
                let changed = record.changed_at()?;
                inserted += stmt.execute(params![
                    record.asn,
                    record.label(),
                    record.org_name(),
                    changed
                ])? as u64;

                writeln!(
                    progress,
                    "{} {}, {} ({}) -- {}",
                    record.asn,
                    record.display_name(),
                    record.country,
                    record.org_name(),
                    changed
                )?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// Imports page 1, 2, … until the API reports no further page.
    pub async fn run<W: Write>(&mut self, progress: &mut W) -> Result<AsnSummary> {
        let mut summary = AsnSummary::default();
        let mut page_id = 1u32;

        loop {
            let page = self.fetch_page(page_id).await?;
            let inserted = self.store_page(&page, progress)?;

            summary.pages += 1;
            summary.records_seen += page.data.len() as u64;
            summary.rows_inserted += inserted;
            tracing::info!(
                "📄 Page {}: {} records, {} new rows",
                page_id,
                page.data.len(),
                inserted
            );

            if !page.page_info.has_next_page {
                break;
            }
            page_id += 1;
        }

        Ok(summary)
    }

    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| MappingError::DatabaseError(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asn: &str, name: &str, changed: &str) -> AsnRecord {
        AsnRecord {
            asn: asn.to_string(),
            asn_name: name.to_string(),
            country: "NZ".to_string(),
            org_id: Some(AsOrg {
                org_name: "University of Waikato".to_string(),
            }),
            changed: changed.to_string(),
        }
    }

    #[test]
    fn test_empty_name_becomes_unknown() {
        let rec = record("681", "", "2020-06-16T22:21:28Z");
        assert_eq!(rec.label(), "Name Unknown, NZ");
    }

    #[test]
    fn test_changed_is_unix_seconds() {
        let rec = record("681", "WAIKATO", "2020-06-16T22:21:28Z");
        assert_eq!(rec.changed_at().unwrap(), 1592346088);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let rec = record("681", "WAIKATO", "yesterday");
        assert!(matches!(
            rec.changed_at(),
            Err(MappingError::TimestampError(_))
        ));
    }

    #[test]
    fn test_page_deserializes_camel_case() {
        let json = r#"{
            "totalCount": 1,
            "pageInfo": {"pageSize": 1, "pageOffset": 0, "hasNextPage": true},
            "data": [{"asn": "681", "asnName": "WAIKATO", "country": "NZ",
                      "orgId": {"orgName": "University of Waikato"},
                      "changed": "2020-06-16T22:21:28Z"}]
        }"#;

        let page: AsnPage = serde_json::from_str(json).unwrap();
        assert!(page.page_info.has_next_page);
        assert_eq!(page.data[0].org_name(), "University of Waikato");
    }

    #[test]
    fn test_store_page_ignores_duplicates() {
        let conn = Connection::open_in_memory().unwrap();
        let mut importer = AsnImporter::new(conn, DEFAULT_ASN_ENDPOINT, "asn_mappings").unwrap();
        let page = AsnPage {
            data: vec![
                record("681", "WAIKATO", "2020-06-16T22:21:28Z"),
                record("681", "WAIKATO", "2020-06-16T22:21:28Z"),
            ],
            ..Default::default()
        };

        let mut progress: Vec<u8> = Vec::new();
        let inserted = importer.store_page(&page, &mut progress).unwrap();

        assert_eq!(inserted, 1);
        let output = String::from_utf8(progress).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.starts_with("681 WAIKATO, NZ (University of Waikato) -- 1592346088"));
    }
}
