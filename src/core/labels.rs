//! Label resolution: attaches human-readable labels to code tags.
//!
//! Code tags that can be annotated: `continent_code`, `country_code`,
//! `region_code`, `county_code` and `asn`. Continents come from a static
//! table, everything else from one mapping table per tag type. When a code
//! has several labels, the one with the newest `apply_from` not after the
//! metric timestamp wins.

use crate::domain::model::{LabelSet, MappingKind, Metric};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use rusqlite::types::Value;
use rusqlite::Connection;
use std::collections::{BTreeMap, HashMap};

pub const CONTINENT_CODE_TAG: &str = "continent_code";
pub const CONTINENT_LABEL_TAG: &str = "continent_label";

const CONTINENTS: [(&str, &str); 8] = [
    ("??", "Unassigned"),
    ("AS", "Asia"),
    ("NA", "North America"),
    ("EU", "Europe"),
    ("OC", "Oceania"),
    ("SA", "South America"),
    ("AF", "Africa"),
    ("AN", "Antarctica"),
];

pub fn static_continents() -> HashMap<String, LabelSet> {
    CONTINENTS
        .iter()
        .map(|(code, label)| (code.to_string(), LabelSet::always(label)))
        .collect()
}

/// Reads `code → LabelSet` from a mapping table, oldest label first.
pub fn load_table(conn: &Connection, table: &str) -> Result<HashMap<String, LabelSet>> {
    // 依 apply_from 排序，label_at 的反向搜尋才會正確
    let query = format!(
        "SELECT code, label, apply_from FROM {} ORDER BY apply_from",
        table
    );
    let mut stmt = conn.prepare(&query)?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Value>(2)?,
        ))
    })?;

    let mut mappings: HashMap<String, LabelSet> = HashMap::new();
    for row in rows {
        let (code, label, apply_from) = row?;
        let start = match apply_from {
            Value::Null => 0,
            Value::Integer(ts) => ts,
            other => {
                tracing::warn!(
                    "Skipping {} label for {}: apply_from {:?} is not a timestamp",
                    table,
                    code,
                    other
                );
                continue;
            }
        };
        mappings.entry(code).or_default().push(start, label);
    }

    tracing::debug!("Loaded {} codes from {}", mappings.len(), table);
    Ok(mappings)
}

/// Mappings for a single tag type, e.g. `country_code → country_label`.
#[derive(Debug, Clone)]
pub struct TagBinding {
    pub label_tag: String,
    pub mappings: HashMap<String, LabelSet>,
}

pub struct LabelResolver<C: ConfigProvider> {
    config: C,
    conn: Connection,
    bindings: BTreeMap<String, TagBinding>,
    last_reload: Option<i64>,
}

impl<C: ConfigProvider> LabelResolver<C> {
    pub fn new(conn: Connection, config: C) -> Self {
        Self {
            config,
            conn,
            bindings: BTreeMap::new(),
            last_reload: None,
        }
    }

    pub fn open(config: C) -> Result<Self> {
        let conn = Connection::open(config.database_path())?;
        Ok(Self::new(conn, config))
    }

    pub fn needs_reload(&self, timestamp: i64) -> bool {
        match self.last_reload {
            None => true,
            // 時間戳來自外部輸入，避免溢位
            Some(last) => timestamp.saturating_sub(last) >= self.config.reload_frequency(),
        }
    }

    /// 重新讀取所有對照表
    pub fn reload(&mut self) -> Result<()> {
        let mut bindings = BTreeMap::new();
        bindings.insert(
            CONTINENT_CODE_TAG.to_string(),
            TagBinding {
                label_tag: CONTINENT_LABEL_TAG.to_string(),
                mappings: static_continents(),
            },
        );

        for kind in MappingKind::ALL {
            let mappings = load_table(&self.conn, self.config.table_name(kind))?;
            bindings.insert(
                kind.code_tag().to_string(),
                TagBinding {
                    label_tag: kind.label_tag().to_string(),
                    mappings,
                },
            );
        }

        self.bindings = bindings;
        Ok(())
    }

    /// Annotates a batch, reloading the tables first when they are stale.
    ///
    /// The batch timestamp is taken from its first metric.
    pub fn apply(&mut self, metrics: &mut [Metric]) -> Result<()> {
        let Some(first) = metrics.first() else {
            return Ok(());
        };

        let timestamp = first.timestamp;
        if self.needs_reload(timestamp) {
            tracing::info!("🔄 Reloading label tables at {}", timestamp);
            self.reload()?;
            self.last_reload = Some(timestamp);
        }

        for metric in metrics.iter_mut() {
            self.annotate(metric);
        }
        Ok(())
    }

    pub fn label_for(&self, code_tag: &str, code: &str, timestamp: i64) -> Option<&str> {
        self.bindings
            .get(code_tag)?
            .mappings
            .get(code)?
            .label_at(timestamp)
    }

    pub fn annotate(&self, metric: &mut Metric) {
        let additions: Vec<(String, String)> = metric
            .tags
            .iter()
            .filter_map(|(tag, code)| {
                let binding = self.bindings.get(tag)?;
                let label = binding.mappings.get(code)?.label_at(metric.timestamp)?;
                Some((binding.label_tag.clone(), label.to_string()))
            })
            .collect();

        metric.tags.extend(additions);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TomlConfig;

    fn seeded_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE country_mappings (code text not null, label text not null, apply_from integer, apply_to integer);
            CREATE TABLE region_mappings (code text not null, label text not null, apply_from integer, apply_to integer);
            CREATE TABLE county_mappings (code text not null, label text not null, apply_from integer, apply_to integer);
            CREATE TABLE asn_mappings (code text not null, label text not null, orgname text, apply_from integer, apply_to integer);
            INSERT INTO country_mappings VALUES ('NZ', 'New Zealand', NULL, NULL);
            INSERT INTO region_mappings VALUES ('4400', 'Waikato', NULL, NULL);
            INSERT INTO asn_mappings VALUES ('681', 'Quigley College, NZ', NULL, 1592346088, NULL);
            INSERT INTO asn_mappings VALUES ('681', 'University of Waikato, NZ', NULL, 0, NULL);
            "#,
        )
        .unwrap();
        conn
    }

    fn metric(timestamp: i64, tags: &[(&str, &str)]) -> Metric {
        Metric {
            timestamp,
            tags: tags
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_load_table_orders_by_apply_from() {
        let conn = seeded_connection();
        let mappings = load_table(&conn, "asn_mappings").unwrap();

        let set = &mappings["681"];
        assert_eq!(set.start_times, vec![0, 1592346088]);
        assert_eq!(set.labels[0], "University of Waikato, NZ");
    }

    #[test]
    fn test_apply_annotates_known_tags() {
        let mut resolver = LabelResolver::new(seeded_connection(), TomlConfig::default());
        let mut metrics = vec![metric(
            1600000000,
            &[
                ("continent_code", "OC"),
                ("country_code", "NZ"),
                ("region_code", "4400"),
                ("asn", "681"),
                ("county_code", "nowhere"),
            ],
        )];

        resolver.apply(&mut metrics).unwrap();

        let tags = &metrics[0].tags;
        assert_eq!(tags["continent_label"], "Oceania");
        assert_eq!(tags["country_label"], "New Zealand");
        assert_eq!(tags["region_label"], "Waikato");
        assert_eq!(tags["asn_label"], "Quigley College, NZ");
        assert!(!tags.contains_key("county_label"));
    }

    #[test]
    fn test_older_timestamp_gets_older_label() {
        let mut resolver = LabelResolver::new(seeded_connection(), TomlConfig::default());
        resolver.reload().unwrap();

        assert_eq!(
            resolver.label_for("asn", "681", 1000),
            Some("University of Waikato, NZ")
        );
    }

    #[test]
    fn test_reload_follows_frequency() {
        let mut resolver = LabelResolver::new(seeded_connection(), TomlConfig::default());
        assert!(resolver.needs_reload(0));

        let mut metrics = vec![metric(1000, &[])];
        resolver.apply(&mut metrics).unwrap();

        assert!(!resolver.needs_reload(1119));
        assert!(resolver.needs_reload(1120));
    }

    #[test]
    fn test_extreme_timestamps_do_not_overflow() {
        let mut resolver = LabelResolver::new(seeded_connection(), TomlConfig::default());
        resolver.apply(&mut [metric(1000, &[])]).unwrap();

        assert!(!resolver.needs_reload(i64::MIN));

        let mut metrics = vec![metric(i64::MIN, &[("asn", "681")])];
        resolver.apply(&mut metrics).unwrap();
        assert!(!metrics[0].tags.contains_key("asn_label"));

        let mut metrics = vec![metric(i64::MAX, &[("asn", "681")])];
        resolver.apply(&mut metrics).unwrap();
        assert_eq!(metrics[0].tags["asn_label"], "Quigley College, NZ");
    }

    #[test]
    fn test_non_integer_apply_from_is_skipped() {
        let conn = seeded_connection();
        conn.execute(
            "INSERT INTO country_mappings VALUES ('NZ', 'Aotearoa', 'soon', NULL)",
            [],
        )
        .unwrap();

        let mappings = load_table(&conn, "country_mappings").unwrap();
        assert_eq!(mappings["NZ"].labels, vec!["New Zealand".to_string()]);
    }

    #[test]
    fn test_missing_table_is_an_error() {
        let conn = Connection::open_in_memory().unwrap();
        let mut resolver = LabelResolver::new(conn, TomlConfig::default());
        assert!(resolver.reload().is_err());
    }
}
