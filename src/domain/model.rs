use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 交換格式中代表「無限期」的值
pub const UNBOUNDED: &str = "0";

/// One code → label association, as stored in a mapping table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRow {
    pub code: String,
    pub label: String,
    pub apply_from: Option<i64>,
    pub apply_to: Option<i64>,
}

impl MappingRow {
    /// An always-valid row, which is what the exporters produce.
    pub fn unbounded(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            apply_from: None,
            apply_to: None,
        }
    }

    /// Interchange CSV line: `label,code,apply_from,apply_to` with `0` for unbounded.
    pub fn to_interchange_line(&self) -> String {
        format!(
            "{},{},{},{}",
            self.label,
            self.code,
            bound_to_field(self.apply_from),
            bound_to_field(self.apply_to)
        )
    }
}

fn bound_to_field(bound: Option<i64>) -> String {
    match bound {
        Some(ts) => ts.to_string(),
        None => UNBOUNDED.to_string(),
    }
}

/// Labels for a single code, ordered by the time they start to apply.
///
/// `start_times[i]` is the start of `labels[i]`. Example: ASN 681 renamed at
/// 1592346088 is `{0, 1592346088}` / `{"University of Waikato, NZ", "Quigley College, NZ"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pub start_times: Vec<i64>,
    pub labels: Vec<String>,
}

impl LabelSet {
    pub fn always(label: &str) -> Self {
        Self {
            start_times: vec![0],
            labels: vec![label.to_string()],
        }
    }

    /// 呼叫端必須依 start_time 遞增順序加入
    pub fn push(&mut self, start_time: i64, label: String) {
        self.start_times.push(start_time);
        self.labels.push(label);
    }

    /// Newest label whose start time is not after `timestamp`.
    pub fn label_at(&self, timestamp: i64) -> Option<&str> {
        // 從最新的往回找，即時資料通常命中最後一筆
        self.start_times
            .iter()
            .zip(&self.labels)
            .rev()
            .find(|(start, _)| **start <= timestamp)
            .map(|(_, label)| label.as_str())
    }
}

/// The code tags that can be annotated from a mapping table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MappingKind {
    Country,
    Region,
    County,
    Asn,
}

impl MappingKind {
    pub const ALL: [MappingKind; 4] = [
        MappingKind::Country,
        MappingKind::Region,
        MappingKind::County,
        MappingKind::Asn,
    ];

    pub fn code_tag(self) -> &'static str {
        match self {
            MappingKind::Country => "country_code",
            MappingKind::Region => "region_code",
            MappingKind::County => "county_code",
            MappingKind::Asn => "asn",
        }
    }

    pub fn label_tag(self) -> &'static str {
        match self {
            MappingKind::Country => "country_label",
            MappingKind::Region => "region_label",
            MappingKind::County => "county_label",
            MappingKind::Asn => "asn_label",
        }
    }

    pub fn default_table(self) -> &'static str {
        match self {
            MappingKind::Country => "country_mappings",
            MappingKind::Region => "region_mappings",
            MappingKind::County => "county_mappings",
            MappingKind::Asn => "asn_mappings",
        }
    }
}

/// A time series point whose tags may be annotated with labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub timestamp: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
