//! Spreadsheet import translator.
//!
//! Maps arbitrary spreadsheet rows onto the disk shape using ordered column
//! aliases, stages the result for review, and hands back the approved subset
//! without the staging sequence numbers.

mod workbook;

pub use workbook::read_first_sheet;

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{DiskInput, STATUS_BAD, STATUS_GOOD, STATUS_REVIEW};

/// One spreadsheet row keyed by header text.
pub type SheetRow = HashMap<String, Value>;

pub const DEFAULT_CODE: &str = "S/N";
pub const DEFAULT_SERIAL: &str = "S/N";
pub const DEFAULT_TYPE: &str = "HDD";
pub const DEFAULT_BRAND: &str = "Generic";

const CODE_ALIASES: &[&str] = &["D /Código interno de la aplicación", "Codigo", "Código"];
const HOST_ALIASES: &[&str] = &[
    "ID del equipo donde se almacena físicamente las unidades de disco",
    "Equipo",
];
const TYPE_ALIASES: &[&str] = &["Tipo"];
const BRAND_ALIASES: &[&str] = &["Marca"];
const CAPACITY_ALIASES: &[&str] = &["Capacidad (GB)", "Capacidad"];
const SERIAL_ALIASES: &[&str] = &["No. de Serie", "Serie"];
const STATUS_ALIASES: &[&str] = &["Estado del disco", "Estado"];
const OBSERVATION_ALIASES: &[&str] = &["Observaciones"];
const BRAND_AND_CAPACITY_COLUMN: &str = "Marca y capacidad";

static SIZE_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(TB|GB)").expect("valid regex"));

/// A candidate record awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StagedRecord {
    /// Position in the uploaded sheet; never sent to the store
    pub seq: usize,
    pub selected: bool,
    #[serde(flatten)]
    pub disk: DiskInput,
}

/// Rows staged from the last upload together with the reviewer's choices.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportStage {
    pub rows: Vec<StagedRecord>,
}

impl ImportStage {
    pub fn new(rows: Vec<StagedRecord>) -> Self {
        Self { rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn toggle(&mut self, seq: usize) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.seq == seq) {
            row.selected = !row.selected;
        }
    }

    pub fn set_all(&mut self, selected: bool) {
        for row in &mut self.rows {
            row.selected = selected;
        }
    }

    pub fn selected_count(&self) -> usize {
        self.rows.iter().filter(|r| r.selected).count()
    }

    /// The approved rows as store inputs, each paired with its sequence
    /// number for failure reporting. The inputs themselves carry no tag.
    pub fn approved(&self) -> Vec<(usize, DiskInput)> {
        self.rows
            .iter()
            .filter(|r| r.selected)
            .map(|r| (r.seq, r.disk.clone()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Translate sheet rows into staged records, all initially selected.
///
/// `today` fills the purchase date, which spreadsheets do not carry.
pub fn translate_rows(rows: &[SheetRow], today: &str) -> Vec<StagedRecord> {
    rows.iter()
        .enumerate()
        .map(|(seq, row)| StagedRecord {
            seq,
            selected: true,
            disk: translate_row(row, today),
        })
        .collect()
}

fn translate_row(row: &SheetRow, today: &str) -> DiskInput {
    let (brand, capacity) = match text_field(row, &[BRAND_AND_CAPACITY_COLUMN]) {
        Some(combined) => parse_brand_capacity(&combined),
        None => (
            text_field(row, BRAND_ALIASES).unwrap_or_else(|| DEFAULT_BRAND.to_string()),
            capacity_field(row, CAPACITY_ALIASES),
        ),
    };

    let status = text_field(row, STATUS_ALIASES)
        .map(|raw| translate_status(&raw).to_string())
        .unwrap_or_else(|| STATUS_GOOD.to_string());

    DiskInput {
        internal_code: text_field(row, CODE_ALIASES).unwrap_or_else(|| DEFAULT_CODE.to_string()),
        host_id: text_field(row, HOST_ALIASES).unwrap_or_default(),
        disk_type: text_field(row, TYPE_ALIASES).unwrap_or_else(|| DEFAULT_TYPE.to_string()),
        capacity,
        brand,
        serial: text_field(row, SERIAL_ALIASES).unwrap_or_else(|| DEFAULT_SERIAL.to_string()),
        status,
        purchase_date: today.to_string(),
        install_date: String::new(),
        observations: text_field(row, OBSERVATION_ALIASES).unwrap_or_default(),
    }
}

/// Split combined text such as `HGST 1TB` into brand and capacity in GB.
///
/// Without a size token the whole text is the brand and capacity is zero.
pub fn parse_brand_capacity(text: &str) -> (String, f64) {
    let text = text.trim();
    let Some(caps) = SIZE_TOKEN_RE.captures(text) else {
        return (text.to_string(), 0.0);
    };

    let amount: f64 = caps[1].parse().unwrap_or(0.0);
    let gigabytes = if caps[2].eq_ignore_ascii_case("TB") {
        amount * 1000.0
    } else {
        amount
    };

    let token = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let mut rest = String::with_capacity(text.len());
    rest.push_str(&text[..token.start]);
    rest.push_str(&text[token.end..]);
    let brand = rest.trim();

    let brand = if brand.is_empty() {
        DEFAULT_BRAND.to_string()
    } else {
        brand.to_string()
    };
    (brand, gigabytes)
}

/// Map spreadsheet status codes onto the canonical status words.
pub fn translate_status(raw: &str) -> &'static str {
    match raw.trim() {
        "A" | "Operativo" | "Bueno" => STATUS_GOOD,
        "M" | "Baja" | "Malo" => STATUS_BAD,
        _ => STATUS_REVIEW,
    }
}

/// First alias with a non-empty value, rendered as text.
fn text_field(row: &SheetRow, aliases: &[&str]) -> Option<String> {
    aliases
        .iter()
        .filter_map(|alias| row.get(*alias))
        .filter_map(value_text)
        .find(|s| !s.is_empty())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        }),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Capacity in GB from a numeric cell, a numeric string, or a size token.
fn capacity_field(row: &SheetRow, aliases: &[&str]) -> f64 {
    for alias in aliases {
        match row.get(*alias) {
            Some(Value::Number(n)) => {
                if let Some(v) = n.as_f64().filter(|v| *v != 0.0) {
                    return v;
                }
            }
            Some(Value::String(s)) if !s.trim().is_empty() => {
                if let Ok(v) = s.trim().parse::<f64>() {
                    return v;
                }
                return parse_brand_capacity(s).1;
            }
            _ => {}
        }
    }
    0.0
}
