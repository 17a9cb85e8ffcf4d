// src/sheet/preamble.rs
use chrono::NaiveDate;
use tracing::warn;

use super::RawSheet;

/// Metadata carried in the rows skipped before the column header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetPreamble {
    pub data_source: Option<String>,
    pub last_updated: Option<NaiveDate>,
}

impl SheetPreamble {
    /// Scan the first `header_skip` rows for `key, value` pairs.
    pub fn parse(sheet: &RawSheet, header_skip: usize) -> Self {
        let mut preamble = SheetPreamble::default();
        for r in 0..header_skip.min(sheet.len()) {
            let key = sheet.cell(r, 0).label();
            let value = sheet.cell(r, 1).label();
            match key.as_str() {
                "Data Source" if !value.is_empty() => preamble.data_source = Some(value),
                "Last Updated Date" => preamble.last_updated = parse_date(&value),
                _ => {}
            }
        }
        preamble
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim().trim_matches('"');
    // Excel date cells decode as "YYYY-MM-DD"; keep a slash form for hand-saved files.
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(cleaned, fmt) {
            return Some(d);
        }
    }
    warn!(raw, "failed to parse last updated date");
    None
}
