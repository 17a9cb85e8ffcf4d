// src/sheet/csv_bundle.rs
//! The archive's `downloadformat=csv` bundle: a zip holding the indicator
//! data as `API_<code>_DS2_<lang>_csv_v2_<n>.csv` next to two
//! `Metadata_*.csv` files.

use csv::ReaderBuilder;
use std::io::{Cursor, Read};
use tracing::{debug, trace};
use zip::ZipArchive;

use super::{Cell, RawSheet, SheetError};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const DATA_MEMBER_PREFIX: &str = "API_";

/// Read the CSV member selected by `sheet`: the first `.csv` member whose
/// file name starts with `sheet`, falling back to the `API_` data member
/// when `sheet` is the workbook's sheet name "Data".
pub fn read_sheet(bytes: &[u8], sheet: &str) -> Result<RawSheet, SheetError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let csv_members: Vec<String> = archive
        .file_names()
        .filter(|n| n.to_lowercase().ends_with(".csv"))
        .map(str::to_string)
        .collect();

    let base = |n: &str| n.rsplit('/').next().unwrap_or(n).to_string();
    let member = csv_members
        .iter()
        .find(|n| base(n).starts_with(sheet))
        .or_else(|| match sheet {
            "Data" => csv_members
                .iter()
                .find(|n| base(n).starts_with(DATA_MEMBER_PREFIX)),
            _ => None,
        })
        .cloned()
        .ok_or_else(|| SheetError::MissingSheet {
            sheet: sheet.to_string(),
            available: csv_members.clone(),
        })?;
    debug!(member = %member, "selected csv member");

    let mut entry = archive.by_name(&member)?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;

    parse_csv(&buf)
}

/// Parse CSV bytes into a grid, one row per physical line. Blank lines are
/// kept as empty rows so row positions stay absolute; the csv reader on its
/// own would drop them. Quoted fields spanning lines are not supported.
pub(crate) fn parse_csv(bytes: &[u8]) -> Result<RawSheet, SheetError> {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for (line_no, line) in body.split(|b| *b == b'\n').enumerate() {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.iter().all(u8::is_ascii_whitespace) {
            rows.push(Vec::new());
            continue;
        }

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line);
        let row: Vec<Cell> = match rdr.records().next() {
            Some(record) => record?.iter().map(Cell::from_text).collect(),
            None => Vec::new(),
        };
        trace!(line = line_no, fields = row.len(), "csv record");
        rows.push(row);
    }
    while rows.last().is_some_and(Vec::is_empty) {
        rows.pop();
    }

    Ok(RawSheet::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const BUNDLE_CSV: &str = "\u{feff}\"Data Source\",\"World Development Indicators\",\n\
\n\
\"Last Updated Date\",\"2024-03-28\",\n\
\n\
\"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2020\",\"2021\",\n\
\"Germany\",\"DEU\",\"GDP growth (annual %)\",\"NY.GDP.MKTP.KD.ZG\",\"-3.8\",\"3.2\",\n\
\"Panama\",\"PAN\",\"GDP growth (annual %)\",\"NY.GDP.MKTP.KD.ZG\",\"-17.7\",\"\",\n";

    fn bundle() -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default();
            zip.start_file("Metadata_Country_API_NY.GDP.MKTP.KD.ZG_DS2.csv", options)
                .unwrap();
            zip.write_all(b"\"Country Code\",\"Region\"\n\"DEU\",\"Europe\"\n")
                .unwrap();
            zip.start_file("API_NY.GDP.MKTP.KD.ZG_DS2_en_csv_v2_1.csv", options)
                .unwrap();
            zip.write_all(BUNDLE_CSV.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        buf
    }

    #[test]
    fn blank_lines_keep_their_row_positions() {
        let sheet = parse_csv(BUNDLE_CSV.as_bytes()).unwrap();

        assert_eq!(sheet.cell(0, 0).label(), "Data Source");
        assert!(sheet.row(1).iter().all(Cell::is_empty));
        assert_eq!(sheet.cell(2, 1).label(), "2024-03-28");
        assert_eq!(sheet.cell(4, 0).label(), "Country Name");
        assert_eq!(sheet.cell(5, 4), &Cell::Text("-3.8".into()));
        assert!(sheet.cell(6, 5).is_empty());
    }

    #[test]
    fn data_sheet_name_selects_the_api_member() {
        let sheet = read_sheet(&bundle(), "Data").unwrap();
        assert_eq!(sheet.cell(4, 0).label(), "Country Name");
    }

    #[test]
    fn prefix_selects_a_metadata_member() {
        let sheet = read_sheet(&bundle(), "Metadata_Country").unwrap();
        assert_eq!(sheet.cell(1, 1).label(), "Europe");
    }

    #[test]
    fn unknown_member_lists_what_is_available() {
        let err = read_sheet(&bundle(), "Sheet1").unwrap_err();
        match err {
            SheetError::MissingSheet { sheet, available } => {
                assert_eq!(sheet, "Sheet1");
                assert_eq!(available.len(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
