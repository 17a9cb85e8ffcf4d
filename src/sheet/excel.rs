// src/sheet/excel.rs
use calamine::{open_workbook_auto_from_rs, Data, DataType, Range, Reader};
use std::io::Cursor;
use tracing::debug;

use super::{Cell, RawSheet, SheetError};

/// Open an xls/xlsx/ods workbook from memory and read sheet `sheet`.
pub fn read_sheet(bytes: &[u8], sheet: &str) -> Result<RawSheet, SheetError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

    let available = workbook.sheet_names();
    if !available.iter().any(|s| s == sheet) {
        return Err(SheetError::MissingSheet {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    debug!(sheet, start = ?range.start(), end = ?range.end(), "read worksheet range");
    Ok(range_to_sheet(&range))
}

/// calamine trims leading blank rows and columns off a range; put them back
/// so row numbers match the document.
pub(crate) fn range_to_sheet(range: &Range<Data>) -> RawSheet {
    let Some((row0, col0)) = range.start() else {
        return RawSheet::default();
    };

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); row0 as usize];
    for src in range.rows() {
        let mut row = vec![Cell::Empty; col0 as usize];
        row.extend(src.iter().map(convert));
        rows.push(row);
    }
    RawSheet::new(rows)
}

fn convert(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::String(s) => Cell::from_text(s),
        Data::DateTime(_) => cell
            .as_date()
            .map(|d| Cell::Text(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Cell::Empty),
        other => Cell::from_text(&other.to_string()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::SheetPreamble;
    use chrono::NaiveDate;

    #[test]
    fn range_offset_restores_leading_blank_rows_and_columns() {
        let mut range: Range<Data> = Range::new((1, 1), (3, 3));
        range.set_value((1, 1), Data::String("Data Source".into()));
        range.set_value((3, 1), Data::String("Country Name".into()));
        range.set_value((3, 2), Data::Float(2010.0));
        range.set_value((3, 3), Data::Int(2011));

        let sheet = range_to_sheet(&range);

        assert_eq!(sheet.len(), 4);
        assert!(sheet.row(0).is_empty());
        assert!(sheet.cell(1, 0).is_empty());
        assert_eq!(sheet.cell(1, 1), &Cell::Text("Data Source".into()));
        assert!(sheet.cell(2, 1).is_empty());
        assert_eq!(sheet.cell(3, 1).label(), "Country Name");
        assert_eq!(sheet.cell(3, 2).label(), "2010");
        assert_eq!(sheet.cell(3, 3).label(), "2011");
    }

    #[test]
    fn empty_range_gives_empty_sheet() {
        let range: Range<Data> = Range::empty();
        assert!(range_to_sheet(&range).is_empty());
    }

    #[test]
    fn reads_workbook_with_archive_layout() {
        let xlsx = testing::workbook(
            "Data",
            &[
                &["Data Source", "World Development Indicators"],
                &["Last Updated Date", "2024-03-28"],
                &[],
                &["Country Name", "Country Code", "2020", "2021"],
                &["Germany", "DEU", "-3.8", "3.2"],
            ],
        );

        let sheet = read_sheet(&xlsx, "Data").unwrap();
        assert_eq!(sheet.len(), 5);
        assert!(sheet.row(2).iter().all(Cell::is_empty));
        assert_eq!(sheet.cell(3, 0).label(), "Country Name");
        assert_eq!(sheet.cell(3, 2), &Cell::Number(2020.0));
        assert_eq!(sheet.cell(3, 2).label(), "2020");
        assert_eq!(sheet.cell(4, 3), &Cell::Number(3.2));

        let preamble = SheetPreamble::parse(&sheet, 3);
        assert_eq!(preamble.data_source.as_deref(), Some("World Development Indicators"));
        assert_eq!(preamble.last_updated, NaiveDate::from_ymd_opt(2024, 3, 28));
    }

    #[test]
    fn absent_sheet_lists_what_is_there() {
        let xlsx = testing::workbook("Data", &[&["Country Name"]]);
        let err = read_sheet(&xlsx, "Metadata - Countries").unwrap_err();
        match err {
            SheetError::MissingSheet { sheet, available } => {
                assert_eq!(sheet, "Metadata - Countries");
                assert_eq!(available, vec!["Data".to_string()]);
            }
            other => panic!("expected MissingSheet, got {other:?}"),
        }
    }

    #[test]
    fn garbage_bytes_are_a_workbook_error() {
        let err = read_sheet(&[0xD0, 0xCF, 0x11, 0xE0, 1, 2, 3], "Data").unwrap_err();
        assert!(matches!(err, SheetError::Excel(_)));
    }
}
