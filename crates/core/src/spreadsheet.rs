use crate::error::ParseError;
use crate::models::{CanonicalField, CellValue, RentRollEntry};
use crate::rentroll::{
    find_header_row, parse_rows, resolve_duplicate_columns, SHEET_HEADER_SCAN_ROWS,
};
use calamine::{open_workbook_auto, Data, Reader};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// The rent roll recovered from one worksheet. Only the best-scoring
/// sheet of a workbook is ever returned.
#[derive(Debug, Clone)]
pub struct SheetRentRoll {
    pub sheet: String,
    pub columns: BTreeMap<usize, CanonicalField>,
    pub entries: Vec<RentRollEntry>,
}

impl SheetRentRoll {
    /// Row count weighted by schema coverage; favors the sheet that is
    /// both long and wide over a long sheet with two recognized columns.
    pub fn score(&self) -> usize {
        self.entries.len() * self.columns.len()
    }
}

fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::from_text(text),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Text(if *value { "TRUE" } else { "FALSE" }.to_string()),
        Data::Error(_) => CellValue::Empty,
        Data::DateTime(datetime) => match datetime.as_datetime() {
            Some(naive) => CellValue::Date(naive.format("%Y-%m-%d").to_string()),
            None => CellValue::Empty,
        },
        Data::DateTimeIso(iso) => CellValue::Date(iso.chars().take(10).collect()),
        Data::DurationIso(text) => CellValue::from_text(text),
    }
}

/// Extract the single best rent roll from a workbook, or `None` when no
/// sheet carries a recognizable header and qualifying rows.
pub fn extract_workbook_rent_roll(path: &Path) -> Result<Option<SheetRentRoll>, ParseError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|error| ParseError::Workbook(error.to_string()))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let mut best: Option<SheetRentRoll> = None;

    for sheet_name in &sheet_names {
        let Ok(range) = workbook.worksheet_range(sheet_name) else {
            continue;
        };

        let rows: Vec<Vec<CellValue>> = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        if rows.len() < 2 {
            continue;
        }

        let Some(header) = find_header_row(&rows, SHEET_HEADER_SCAN_ROWS, true) else {
            continue;
        };

        let mut columns = header.columns.clone();
        resolve_duplicate_columns(&rows, &header, true, &mut columns);

        let entries = parse_rows(&rows, header.row + 1, &columns);
        if entries.is_empty() {
            continue;
        }

        debug!(
            sheet = %sheet_name,
            header_row = header.row,
            entries = entries.len(),
            mapped = columns.len(),
            "parsed rent roll candidate sheet"
        );

        let candidate = SheetRentRoll {
            sheet: sheet_name.clone(),
            columns,
            entries,
        };
        if best
            .as_ref()
            .map_or(true, |current| candidate.score() > current.score())
        {
            best = Some(candidate);
        }
    }

    if let Some(winner) = &best {
        debug!(
            sheet = %winner.sheet,
            entries = winner.entries.len(),
            score = winner.score(),
            "selected rent roll sheet"
        );
    }

    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};
    use tempfile::tempdir;

    #[test]
    fn header_and_rows_extract_from_a_plain_sheet() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("rent_roll.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (column, header) in ["Unit", "Tenant", "SF", "Rent PSF"].iter().enumerate() {
            sheet.write_string(0, column as u16, *header)?;
        }
        sheet.write_string(1, 0, "101")?;
        sheet.write_string(1, 1, "Acme Co")?;
        sheet.write_number(1, 2, 1200.0)?;
        sheet.write_number(1, 3, 24.0)?;
        workbook.save(&path)?;

        let roll = extract_workbook_rent_roll(&path)?.expect("sheet should qualify");
        assert_eq!(roll.entries.len(), 1);

        let entry = &roll.entries[0];
        assert_eq!(entry.unit.as_deref(), Some("101"));
        assert_eq!(entry.tenant.as_deref(), Some("Acme Co"));
        assert_eq!(entry.sf, Some(1200.0));
        assert_eq!(entry.rent_psf, Some(24.0));
        assert_eq!(entry.annual_rent, Some(28_800.0));
        assert_eq!(entry.monthly_rent, Some(2_400.0));
        Ok(())
    }

    #[test]
    fn best_scoring_sheet_wins_across_the_workbook() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("multi_sheet.xlsx");

        let mut workbook = Workbook::new();

        // A thin summary sheet that technically qualifies.
        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        summary.write_string(0, 0, "Unit")?;
        summary.write_string(0, 1, "SF")?;
        summary.write_string(1, 0, "101")?;
        summary.write_number(1, 1, 1200.0)?;

        // The real rent roll: more rows, more recognized columns.
        let roll = workbook.add_worksheet();
        roll.set_name("Rent Roll")?;
        for (column, header) in ["Unit", "Tenant", "SF", "Annual Rent"].iter().enumerate() {
            roll.write_string(0, column as u16, *header)?;
        }
        for (row, (unit, tenant, sf, rent)) in [
            ("101", "Acme Co", 1200.0, 28_800.0),
            ("102", "Beta LLC", 800.0, 19_200.0),
            ("103", "Gamma Inc", 950.0, 22_800.0),
        ]
        .iter()
        .enumerate()
        {
            let row = (row + 1) as u32;
            roll.write_string(row, 0, *unit)?;
            roll.write_string(row, 1, *tenant)?;
            roll.write_number(row, 2, *sf)?;
            roll.write_number(row, 3, *rent)?;
        }
        workbook.save(&path)?;

        let winner = extract_workbook_rent_roll(&path)?.expect("a sheet should win");
        assert_eq!(winner.sheet, "Rent Roll");
        assert_eq!(winner.entries.len(), 3);
        Ok(())
    }

    #[test]
    fn merged_multi_row_headers_resolve() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("stacked.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 3, "Current")?;
        sheet.write_string(1, 3, "Monthly")?;
        sheet.write_string(2, 0, "Tenant")?;
        sheet.write_string(2, 1, "Suite #")?;
        sheet.write_string(2, 2, "Sq Ft")?;
        sheet.write_string(2, 3, "Rent")?;
        sheet.write_string(3, 0, "Acme Co")?;
        sheet.write_string(3, 1, "101")?;
        sheet.write_number(3, 2, 1200.0)?;
        sheet.write_number(3, 3, 2000.0)?;
        workbook.save(&path)?;

        let roll = extract_workbook_rent_roll(&path)?.expect("stacked header should resolve");
        assert_eq!(roll.entries.len(), 1);
        assert_eq!(roll.entries[0].monthly_rent, Some(2000.0));
        assert_eq!(roll.entries[0].annual_rent, Some(24_000.0));
        Ok(())
    }

    #[test]
    fn native_dates_format_as_iso() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("dates.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (column, header) in ["Unit", "SF", "Lease Start"].iter().enumerate() {
            sheet.write_string(0, column as u16, *header)?;
        }
        sheet.write_string(1, 0, "101")?;
        sheet.write_number(1, 1, 1200.0)?;
        let date_format = Format::new().set_num_format_index(14);
        sheet.write_datetime_with_format(1, 2, ExcelDateTime::from_ymd(2024, 1, 15)?, &date_format)?;
        workbook.save(&path)?;

        let roll = extract_workbook_rent_roll(&path)?.expect("sheet should qualify");
        assert_eq!(roll.entries[0].lease_start.as_deref(), Some("2024-01-15"));
        Ok(())
    }

    #[test]
    fn workbook_without_rent_roll_structure_yields_none(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("narrative.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Quarterly memo")?;
        sheet.write_string(1, 0, "Nothing tabular here")?;
        sheet.write_string(2, 0, "Regards")?;
        workbook.save(&path)?;

        assert!(extract_workbook_rent_roll(&path)?.is_none());
        Ok(())
    }

    #[test]
    fn extraction_is_deterministic_across_runs() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("repeat.xlsx");

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (column, header) in ["Unit", "Tenant", "SF"].iter().enumerate() {
            sheet.write_string(0, column as u16, *header)?;
        }
        sheet.write_string(1, 0, "101")?;
        sheet.write_string(1, 1, "Acme Co")?;
        sheet.write_number(1, 2, 1200.0)?;
        sheet.write_string(2, 0, "102")?;
        sheet.write_string(2, 1, "Beta LLC")?;
        sheet.write_number(2, 2, 800.0)?;
        workbook.save(&path)?;

        let first = extract_workbook_rent_roll(&path)?.expect("first run");
        let second = extract_workbook_rent_roll(&path)?.expect("second run");
        assert_eq!(first.entries, second.entries);
        assert_eq!(first.columns, second.columns);
        Ok(())
    }

    #[test]
    fn unreadable_workbook_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a workbook")?;

        let result = extract_workbook_rent_roll(&path);
        assert!(matches!(result, Err(ParseError::Workbook(_))));
        Ok(())
    }
}
