use crate::extractor::ExtractedTable;
use crate::models::{CellValue, RentRollEntry};
use crate::rentroll::{
    find_header_row, parse_rows, resolve_duplicate_columns, TABLE_HEADER_SCAN_ROWS,
};
use tracing::debug;

/// Apply the rent-roll column and row discipline to every table pulled
/// out of a document. Tables are assumed single-header, so no multi-row
/// merge runs. Results concatenate in page then row order.
pub fn extract_table_rent_roll(tables: &[ExtractedTable]) -> Vec<RentRollEntry> {
    let mut rent_roll = Vec::new();

    for table in tables {
        if table.rows.len() < 2 {
            continue;
        }

        let rows: Vec<Vec<CellValue>> = table
            .rows
            .iter()
            .map(|row| row.iter().map(|cell| CellValue::from_text(cell)).collect())
            .collect();

        let Some(header) = find_header_row(&rows, TABLE_HEADER_SCAN_ROWS, false) else {
            continue;
        };

        let mut columns = header.columns.clone();
        resolve_duplicate_columns(&rows, &header, false, &mut columns);

        let entries = parse_rows(&rows, header.row + 1, &columns);
        if !entries.is_empty() {
            debug!(
                page = table.page,
                entries = entries.len(),
                "parsed rent roll entries from document table"
            );
            rent_roll.extend(entries);
        }
    }

    rent_roll
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(page: u32, rows: &[&[&str]]) -> ExtractedTable {
        ExtractedTable {
            page,
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn recognizable_table_yields_entries() {
        let tables = vec![table(
            2,
            &[
                &["Unit", "Tenant", "SF", "Rent PSF"],
                &["101", "Acme Co", "1,200", "24.00"],
                &["102", "Beta LLC", "800", "22.50"],
            ],
        )];

        let entries = extract_table_rent_roll(&tables);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].unit.as_deref(), Some("101"));
        assert_eq!(entries[0].sf, Some(1200.0));
        assert_eq!(entries[0].annual_rent, Some(28_800.0));
        assert_eq!(entries[1].rent_psf, Some(22.5));
    }

    #[test]
    fn tables_concatenate_in_page_order() {
        let tables = vec![
            table(1, &[&["Unit", "SF"], &["101", "1200"]]),
            table(4, &[&["Unit", "SF"], &["201", "900"]]),
        ];

        let entries = extract_table_rent_roll(&tables);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].unit.as_deref(), Some("101"));
        assert_eq!(entries[1].unit.as_deref(), Some("201"));
    }

    #[test]
    fn unrecognizable_tables_are_ignored() {
        let tables = vec![table(
            1,
            &[
                &["Year", "Population"],
                &["2020", "54,000"],
                &["2021", "55,500"],
            ],
        )];

        assert!(extract_table_rent_roll(&tables).is_empty());
    }

    #[test]
    fn header_beyond_scan_depth_is_not_found() {
        let mut rows: Vec<Vec<String>> = (0..9)
            .map(|i| vec![format!("narrative {i}"), format!("filler {i}")])
            .collect();
        rows.push(vec!["Unit".to_string(), "SF".to_string()]);
        rows.push(vec!["101".to_string(), "1200".to_string()]);

        let tables = vec![ExtractedTable { page: 1, rows }];
        assert!(extract_table_rent_roll(&tables).is_empty());
    }
}
