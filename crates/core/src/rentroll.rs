use crate::columns::match_column;
use crate::models::{CanonicalField, CellValue, RentRollEntry};
use std::collections::BTreeMap;

/// Header rows hide this deep in real rent-roll worksheets.
pub(crate) const SHEET_HEADER_SCAN_ROWS: usize = 25;
/// Document tables are small; the header is near the top or not there.
pub(crate) const TABLE_HEADER_SCAN_ROWS: usize = 8;
/// Sub-header rows merged into a column header, at most.
pub(crate) const MERGE_ROWS_ABOVE: usize = 3;
/// Data rows sampled when arbitrating duplicate column candidates.
const DUPLICATE_SAMPLE_ROWS: usize = 14;
/// A header interpretation must recognize at least this many columns.
const MIN_MAPPED_COLUMNS: usize = 2;
/// Unit square footage below this is a parse artifact, not a suite.
const MIN_UNIT_SF: f64 = 50.0;

const ROW_SKIP_PATTERNS: [&str; 9] = [
    "total", "subtotal", "sum", "grand total", "---", "add on", "factor", "note:", "notes:",
];
const PLACEHOLDER_VALUES: [&str; 4] = ["none", "-", "n/a", "null"];
const HEADER_SKIP_WORDS: [&str; 5] = ["factor", "note", "formula", "total", "subtotal"];

/// The winning header row of a grid and its column map.
#[derive(Debug, Clone)]
pub struct HeaderMatch {
    pub row: usize,
    pub columns: BTreeMap<usize, CanonicalField>,
}

fn looks_like_iso_date(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}

/// Whether a cell could plausibly label a column: short non-numeric text
/// that is not a date and not a totals/notes artifact.
fn is_header_text(cell: &CellValue) -> bool {
    let CellValue::Text(raw) = cell else {
        return false;
    };
    let text = raw.trim();
    if text.is_empty() || text.chars().count() > 40 {
        return false;
    }

    let digits_only: String = text
        .chars()
        .filter(|c| !matches!(c, '.' | ',' | '-' | '/'))
        .collect();
    if !digits_only.is_empty() && digits_only.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }

    if looks_like_iso_date(text) {
        return false;
    }

    let lowered = text.to_lowercase();
    !HEADER_SKIP_WORDS.iter().any(|word| lowered.contains(word))
}

fn map_single_row(row: &[CellValue]) -> BTreeMap<usize, CanonicalField> {
    let mut columns = BTreeMap::new();
    for (index, cell) in row.iter().enumerate() {
        if cell.is_empty() {
            continue;
        }
        if let Some(field) = match_column(&cell.display()) {
            if !columns.values().any(|mapped| *mapped == field) {
                columns.insert(index, field);
            }
        }
    }
    columns
}

fn map_headers(headers: &[String]) -> BTreeMap<usize, CanonicalField> {
    let mut columns = BTreeMap::new();
    for (index, header) in headers.iter().enumerate() {
        if header.is_empty() {
            continue;
        }
        if let Some(field) = match_column(header) {
            if !columns.values().any(|mapped| *mapped == field) {
                columns.insert(index, field);
            }
        }
    }
    columns
}

/// Per-column header text merged from up to [`MERGE_ROWS_ABOVE`] rows
/// above the candidate plus the candidate itself, top to bottom. Handles
/// stacked headers like Current / Monthly / Rent.
fn merged_headers(rows: &[Vec<CellValue>], candidate: usize) -> Vec<String> {
    let width = rows[candidate].len();
    let mut merged = vec![String::new(); width];

    let start = candidate.saturating_sub(MERGE_ROWS_ABOVE);
    for row in &rows[start..=candidate] {
        for (index, cell) in row.iter().take(width).enumerate() {
            if is_header_text(cell) {
                let text = cell.display();
                if merged[index].is_empty() {
                    merged[index] = text;
                } else {
                    merged[index].push(' ');
                    merged[index].push_str(&text);
                }
            }
        }
    }

    merged
}

/// Scan the first `scan_limit` rows for the row whose header
/// interpretation (own cells, or merged multi-row headers when `merge`
/// is set) maps the most columns. Rows with fewer than two header-like
/// cells never qualify; maps below [`MIN_MAPPED_COLUMNS`] never win.
pub fn find_header_row(
    rows: &[Vec<CellValue>],
    scan_limit: usize,
    merge: bool,
) -> Option<HeaderMatch> {
    let mut best: Option<HeaderMatch> = None;

    for index in 0..rows.len().min(scan_limit) {
        let row = &rows[index];
        if row.iter().filter(|cell| is_header_text(cell)).count() < 2 {
            continue;
        }

        let single = map_single_row(row);
        let columns = if merge {
            let merged = map_headers(&merged_headers(rows, index));
            if merged.len() >= single.len() {
                merged
            } else {
                single
            }
        } else {
            single
        };

        if columns.len() >= MIN_MAPPED_COLUMNS
            && best
                .as_ref()
                .map_or(true, |current| columns.len() > current.columns.len())
        {
            best = Some(HeaderMatch { row: index, columns });
        }
    }

    best
}

fn push_candidate(
    candidates: &mut Vec<(CanonicalField, Vec<usize>)>,
    field: CanonicalField,
    column: usize,
) {
    match candidates.iter_mut().find(|(f, _)| *f == field) {
        Some((_, columns)) => {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        None => candidates.push((field, vec![column])),
    }
}

fn populated_count(rows: &[Vec<CellValue>], column: usize) -> usize {
    rows.iter()
        .filter(|row| {
            row.get(column).is_some_and(|cell| {
                if cell.is_empty() {
                    return false;
                }
                let display = cell.display();
                !display.is_empty() && display != "-"
            })
        })
        .count()
}

/// When several columns map to one field, keep the column with the most
/// real values over a short sample of data rows. Pure arbitration over
/// the candidate list; earlier candidates win ties.
pub fn resolve_duplicate_columns(
    rows: &[Vec<CellValue>],
    header: &HeaderMatch,
    merge: bool,
    columns: &mut BTreeMap<usize, CanonicalField>,
) {
    let mut candidates: Vec<(CanonicalField, Vec<usize>)> = Vec::new();

    if merge {
        for (index, text) in merged_headers(rows, header.row).iter().enumerate() {
            if !text.is_empty() {
                if let Some(field) = match_column(text) {
                    push_candidate(&mut candidates, field, index);
                }
            }
        }
    }
    for (index, cell) in rows[header.row].iter().enumerate() {
        if !cell.is_empty() {
            if let Some(field) = match_column(&cell.display()) {
                push_candidate(&mut candidates, field, index);
            }
        }
    }

    let sample_end = (header.row + 1 + DUPLICATE_SAMPLE_ROWS).min(rows.len());
    let sample = &rows[(header.row + 1).min(rows.len())..sample_end];

    for (field, field_columns) in candidates {
        if field_columns.len() <= 1 {
            continue;
        }

        let mut best_column = field_columns[0];
        let mut best_count = 0;
        for column in field_columns {
            let count = populated_count(sample, column);
            if count > best_count {
                best_count = count;
                best_column = column;
            }
        }

        columns.retain(|_, mapped| *mapped != field);
        columns.insert(best_column, field);
    }
}

fn is_blank_row(row: &[CellValue]) -> bool {
    row.iter().all(CellValue::is_empty)
}

/// Totals, subtotals, note lines, and add-on-factor rows are structure,
/// not tenants.
fn is_skip_row(row: &[CellValue]) -> bool {
    let first = row.first().map(|cell| cell.display()).unwrap_or_default();
    let lowered = first.to_lowercase();
    lowered.starts_with('*') || ROW_SKIP_PATTERNS.iter().any(|pattern| lowered.contains(pattern))
}

fn clean_numeric(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, ',' | '$' | '(' | ')'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().map(f64::abs)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_row(row: &[CellValue], columns: &BTreeMap<usize, CanonicalField>) -> RentRollEntry {
    let mut entry = RentRollEntry::default();

    for (&index, &field) in columns {
        let Some(cell) = row.get(index) else {
            continue;
        };
        if cell.is_empty() {
            continue;
        }

        let display = cell.display();
        if display.is_empty() || PLACEHOLDER_VALUES.contains(&display.to_lowercase().as_str()) {
            continue;
        }

        if field.is_numeric() {
            let value = match cell {
                CellValue::Number(number) => Some(number.abs()),
                _ => clean_numeric(&display),
            };
            if let Some(value) = value {
                if field == CanonicalField::Sf && value < MIN_UNIT_SF {
                    continue;
                }
                entry.set_number(field, value);
            }
        } else {
            // Native workbook dates are already ISO-formatted by the
            // grid conversion; everything else keeps the trimmed string.
            entry.set_text(field, display);
        }
    }

    entry
}

/// Fill in whichever of annual/monthly/psf can be computed from the
/// others. Runs in dependency order so an entry arriving with only
/// {sf, rent_psf} still ends up with annual and monthly rent.
fn derive_missing(entry: &mut RentRollEntry) {
    if entry.annual_rent.is_none() {
        if let (Some(psf), Some(sf)) = (entry.rent_psf, entry.sf) {
            entry.annual_rent = Some(psf * sf);
        }
    }
    if entry.annual_rent.is_none() {
        if let Some(monthly) = entry.monthly_rent {
            entry.annual_rent = Some(monthly * 12.0);
        }
    }
    if entry.monthly_rent.is_none() {
        if let Some(annual) = entry.annual_rent {
            entry.monthly_rent = Some(annual / 12.0);
        }
    }
    if entry.rent_psf.is_none() {
        if let (Some(annual), Some(sf)) = (entry.annual_rent, entry.sf) {
            if sf > 0.0 {
                entry.rent_psf = Some(round2(annual / sf));
            }
        }
    }
}

/// Parse every data row at `start` and below into accepted entries. A
/// row survives only with an identifier and at least one numeric field.
pub fn parse_rows(
    rows: &[Vec<CellValue>],
    start: usize,
    columns: &BTreeMap<usize, CanonicalField>,
) -> Vec<RentRollEntry> {
    let mut entries = Vec::new();

    for row in rows.iter().skip(start) {
        if is_blank_row(row) || is_skip_row(row) {
            continue;
        }

        let mut entry = parse_row(row, columns);
        derive_missing(&mut entry);

        if entry.has_identifier() && entry.has_numeric() {
            entries.push(entry);
        }
    }

    entries
}
