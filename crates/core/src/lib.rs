pub mod columns;
pub mod details;
pub mod error;
pub mod extractor;
pub mod models;
pub mod orchestrator;
pub mod quality;
pub mod rentroll;
pub mod spreadsheet;
pub mod tables;

pub use columns::{match_column, normalize_header};
pub use details::{extract_financial_details, extract_property_details};
pub use error::{ParseError, Result};
pub use extractor::{
    extract_document, extract_page_texts, DocumentContent, ExtractedTable, LopdfExtractor,
    PageText, PdfExtractor,
};
pub use models::{
    Assumptions, CanonicalField, CellValue, FinancialDetails, ParseOutcome, ParsedData,
    ParsingReport, PropertyDetails, PropertyType, RentRollEntry,
};
pub use orchestrator::{parse_offering, OfferingParser};
pub use quality::quality_score;
pub use rentroll::{find_header_row, parse_rows, resolve_duplicate_columns, HeaderMatch};
pub use spreadsheet::{extract_workbook_rent_roll, SheetRentRoll};
pub use tables::extract_table_rent_roll;
