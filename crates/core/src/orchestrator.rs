use crate::details::{extract_financial_details, extract_property_details};
use crate::error::ParseError;
use crate::extractor::{extract_document, LopdfExtractor, PdfExtractor};
use crate::models::{ParseOutcome, ParsedData, ParsingReport};
use crate::quality::quality_score;
use crate::rentroll::round2;
use crate::spreadsheet::extract_workbook_rent_roll;
use crate::tables::extract_table_rent_roll;
use std::path::Path;
use tracing::debug;

/// Premium over the going-in cap rate assumed at exit.
const EXIT_CAP_SPREAD: f64 = 0.25;

/// Runs the full pipeline over an optional document and an optional
/// workbook. A failed source degrades the result and lands in the
/// report; it never aborts the other source.
pub struct OfferingParser<E: PdfExtractor> {
    extractor: E,
}

impl Default for OfferingParser<LopdfExtractor> {
    fn default() -> Self {
        Self {
            extractor: LopdfExtractor,
        }
    }
}

impl<E: PdfExtractor> OfferingParser<E> {
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    pub fn parse(
        &self,
        document: Option<&Path>,
        workbook: Option<&Path>,
    ) -> Result<ParseOutcome, ParseError> {
        if document.is_none() && workbook.is_none() {
            return Err(ParseError::InvalidArgument(
                "at least one of a document path or a workbook path is required".to_string(),
            ));
        }

        let mut data = ParsedData::default();
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        if let Some(path) = document {
            if let Err(error) = self.parse_document(path, &mut data, &mut warnings) {
                errors.push(format!("document parsing error: {error}"));
            }
        }

        if let Some(path) = workbook {
            match extract_workbook_rent_roll(path) {
                Ok(Some(sheet)) => {
                    warnings.push(format!(
                        "extracted {} rent roll entries from workbook sheet '{}'",
                        sheet.entries.len(),
                        sheet.sheet
                    ));
                    // Workbook rows replace whatever the document tables
                    // produced; there is no merge.
                    data.rent_roll = sheet.entries;
                }
                Ok(None) => warnings.push(
                    "no rent roll structure found in workbook; check the column headers"
                        .to_string(),
                ),
                Err(error) => errors.push(format!("workbook parsing error: {error}")),
            }
        }

        if let Some(cap_rate) = data.financials.cap_rate {
            let normalized = if cap_rate > 1.0 {
                cap_rate
            } else {
                cap_rate * 100.0
            };
            data.assumptions.exit_cap_rate = Some(normalized + EXIT_CAP_SPREAD);
        }

        if let (Some(total_sf), Some(asking_price)) =
            (data.property.total_sf, data.property.asking_price)
        {
            if total_sf > 0.0 {
                data.financials.price_per_sf = Some(round2(asking_price / total_sf));
            }
        }
        if data.financials.asking_price.is_none() {
            data.financials.asking_price = data.property.asking_price;
        }

        let quality = quality_score(&data);
        debug!(
            quality,
            errors = errors.len(),
            warnings = warnings.len(),
            entries = data.rent_roll.len(),
            "offering parse complete"
        );

        Ok(ParseOutcome {
            parsed_data: data,
            parsing_report: ParsingReport {
                errors,
                warnings,
                quality_score: quality,
            },
        })
    }

    fn parse_document(
        &self,
        path: &Path,
        data: &mut ParsedData,
        warnings: &mut Vec<String>,
    ) -> Result<(), ParseError> {
        let content = extract_document(&self.extractor, path)?;
        data.raw_text = content.raw_text.clone();

        data.property = extract_property_details(&content.raw_text)?;
        data.financials = extract_financial_details(&content.raw_text)?;

        if content.tables.is_empty() {
            warnings.push("no tables found in document".to_string());
        } else {
            let rent_roll = extract_table_rent_roll(&content.tables);
            if rent_roll.is_empty() {
                warnings.push(format!(
                    "found {} tables in document but no rent roll structure detected",
                    content.tables.len()
                ));
            } else {
                warnings.push(format!(
                    "extracted {} rent roll entries from document tables",
                    rent_roll.len()
                ));
                data.rent_roll = rent_roll;
            }
        }

        if data.property.is_empty() {
            warnings.push("could not extract property details from document".to_string());
        }
        if data.financials.is_empty() {
            warnings.push("could not extract financial details from document".to_string());
        }

        Ok(())
    }
}

/// Parse with the default lopdf-backed extractor.
pub fn parse_offering(
    document: Option<&Path>,
    workbook: Option<&Path>,
) -> Result<ParseOutcome, ParseError> {
    OfferingParser::default().parse(document, workbook)
}
