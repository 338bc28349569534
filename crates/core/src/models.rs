use serde::{Deserialize, Serialize};

/// The ten normalized rent-roll schema keys. Declaration order is the
/// tie-break order for column matching, so new fields go at the end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Unit,
    Tenant,
    Sf,
    AnnualRent,
    MonthlyRent,
    RentPsf,
    LeaseStart,
    LeaseEnd,
    LeaseType,
    Status,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 10] = [
        CanonicalField::Unit,
        CanonicalField::Tenant,
        CanonicalField::Sf,
        CanonicalField::AnnualRent,
        CanonicalField::MonthlyRent,
        CanonicalField::RentPsf,
        CanonicalField::LeaseStart,
        CanonicalField::LeaseEnd,
        CanonicalField::LeaseType,
        CanonicalField::Status,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            CanonicalField::Unit => "unit",
            CanonicalField::Tenant => "tenant",
            CanonicalField::Sf => "sf",
            CanonicalField::AnnualRent => "annual_rent",
            CanonicalField::MonthlyRent => "monthly_rent",
            CanonicalField::RentPsf => "rent_psf",
            CanonicalField::LeaseStart => "lease_start",
            CanonicalField::LeaseEnd => "lease_end",
            CanonicalField::LeaseType => "lease_type",
            CanonicalField::Status => "status",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            CanonicalField::Sf
                | CanonicalField::AnnualRent
                | CanonicalField::MonthlyRent
                | CanonicalField::RentPsf
        )
    }

    pub fn is_date(&self) -> bool {
        matches!(self, CanonicalField::LeaseStart | CanonicalField::LeaseEnd)
    }
}

/// One tenant line of the rent roll. Only the fields a source actually
/// yielded are present; accepted entries always carry an identifier
/// (unit or tenant) and at least one numeric field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RentRollEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_rent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rent_psf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lease_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RentRollEntry {
    pub fn set_text(&mut self, field: CanonicalField, value: String) {
        match field {
            CanonicalField::Unit => self.unit = Some(value),
            CanonicalField::Tenant => self.tenant = Some(value),
            CanonicalField::LeaseStart => self.lease_start = Some(value),
            CanonicalField::LeaseEnd => self.lease_end = Some(value),
            CanonicalField::LeaseType => self.lease_type = Some(value),
            CanonicalField::Status => self.status = Some(value),
            _ => {}
        }
    }

    pub fn set_number(&mut self, field: CanonicalField, value: f64) {
        match field {
            CanonicalField::Sf => self.sf = Some(value),
            CanonicalField::AnnualRent => self.annual_rent = Some(value),
            CanonicalField::MonthlyRent => self.monthly_rent = Some(value),
            CanonicalField::RentPsf => self.rent_psf = Some(value),
            _ => {}
        }
    }

    pub fn has_identifier(&self) -> bool {
        self.unit.is_some() || self.tenant.is_some()
    }

    pub fn has_numeric(&self) -> bool {
        self.sf.is_some()
            || self.annual_rent.is_some()
            || self.monthly_rent.is_some()
            || self.rent_psf.is_some()
    }
}

/// Property category. Matching order lives in `details`; narrower
/// categories are checked before the broad ones that would shadow them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Office,
    Medical,
    Industrial,
    Retail,
    #[serde(rename = "Mixed-Use")]
    MixedUse,
    Multifamily,
    Hospitality,
    #[serde(rename = "Self-Storage")]
    SelfStorage,
    #[serde(rename = "Net Lease")]
    NetLease,
    Land,
}

impl PropertyType {
    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Office => "Office",
            PropertyType::Medical => "Medical",
            PropertyType::Industrial => "Industrial",
            PropertyType::Retail => "Retail",
            PropertyType::MixedUse => "Mixed-Use",
            PropertyType::Multifamily => "Multifamily",
            PropertyType::Hospitality => "Hospitality",
            PropertyType::SelfStorage => "Self-Storage",
            PropertyType::NetLease => "Net Lease",
            PropertyType::Land => "Land",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_type: Option<PropertyType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_sf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_built: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asking_price: Option<f64>,
}

impl PropertyDetails {
    pub fn is_empty(&self) -> bool {
        self == &PropertyDetails::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_expenses: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupancy_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dscr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_sf: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asking_price: Option<f64>,
}

impl FinancialDetails {
    pub fn is_empty(&self) -> bool {
        self == &FinancialDetails::default()
    }
}

/// Underwriting defaults handed to downstream modeling. Only
/// `exit_cap_rate` is derived from extracted data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub exit_cap_rate: Option<f64>,
    pub noi_growth: f64,
    pub hold_period: u32,
    pub ltv: f64,
    pub interest_rate: f64,
    pub amortization_years: u32,
}

impl Default for Assumptions {
    fn default() -> Self {
        Self {
            exit_cap_rate: None,
            noi_growth: 3.0,
            hold_period: 5,
            ltv: 65.0,
            interest_rate: 5.75,
            amortization_years: 25,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedData {
    pub property: PropertyDetails,
    pub financials: FinancialDetails,
    pub rent_roll: Vec<RentRollEntry>,
    pub assumptions: Assumptions,
    pub raw_text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub quality_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseOutcome {
    pub parsed_data: ParsedData,
    pub parsing_report: ParsingReport,
}

/// A single cell of a rectangular grid, from a workbook sheet or a table
/// reconstructed out of document text. Native workbook dates arrive
/// already formatted as ISO `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(String),
}

impl CellValue {
    pub fn from_text(raw: &str) -> CellValue {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// The cell rendered the way a header/value string comparison wants
    /// it: trimmed, and numbers without a trailing `.0`.
    pub fn display(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(text) => text.trim().to_string(),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 1e15 {
                    format!("{}", *value as i64)
                } else {
                    format!("{value}")
                }
            }
            CellValue::Date(iso) => iso.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_field_keys_follow_declaration_order() {
        let keys: Vec<&str> = CanonicalField::ALL.iter().map(|f| f.key()).collect();
        assert_eq!(
            keys,
            vec![
                "unit",
                "tenant",
                "sf",
                "annual_rent",
                "monthly_rent",
                "rent_psf",
                "lease_start",
                "lease_end",
                "lease_type",
                "status",
            ]
        );
    }

    #[test]
    fn entry_invariant_helpers() {
        let mut entry = RentRollEntry::default();
        assert!(!entry.has_identifier());
        assert!(!entry.has_numeric());

        entry.set_text(CanonicalField::Tenant, "Acme Co".to_string());
        entry.set_number(CanonicalField::Sf, 1200.0);
        assert!(entry.has_identifier());
        assert!(entry.has_numeric());
        assert_eq!(entry.tenant.as_deref(), Some("Acme Co"));
        assert_eq!(entry.sf, Some(1200.0));
    }

    #[test]
    fn number_cells_display_without_trailing_zero() {
        assert_eq!(CellValue::Number(101.0).display(), "101");
        assert_eq!(CellValue::Number(24.5).display(), "24.5");
        assert_eq!(CellValue::Text("  Acme  ".to_string()).display(), "Acme");
        assert_eq!(CellValue::Empty.display(), "");
    }

    #[test]
    fn assumptions_defaults_match_underwriting_baseline() {
        let assumptions = Assumptions::default();
        assert_eq!(assumptions.exit_cap_rate, None);
        assert_eq!(assumptions.noi_growth, 3.0);
        assert_eq!(assumptions.hold_period, 5);
        assert_eq!(assumptions.ltv, 65.0);
        assert_eq!(assumptions.interest_rate, 5.75);
        assert_eq!(assumptions.amortization_years, 25);
    }

    #[test]
    fn property_type_serializes_to_display_label() {
        let json = serde_json::to_string(&PropertyType::MixedUse).unwrap();
        assert_eq!(json, "\"Mixed-Use\"");
        assert_eq!(PropertyType::NetLease.to_string(), "Net Lease");
    }
}
