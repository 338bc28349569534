use crate::models::ParsedData;

/// Weighted completeness score over the merged result, 0-100. Asking
/// price counts wherever it landed; everything else is checked on its
/// home section.
pub fn quality_score(data: &ParsedData) -> f64 {
    let checks: [(bool, f64); 10] = [
        (data.property.name.is_some(), 10.0),
        (data.property.property_type.is_some(), 5.0),
        (data.property.address.is_some(), 10.0),
        (data.property.total_sf.is_some(), 10.0),
        (
            data.property.asking_price.is_some() || data.financials.asking_price.is_some(),
            15.0,
        ),
        (data.financials.noi.is_some(), 15.0),
        (data.financials.cap_rate.is_some(), 10.0),
        (!data.rent_roll.is_empty(), 15.0),
        (data.financials.occupancy_rate.is_some(), 5.0),
        (data.financials.annual_revenue.is_some(), 5.0),
    ];

    let score: f64 = checks
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, weight)| weight)
        .sum();
    score.min(100.0)
}
