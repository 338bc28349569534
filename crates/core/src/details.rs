use crate::error::ParseError;
use crate::models::{FinancialDetails, PropertyDetails, PropertyType};
use regex::Regex;

/// Property-level facts live in the front matter; sponsor biographies and
/// market appendices further in are a reliable source of false positives.
const PROPERTY_WINDOW_CHARS: usize = 12_000;
/// Loan-amount fallback only trusts figures from the document front.
const LOAN_WINDOW_CHARS: usize = 10_000;
/// LTV assumed when backing a value out of a quoted loan amount.
const ASSUMED_LTV: f64 = 0.65;

const NAME_SKIP_WORDS: [&str; 6] = [
    "overview", "summary", "description", "details", "type", "address",
];

const PRICE_KEYWORDS: [&str; 8] = [
    "asking", "price", "list", "offering", "purchase", "acquisition", "sale", "value",
];

const PRICE_SKIP_KEYWORDS: [&str; 9] = [
    "revenue", "expense", "income", "tax", "fee", "cost", "budget", "loan", "debt",
];

/// Category keywords, narrowest first. A broad category late in the list
/// must not shadow a specific one earlier ("medical office building" is
/// still Office because the office keywords fire first).
const TYPE_KEYWORDS: [(PropertyType, &[&str]); 10] = [
    (
        PropertyType::Office,
        &[
            "office building",
            "office tower",
            "class a office",
            "class b office",
            "office",
            "office space",
            "professional office",
        ],
    ),
    (
        PropertyType::Medical,
        &["medical office building", "mob", "healthcare facility"],
    ),
    (
        PropertyType::Industrial,
        &[
            "industrial",
            "warehouse",
            "distribution center",
            "flex space",
            "manufacturing",
            "logistics",
        ],
    ),
    (
        PropertyType::Retail,
        &["retail", "shopping center", "strip center", "strip mall", "shopping mall"],
    ),
    (PropertyType::MixedUse, &["mixed-use", "mixed use"]),
    (
        PropertyType::Multifamily,
        &[
            "multifamily",
            "multi-family",
            "apartment complex",
            "garden style apartment",
        ],
    ),
    (PropertyType::Hospitality, &["hotel", "hospitality", "motel"]),
    (
        PropertyType::SelfStorage,
        &["self-storage", "self storage", "storage facility"],
    ),
    (
        PropertyType::NetLease,
        &["net lease", "single tenant net", "nnn lease"],
    ),
    (PropertyType::Land, &["development site", "vacant land"]),
];

/// First `limit` characters of `text`, never splitting a code point.
fn char_prefix(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse::<f64>().ok()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordered-cascade evaluator: the first pattern whose capture parses and
/// passes `accept` wins; a matching-but-rejected value falls through to
/// the next pattern, never to a later occurrence of the same pattern.
fn first_numeric<F>(text: &str, patterns: &[&str], accept: F) -> Result<Option<f64>, ParseError>
where
    F: Fn(f64) -> bool,
{
    for pattern in patterns {
        let re = Regex::new(pattern)?;
        if let Some(captures) = re.captures(text) {
            if let Some(value) = captures.get(1).and_then(|m| parse_number(m.as_str())) {
                if accept(value) {
                    return Ok(Some(value));
                }
            }
        }
    }
    Ok(None)
}

#[derive(Debug, Clone)]
struct DollarAmount {
    value: f64,
    context: String,
}

/// Every dollar figure in the text together with up to 60 characters of
/// leading same-line context, lowercased for keyword checks. M/MM/million
/// and B/billion multipliers are applied.
fn find_all_dollar_amounts(text: &str) -> Result<Vec<DollarAmount>, ParseError> {
    let scan = Regex::new(
        r"(?m)(?:^|\s)([^\n]{0,60}?\$[\d,]+(?:\.\d{2})?(?:\s*(?:M|MM|million|Million|B|billion))?)",
    )?;
    let figure = Regex::new(r"\$([\d,]+(?:\.\d{2})?)\s*(M|MM|million|Million|B|billion)?")?;

    let mut amounts = Vec::new();
    for capture in scan.captures_iter(text) {
        let context = capture[1].trim().to_string();
        let Some(parts) = figure.captures(&context) else {
            continue;
        };
        let Some(mut value) = parse_number(&parts[1]) else {
            continue;
        };

        match parts.get(2).map(|m| m.as_str().to_lowercase()) {
            Some(m) if m == "m" || m == "mm" || m == "million" => value *= 1_000_000.0,
            Some(b) if b == "b" || b == "billion" => value *= 1_000_000_000.0,
            _ => {}
        }

        amounts.push(DollarAmount {
            value,
            context: context.to_lowercase(),
        });
    }

    Ok(amounts)
}

fn extract_name(property_text: &str, full_text: &str) -> Result<Option<String>, ParseError> {
    let patterns = [
        // "Property Rialto Place Office Tower" style
        r"Property\s+([A-Z][A-Za-z\s&\-'\.]+(?:Tower|Center|Plaza|Building|Park|Complex|Place|Court))",
        // Explicit label
        r"(?:Property\s*Name|Subject\s*Property)[\s:]+([^\n]{3,60})",
    ];

    for pattern in patterns {
        let re = Regex::new(pattern)?;
        if let Some(captures) = re.captures(property_text) {
            let candidate = captures[1].trim().to_string();
            let lowered = candidate.to_lowercase();
            let plausible = candidate.chars().count() > 3
                && !candidate.starts_with('$')
                && !candidate.chars().next().is_some_and(|c| c.is_ascii_digit())
                && !NAME_SKIP_WORDS.iter().any(|word| lowered.contains(word));
            if plausible {
                return Ok(Some(char_prefix(&candidate, 60).to_string()));
            }
        }
    }

    // The first line of the document often carries the name.
    let first_line = full_text.lines().next().unwrap_or("").trim();
    if !first_line.is_empty() && first_line.contains('|') {
        let head = first_line.split('|').next().unwrap_or("").trim();
        return Ok(Some(char_prefix(head, 60).to_string()));
    }
    let line_len = first_line.chars().count();
    if line_len > 5 && line_len < 60 && !first_line.starts_with('$') {
        return Ok(Some(char_prefix(first_line, 60).to_string()));
    }

    Ok(None)
}

fn extract_address(property_text: &str) -> Result<Option<String>, ParseError> {
    let patterns = [
        r"(?i)(?:Property\s*Address|Site\s*Address|Located\s*at)[\s:,]+(\d{1,6}\s+[^\n]{5,80})",
        r"(?i)(\d{1,6}\s+[A-Z][A-Za-z\s\.]+(?:Street|St|Avenue|Ave|Boulevard|Blvd|Road|Rd|Drive|Dr|Lane|Ln|Way|Circle|Cir|Court|Ct|Place|Pl|Parkway|Pkwy|Highway|Hwy)(?:\s*,?\s*[A-Z][a-z]+(?:\s[A-Z][a-z]+)*\s*,?\s*[A-Z]{2}\s*\d{5})?)",
    ];
    let zip = Regex::new(r"\d{5}(?:-\d{4})?")?;
    let trailing_junk = Regex::new(r#"[\s("']+$"#)?;

    for pattern in patterns {
        let re = Regex::new(pattern)?;
        if let Some(captures) = re.captures(property_text) {
            let mut candidate = captures[1].trim().to_string();
            let lowered = candidate.to_lowercase();
            if matches!(lowered.as_str(), "overview" | "summary" | "description") {
                continue;
            }
            // Truncate immediately after a zip code; whatever follows is
            // page furniture.
            if let Some(found) = zip.find(&candidate) {
                candidate = candidate[..found.end()].trim().to_string();
            }
            candidate = trailing_junk.replace(&candidate, "").to_string();
            return Ok(Some(char_prefix(&candidate, 100).to_string()));
        }
    }

    Ok(None)
}

/// Property attributes from document text. Scans the front window only,
/// except for the year-built and asking-price sweeps which need the full
/// text.
pub fn extract_property_details(text: &str) -> Result<PropertyDetails, ParseError> {
    let property_text = char_prefix(text, PROPERTY_WINDOW_CHARS);
    let property_lower = property_text.to_lowercase();

    let mut details = PropertyDetails {
        name: extract_name(property_text, text)?,
        address: extract_address(property_text)?,
        ..PropertyDetails::default()
    };

    let csz = Regex::new(r"([A-Z][a-z]+(?:\s[A-Z][a-z]+)*),?\s+([A-Z]{2})\s+(\d{5}(?:-\d{4})?)")?;
    if let Some(captures) = csz.captures(property_text) {
        details.city = Some(captures[1].to_string());
        details.state = Some(captures[2].to_string());
        details.zip = Some(captures[3].to_string());
        if details.address.is_none() {
            details.address = Some(format!("{}, {} {}", &captures[1], &captures[2], &captures[3]));
        }
    }

    for (property_type, keywords) in TYPE_KEYWORDS {
        if keywords.iter().any(|keyword| property_lower.contains(keyword)) {
            details.property_type = Some(property_type);
            break;
        }
    }

    details.total_units = first_numeric(
        property_text,
        &[
            r"(?i)(?:Number of Units|Unit Count|Total Units)[\s:]*(\d+)",
            r"(?i)(\d+)\s*(?:units?|suites?|spaces?)\s",
        ],
        |value| value > 0.0,
    )?
    .map(|value| value as u32);

    details.total_sf = first_numeric(
        property_text,
        &[
            r"(?i)[±~+/\-]*\s*(\d{1,3}(?:,\d{3})+)\s*(?:rentable\s*)?(?:square\s*foot|square\s*feet|SF|RSF|sq\.?\s*ft\.?)",
            r"(?i)(?:Total|Building|Rentable|Leasable|Net Rentable|GLA|NRA|Gross)?\s*(?:Square\s*F(?:ee|oo)t(?:age)?|SF|Sq\.?\s*Ft\.?|RSF|GLA|NRA)[\s:]*[±~]?\s*(\d{1,3}(?:,\d{3})*(?:\.\d+)?)",
        ],
        |value| value > 500.0,
    )?;

    details.year_built = first_numeric(
        text,
        &[
            r"(?i)(?:Year\s*Built|Built|Constructed|Year of Construction)[\s:]+(\d{4})",
            r"(?i)(?:built|constructed)\s+(?:in\s+)?(\d{4})",
        ],
        |value| (1900.0..=2030.0).contains(&value),
    )?
    .map(|value| value as i32);

    details.asking_price = extract_asking_price(text)?;

    Ok(details)
}

fn extract_asking_price(text: &str) -> Result<Option<f64>, ParseError> {
    let amounts = find_all_dollar_amounts(text)?;

    for amount in &amounts {
        if PRICE_KEYWORDS.iter().any(|kw| amount.context.contains(kw))
            && amount.value > 100_000.0
        {
            return Ok(Some(amount.value));
        }
    }

    // Financing memos quote the loan instead of the price; back out an
    // implied value at the assumed LTV.
    let loan = Regex::new(r"(?i)(?:Loan\s*Amount|Financing)[\s:]*\$?([\d,]+)")?;
    if let Some(captures) = loan.captures(char_prefix(text, LOAN_WINDOW_CHARS)) {
        if let Some(amount) = parse_number(&captures[1]) {
            if amount > 1_000_000.0 {
                return Ok(Some((amount / ASSUMED_LTV).round()));
            }
        }
    }

    // Last resort: the largest unlabeled figure that is not obviously an
    // operating line item.
    let mut large: Vec<&DollarAmount> = amounts
        .iter()
        .filter(|amount| amount.value >= 1_000_000.0)
        .collect();
    large.sort_by(|a, b| b.value.total_cmp(&a.value));
    for amount in large {
        if !PRICE_SKIP_KEYWORDS.iter().any(|kw| amount.context.contains(kw)) {
            return Ok(Some(amount.value));
        }
    }

    Ok(None)
}

/// Financial metrics from the full document text.
pub fn extract_financial_details(text: &str) -> Result<FinancialDetails, ParseError> {
    let mut financials = FinancialDetails::default();

    financials.cap_rate = first_numeric(
        text,
        &[
            r"(?i)Cap(?:italization)?\s*Rate[\s:]*(\d+\.?\d*)\s*%",
            r"(?i)(\d+\.?\d*)\s*%\s*Cap(?:italization)?\s*Rate",
            r"(?i)Cap[\s:]*(\d+\.?\d*)\s*%",
            r"(?i)going[\s\-]in\s*(?:cap\s*)?(?:rate)?[\s:]*(\d+\.?\d*)\s*%",
        ],
        |value| value > 1.0 && value < 20.0,
    )?;

    financials.noi = first_numeric(
        text,
        &[
            r"(?i)(?:NOI|Net\s*Operating\s*Income)[\s:]*\$?([\d,]+(?:\.\d+)?)\s*(?:M|million)?",
            r"(?i)\$?([\d,]+(?:\.\d+)?)\s*(?:M|million)?\s*(?:NOI|Net\s*Operating\s*Income)",
        ],
        |value| value > 0.0,
    )?
    // Values below 1000 are a millions shorthand ("NOI: $2.5M").
    .map(|value| if value < 1000.0 { value * 1_000_000.0 } else { value });

    financials.annual_revenue = first_numeric(
        text,
        &[
            r"(?i)(?:Effective Gross Income|EGI)[\s:]*\$?([\d,]+(?:\.\d+)?)",
            r"(?i)(?:Annual|Gross|Total|Effective Gross)\s*(?:Revenue|Income|Rent|Rental Income)[\s:]*\$?([\d,]+(?:\.\d+)?)",
        ],
        |value| value > 10_000.0,
    )?;

    // Only the literal "Total Operating Expenses" counts; looser phrases
    // match unrelated expense mentions all over an OM.
    let opex = Regex::new(r"(?i)Total\s+Operating\s+Expenses?\s*\$?([\d,]+(?:\.\d+)?)")?;
    financials.operating_expenses = opex
        .captures_iter(text)
        .filter_map(|captures| parse_number(&captures[1]))
        .find(|value| *value > 50_000.0);

    let occupancy = first_numeric(
        text,
        &[
            r"(?i)(?:Physical\s*)?Occupancy[\s:]*(\d+\.?\d*)\s*%",
            r"(?i)(\d+\.?\d*)\s*%\s*(?:occupied|occupancy|leased)",
        ],
        |value| value > 0.0 && value <= 100.0,
    )?;
    if let Some(value) = occupancy {
        financials.occupancy_rate = Some(value);
        financials.vacancy_rate = Some(round2(100.0 - value));
    } else {
        let vacancy = first_numeric(
            text,
            &[r"(?i)Vacancy[\s:]*(\d+\.?\d*)\s*%"],
            |value| (0.0..=100.0).contains(&value),
        )?;
        if let Some(value) = vacancy {
            financials.vacancy_rate = Some(value);
            financials.occupancy_rate = Some(round2(100.0 - value));
        }
    }

    financials.dscr = first_numeric(
        text,
        &[r"(?i)(?:DSCR|Debt\s*Service\s*Coverage)[\s:]*(\d+\.?\d*)\s*x?"],
        |value| value > 0.5 && value < 5.0,
    )?;

    if financials.noi.is_none() {
        if let (Some(revenue), Some(expenses)) =
            (financials.annual_revenue, financials.operating_expenses)
        {
            financials.noi = Some(revenue - expenses);
        }
    }

    Ok(financials)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_rate_from_labeled_percentage() -> Result<(), ParseError> {
        let financials = extract_financial_details("Cap Rate: 5.25%")?;
        assert_eq!(financials.cap_rate, Some(5.25));
        Ok(())
    }

    #[test]
    fn cap_rate_cascade_falls_through_on_invalid_value() -> Result<(), ParseError> {
        let text = "Cap Rate: 45% is a typo; the going-in rate: 6.1% is right";
        let financials = extract_financial_details(text)?;
        assert_eq!(financials.cap_rate, Some(6.1));
        Ok(())
    }

    #[test]
    fn noi_millions_shorthand_is_scaled() -> Result<(), ParseError> {
        let financials = extract_financial_details("NOI: $2.5M on stabilization")?;
        assert_eq!(financials.noi, Some(2_500_000.0));

        let plain = extract_financial_details("Net Operating Income: $1,250,000")?;
        assert_eq!(plain.noi, Some(1_250_000.0));
        Ok(())
    }

    #[test]
    fn occupancy_and_vacancy_are_complements() -> Result<(), ParseError> {
        let occupied = extract_financial_details("Physical Occupancy: 93.5%")?;
        assert_eq!(occupied.occupancy_rate, Some(93.5));
        assert_eq!(occupied.vacancy_rate, Some(6.5));

        let vacant = extract_financial_details("Vacancy: 7%")?;
        assert_eq!(vacant.vacancy_rate, Some(7.0));
        assert_eq!(vacant.occupancy_rate, Some(93.0));
        Ok(())
    }

    #[test]
    fn operating_expenses_require_the_full_label() -> Result<(), ParseError> {
        let loose = extract_financial_details("Operating Expenses $900,000")?;
        assert_eq!(loose.operating_expenses, None);

        let strict = extract_financial_details("Total Operating Expenses $900,000")?;
        assert_eq!(strict.operating_expenses, Some(900_000.0));
        Ok(())
    }

    #[test]
    fn noi_derived_from_revenue_and_expenses() -> Result<(), ParseError> {
        let text = "Effective Gross Income: $3,400,000\nTotal Operating Expenses $1,100,000";
        let financials = extract_financial_details(text)?;
        assert_eq!(financials.annual_revenue, Some(3_400_000.0));
        assert_eq!(financials.operating_expenses, Some(1_100_000.0));
        assert_eq!(financials.noi, Some(2_300_000.0));
        Ok(())
    }

    #[test]
    fn dscr_within_sane_bounds() -> Result<(), ParseError> {
        let financials = extract_financial_details("DSCR: 1.35x")?;
        assert_eq!(financials.dscr, Some(1.35));

        let absurd = extract_financial_details("DSCR: 9.0x")?;
        assert_eq!(absurd.dscr, None);
        Ok(())
    }

    #[test]
    fn tiny_square_footage_fails_the_sanity_floor() -> Result<(), ParseError> {
        let details = extract_property_details("The kiosk offers 30 Square Feet of space")?;
        assert_eq!(details.total_sf, None);
        Ok(())
    }

    #[test]
    fn comma_grouped_square_footage_is_extracted() -> Result<(), ParseError> {
        let details = extract_property_details("totaling ±125,000 SF of rentable area")?;
        assert_eq!(details.total_sf, Some(125_000.0));
        Ok(())
    }

    #[test]
    fn year_built_requires_a_plausible_year() -> Result<(), ParseError> {
        let details = extract_property_details("Year Built: 1987")?;
        assert_eq!(details.year_built, Some(1987));

        let implausible = extract_property_details("Built in 1850, rebuilt often")?;
        assert_eq!(implausible.year_built, None);
        Ok(())
    }

    #[test]
    fn office_beats_retail_when_both_appear() -> Result<(), ParseError> {
        let text = "A retail corridor anchors this Class A office building.";
        let details = extract_property_details(text)?;
        assert_eq!(details.property_type, Some(PropertyType::Office));
        Ok(())
    }

    #[test]
    fn name_from_explicit_label() -> Result<(), ParseError> {
        let details =
            extract_property_details("Confidential OM\nProperty Name: Rialto Place Office Tower\n")?;
        assert_eq!(details.name.as_deref(), Some("Rialto Place Office Tower"));
        Ok(())
    }

    #[test]
    fn name_from_pipe_delimited_first_line() -> Result<(), ParseError> {
        let details = extract_property_details("100 Rialto Place | Melbourne, FL\nbody text")?;
        assert_eq!(details.name.as_deref(), Some("100 Rialto Place"));
        Ok(())
    }

    #[test]
    fn address_truncates_after_zip() -> Result<(), ParseError> {
        let text = "Located at: 100 Rialto Place, Melbourne, FL 32901 (the \"Property\")";
        let details = extract_property_details(text)?;
        assert_eq!(
            details.address.as_deref(),
            Some("100 Rialto Place, Melbourne, FL 32901")
        );
        assert_eq!(details.city.as_deref(), Some("Melbourne"));
        assert_eq!(details.state.as_deref(), Some("FL"));
        assert_eq!(details.zip.as_deref(), Some("32901"));
        Ok(())
    }

    #[test]
    fn city_state_zip_synthesizes_missing_address() -> Result<(), ParseError> {
        let details = extract_property_details("An asset in Melbourne, FL 32901 with upside")?;
        assert_eq!(details.address.as_deref(), Some("Melbourne, FL 32901"));
        Ok(())
    }

    #[test]
    fn asking_price_prefers_keyword_context() -> Result<(), ParseError> {
        let text = "Annual revenue of $3,400,000\nAsking Price: $12,500,000 firm";
        let details = extract_property_details(text)?;
        assert_eq!(details.asking_price, Some(12_500_000.0));
        Ok(())
    }

    #[test]
    fn asking_price_backed_out_of_loan_amount() -> Result<(), ParseError> {
        let details = extract_property_details("Loan Amount: $6,500,000 at closing")?;
        assert_eq!(details.asking_price, Some(10_000_000.0));
        Ok(())
    }

    #[test]
    fn asking_price_falls_back_to_largest_clean_amount() -> Result<(), ParseError> {
        let text = "Tax bill of $2,000,000 due\nThe portfolio totals $4,750,000 in hard assets";
        let details = extract_property_details(text)?;
        assert_eq!(details.asking_price, Some(4_750_000.0));
        Ok(())
    }

    #[test]
    fn million_suffix_multiplies_dollar_amounts() -> Result<(), ParseError> {
        let details = extract_property_details("Offering price of $12.50 MM for the fee interest")?;
        assert_eq!(details.asking_price, Some(12_500_000.0));
        Ok(())
    }
}
