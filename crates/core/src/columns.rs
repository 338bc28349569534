use crate::models::CanonicalField;
use strsim::normalized_levenshtein;

/// Substring hits must clear this share of the longer string.
const CONTAINMENT_FLOOR: f64 = 0.4;
/// Edit-distance similarity must clear this ratio.
const SIMILARITY_FLOOR: f64 = 0.7;
/// Penalty applied to short headers that are ambiguous on their own.
const AMBIGUOUS_PENALTY: f64 = 0.3;

/// Short headers that should not win a containment match on their own;
/// a bare "Rent" column is as likely monthly as annual.
const AMBIGUOUS_HEADERS: [&str; 8] = [
    "rent", "income", "type", "class", "start", "from", "to", "lease",
];

/// Known header spellings per canonical field, all lowercase. Ordered by
/// how often they show up in offering-memorandum rent rolls.
pub fn aliases(field: CanonicalField) -> &'static [&'static str] {
    match field {
        CanonicalField::Unit => &[
            "unit", "suite", "space", "unit #", "unit no", "suite #", "suite no",
            "space #", "space no", "unit number", "suite number", "bldg", "building",
            "unit/suite", "ste", "spc", "bay", "pad", "shop", "store", "floor",
        ],
        CanonicalField::Tenant => &[
            "tenant", "tenant name", "occupant", "lessee", "company", "name",
            "business", "client", "renter", "entity", "leaseholder", "party",
            "tenant/occupant", "current tenant", "tenant name/dba",
        ],
        CanonicalField::Sf => &[
            "sf", "sq ft", "sqft", "square feet", "square footage", "area",
            "rsf", "rentable sf", "usable sf", "nra", "gla", "size",
            "rentable area", "net rentable", "leased sf", "occupied sf",
            "total sf", "approx sf", "approx. sf", "leasable area",
            "actual sq ft", "lease sq ft", "useable sq ft",
        ],
        CanonicalField::AnnualRent => &[
            "annual rent", "annual base rent", "base rent", "yearly rent",
            "annual", "total rent", "contract rent", "scheduled rent",
            "annual base", "ann rent", "ann. rent", "rent/yr", "rent/year",
            "annual income", "gross rent", "year rent", "current year rent",
        ],
        CanonicalField::MonthlyRent => &[
            "monthly rent", "monthly base", "rent/mo", "rent/month",
            "mo rent", "mo. rent", "monthly", "mthly rent", "month rent",
            "current monthly rent", "total monthly income",
        ],
        CanonicalField::RentPsf => &[
            "rent psf", "psf", "$/sf", "rent/sf", "rate", "rate/sf",
            "per sf", "per sq ft", "rent per sf", "base rate", "nnn rate",
            "contract rate", "asking rate", "effective rate", "price/sf",
            "rent per sq ft", "current rent per sq ft", "total psf",
        ],
        CanonicalField::LeaseStart => &[
            "lease start", "start date", "commencement", "commence date",
            "move in", "lease commencement", "begin", "begin date",
            "effective date", "lease from", "occ date",
            "original lease start date", "lease start date",
        ],
        CanonicalField::LeaseEnd => &[
            "lease end", "end date", "expiration", "expiry", "expire",
            "expiry date", "expiration date", "lease expiration", "term end",
            "lease to", "lease thru", "maturity", "termination",
            "lease expir date", "lease expiration date",
        ],
        CanonicalField::LeaseType => &[
            "lease type", "lease class", "structure",
            "nnn", "gross", "modified gross", "full service",
        ],
        CanonicalField::Status => &[
            "status", "occupied", "occupancy", "vacancy", "vacant",
            "occ status", "lease status", "current status",
        ],
    }
}

/// Lowercase, trim, and strip everything but alphanumerics, whitespace,
/// `/`, `$`, `#`.
pub fn normalize_header(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '/' | '$' | '#' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Map a raw header string (possibly several physical rows concatenated)
/// to a canonical rent-roll field.
///
/// Exact alias hits win outright. Otherwise the best containment or
/// edit-distance score above its floor wins, with ties going to the field
/// declared first in [`CanonicalField::ALL`].
pub fn match_column(raw: &str) -> Option<CanonicalField> {
    let header = normalize_header(raw);
    let header_len = header.chars().count();
    if header_len < 2 {
        return None;
    }

    for field in CanonicalField::ALL {
        if aliases(field).iter().any(|alias| *alias == header) {
            return Some(field);
        }
    }

    let ambiguous = header_len <= 4 && AMBIGUOUS_HEADERS.contains(&header.as_str());
    let mut best: Option<CanonicalField> = None;
    let mut best_score = 0.0f64;

    for field in CanonicalField::ALL {
        for alias in aliases(field) {
            if header_len > 3 && (header.contains(alias) || alias.contains(&header)) {
                let alias_len = alias.chars().count();
                let mut score = alias_len as f64 / header_len.max(alias_len) as f64;
                if ambiguous {
                    score *= AMBIGUOUS_PENALTY;
                }
                if score > CONTAINMENT_FLOOR && score > best_score {
                    best_score = score;
                    best = Some(field);
                }
            }

            let ratio = normalized_levenshtein(&header, alias);
            if ratio > SIMILARITY_FLOOR && ratio > best_score {
                best_score = ratio;
                best = Some(field);
            }
        }
    }

    best
}
