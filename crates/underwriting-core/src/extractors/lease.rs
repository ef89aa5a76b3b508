//! Rent from a lease agreement

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{first_amount, first_match, Extraction, Field};
use crate::document::ExtractedDocument;

lazy_static! {
    /// `monthly rent` or `rent` as whole words, most specific first
    static ref RENT_KEYWORD: Regex = Regex::new(r"(?i)\b(?:monthly\s+rent|rent)\b").unwrap();
}

const YEARLY_MARKERS: &[&str] = &["annual", "per year", "/year", "yearly", "per annum"];

/// How often the lease states rent is paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentPeriod {
    Monthly,
    Yearly,
}

/// Rent read from a lease, normalised to a monthly figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaseRent {
    pub monthly_rent: Extraction<f64>,
    /// Period the matched line was written in; `None` when nothing matched
    pub stated_period: Option<RentPeriod>,
}

/// Monthly rent from the first rent line that carries an amount
///
/// Lines stating a yearly figure are divided by 12.
pub fn extract_lease_rent(document: &ExtractedDocument) -> LeaseRent {
    let found = first_match(
        document,
        Field::MonthlyRent,
        |line| RENT_KEYWORD.is_match(line),
        |line| {
            let keyword = RENT_KEYWORD.find(line)?;
            let amount = first_amount(&line[keyword.end()..])?;
            let lower = line.to_lowercase();
            let period = if YEARLY_MARKERS.iter().any(|m| lower.contains(m)) {
                RentPeriod::Yearly
            } else {
                RentPeriod::Monthly
            };
            Some((amount, period))
        },
    );

    let stated_period = found.value().map(|(_, period)| *period);
    let monthly_rent = found.map(|(amount, period)| match period {
        RentPeriod::Monthly => amount,
        RentPeriod::Yearly => amount / 12.0,
    });

    LeaseRent {
        monthly_rent,
        stated_period,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_monthly_rent() {
        let doc = ExtractedDocument::from_text(
            "RESIDENTIAL TENANCY AGREEMENT\nMonthly Rent: $2,150.00 due on the 1st",
        );
        let rent = extract_lease_rent(&doc);
        assert_eq!(rent.monthly_rent.value(), Some(&2150.0));
        assert_eq!(rent.stated_period, Some(RentPeriod::Monthly));
    }

    #[test]
    fn test_yearly_rent_is_divided() {
        let doc = ExtractedDocument::from_text("Annual rent of $24,000 payable in installments");
        let rent = extract_lease_rent(&doc);
        assert_eq!(rent.monthly_rent.value(), Some(&2000.0));
        assert_eq!(rent.stated_period, Some(RentPeriod::Yearly));
    }

    #[test]
    fn test_rent_line_without_amount_is_skipped() {
        let doc = ExtractedDocument::from_text("Rent is due monthly\nRENT 1,800");
        assert_eq!(extract_lease_rent(&doc).monthly_rent.value(), Some(&1800.0));
    }

    #[test]
    fn test_rental_heading_is_not_a_rent_line() {
        let doc = ExtractedDocument::from_text(
            "Rental Agreement dated March 1, 2024\nMonthly Rent: $2,150.00",
        );
        let rent = extract_lease_rent(&doc);
        assert_eq!(rent.monthly_rent.value(), Some(&2150.0));
        match rent.monthly_rent {
            Extraction::Found(found) => assert_eq!(found.line, 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_rent_inside_other_words_is_ignored() {
        let doc = ExtractedDocument::from_text(
            "Tenant current address: 42 King St\nParent company rented unit 7\nMonthly Rent: $2,150.00",
        );
        assert_eq!(extract_lease_rent(&doc).monthly_rent.value(), Some(&2150.0));
    }

    #[test]
    fn test_no_rent_line() {
        let doc = ExtractedDocument::from_text("Pet policy: no cats");
        let rent = extract_lease_rent(&doc);
        assert!(matches!(rent.monthly_rent, Extraction::Absent { .. }));
        assert_eq!(rent.stated_period, None);
    }
}
