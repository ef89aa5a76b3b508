//! Credit bureau report scanning: Beacon score and trade lines

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{contains_any, first_match, Extraction, Field};
use crate::amount::{numeric_tokens, parse_amount};
use crate::document::ExtractedDocument;

/// Trade-line keywords (matched case-insensitively)
pub const LIABILITY_KEYWORDS: &[&str] = &[
    "credit card",
    "loan",
    "line of credit",
    "auto",
    "student",
    "mortgage",
];

/// Marker for the bureau score line
pub const BEACON_MARKER: &str = "Beacon";

/// Valid Beacon score range (inclusive)
pub const BEACON_RANGE: std::ops::RangeInclusive<u16> = 300..=900;

/// A debt obligation read off a credit report line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Liability {
    /// First word of the line, e.g. "Auto", "Visa"
    pub kind: String,
    pub balance: f64,
    pub monthly_payment: f64,
}

/// Everything taken from one credit report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditReport {
    pub beacon_score: Extraction<u16>,
    pub liabilities: Vec<Liability>,
}

impl CreditReport {
    /// Sum of minimum monthly payments
    pub fn total_monthly_payments(&self) -> f64 {
        self.liabilities.iter().map(|l| l.monthly_payment).sum()
    }
}

/// Scan a credit report for its score and liabilities
pub fn extract_credit_report(document: &ExtractedDocument) -> CreditReport {
    CreditReport {
        beacon_score: extract_beacon_score(document),
        liabilities: extract_liabilities(document),
    }
}

/// First purely numeric token in [300, 900] on a line mentioning "Beacon"
pub fn extract_beacon_score(document: &ExtractedDocument) -> Extraction<u16> {
    first_match(
        document,
        Field::CreditScore,
        |line| line.contains(BEACON_MARKER),
        score_on_line,
    )
}

fn score_on_line(line: &str) -> Option<u16> {
    line.split_whitespace()
        .filter(|t| !t.is_empty() && t.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|t| t.parse::<u16>().ok())
        .find(|score| BEACON_RANGE.contains(score))
}

/// Every line that reads as a trade line
///
/// A line qualifies when it mentions one of [`LIABILITY_KEYWORDS`] and its
/// first two numeric-looking tokens both parse as amounts (balance, then
/// payment). Order follows the document.
pub fn extract_liabilities(document: &ExtractedDocument) -> Vec<Liability> {
    let liabilities: Vec<Liability> = document
        .lines()
        .filter(|line| contains_any(line.text, LIABILITY_KEYWORDS))
        .filter_map(|line| {
            let parsed = liability_on_line(line.text);
            if parsed.is_none() {
                trace!(page = line.page, line = line.line, "trade line skipped");
            }
            parsed
        })
        .collect();

    debug!(count = liabilities.len(), "liabilities extracted");
    liabilities
}

fn liability_on_line(line: &str) -> Option<Liability> {
    let kind = line.split_whitespace().next()?.to_string();

    let mut amounts = numeric_tokens(line);
    let balance = parse_amount(amounts.next()?).ok()?;
    let monthly_payment = parse_amount(amounts.next()?).ok()?;

    Some(Liability {
        kind,
        balance,
        monthly_payment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn doc(text: &str) -> ExtractedDocument {
        ExtractedDocument::from_text(text)
    }

    #[test]
    fn test_auto_loan_line() {
        let liabilities = extract_liabilities(&doc("Auto Loan $12,000 $350"));
        assert_eq!(
            liabilities,
            vec![Liability {
                kind: "Auto".to_string(),
                balance: 12000.0,
                monthly_payment: 350.0,
            }]
        );
    }

    #[test]
    fn test_single_numeric_token_yields_nothing() {
        assert!(extract_liabilities(&doc("Student Loan $8,000")).is_empty());
    }

    #[test]
    fn test_unparseable_amounts_yield_nothing() {
        assert!(extract_liabilities(&doc("Credit Card 12/2019 $50")).is_empty());
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let report = extract_credit_report(&doc(
            "TRADE LINES\nVISA CREDIT CARD 2,400.00 75.00\nRBC Line of Credit 10,000 200\nEmployer: ACME",
        ));
        let kinds: Vec<&str> = report.liabilities.iter().map(|l| l.kind.as_str()).collect();
        assert_eq!(kinds, vec!["VISA", "RBC"]);
        assert_eq!(report.total_monthly_payments(), 275.0);
    }

    #[test]
    fn test_beacon_score() {
        let d = doc("Equifax Report\nBeacon Score: 742 (as of 2024)\n");
        assert_eq!(extract_beacon_score(&d).value(), Some(&742));
    }

    #[test]
    fn test_beacon_score_ignores_out_of_range_tokens() {
        // 2024 is numeric but out of range; 715 wins
        let d = doc("Beacon 2024 715");
        assert_eq!(extract_beacon_score(&d).value(), Some(&715));
    }

    #[test]
    fn test_beacon_score_token_must_be_purely_numeric() {
        let d = doc("Beacon: 742:\nBeacon 680");
        let result = extract_beacon_score(&d);
        assert_eq!(result.value(), Some(&680));
    }

    #[test]
    fn test_beacon_line_without_score_is_unparseable() {
        let d = doc("Beacon score unavailable");
        assert_eq!(
            extract_beacon_score(&d),
            Extraction::Unparseable {
                field: Field::CreditScore,
                candidates: 1
            }
        );
    }

    #[test]
    fn test_no_beacon_line_is_absent() {
        let d = doc("TransUnion report\nScore 720");
        assert_eq!(
            extract_beacon_score(&d),
            Extraction::Absent {
                field: Field::CreditScore
            }
        );
    }

    proptest! {
        #[test]
        fn beacon_score_always_in_range(text in "Beacon( [0-9]{1,4}){0,4}") {
            if let Some(score) = extract_beacon_score(&doc(&text)).value() {
                prop_assert!(BEACON_RANGE.contains(score));
            }
        }

        #[test]
        fn liabilities_have_finite_amounts(
            balance in 0u32..1_000_000,
            payment in 0u32..10_000,
        ) {
            let line = format!("Mortgage ${} ${}", balance, payment);
            let liabilities = extract_liabilities(&doc(&line));
            prop_assert_eq!(liabilities.len(), 1);
            prop_assert_eq!(liabilities[0].balance, balance as f64);
            prop_assert_eq!(liabilities[0].monthly_payment, payment as f64);
        }
    }
}
