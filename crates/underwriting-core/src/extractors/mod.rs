//! Keyword line-scanning extractors
//!
//! Every extractor follows the same policy:
//!
//! 1. Walk the document's lines in order.
//! 2. A line qualifies when it contains the keyword.
//! 3. The first qualifying line that yields a value wins. Later lines are
//!    never looked at, even if they would give a "better" value.
//! 4. A qualifying line that does not parse is skipped and counted.
//!
//! Income keywords are a plain substring test. Keyword `"14"` therefore also
//! matches `"2014"`; callers see whatever the first parseable line produced.
//! Lease rent keywords are whole words so `"rental"` never counts as `"rent"`.

pub mod credit;
pub mod income;
pub mod lease;

pub use credit::{extract_beacon_score, extract_credit_report, extract_liabilities, CreditReport, Liability};
pub use income::{extract_noa_total_income, extract_paystub_ytd, extract_t4_income};
pub use lease::{extract_lease_rent, LeaseRent, RentPeriod};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::amount::{numeric_tokens, parse_amount};
use crate::document::ExtractedDocument;

/// The form field an extracted value feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// T4 box 14, employment income
    AnnualIncome,
    /// Notice of Assessment line 15000
    NoaTotalIncome,
    /// Pay stub year-to-date gross
    YtdIncome,
    MonthlyRent,
    CreditScore,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Field::AnnualIncome => "annual income",
            Field::NoaTotalIncome => "NOA total income",
            Field::YtdIncome => "year-to-date income",
            Field::MonthlyRent => "monthly rent",
            Field::CreditScore => "credit score",
        }
    }
}

/// A value read from a document, tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extracted<T> {
    pub field: Field,
    pub value: T,
    /// Page number (1-indexed)
    pub page: usize,
    /// Line number within the page (1-indexed)
    pub line: usize,
}

/// Outcome of one extraction rule over one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Extraction<T> {
    /// The first qualifying line produced a value
    Found(Extracted<T>),
    /// The keyword appeared on `candidates` lines, none of which parsed
    Unparseable { field: Field, candidates: usize },
    /// No line contained the keyword
    Absent { field: Field },
}

impl<T> Extraction<T> {
    /// Collapse to the value, dropping the reason for absence
    pub fn value(&self) -> Option<&T> {
        match self {
            Extraction::Found(found) => Some(&found.value),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Extraction::Found(found) => Some(found.value),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extraction::Found(_))
    }

    pub fn field(&self) -> Field {
        match self {
            Extraction::Found(found) => found.field,
            Extraction::Unparseable { field, .. } | Extraction::Absent { field } => *field,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Extraction<U> {
        match self {
            Extraction::Found(found) => Extraction::Found(Extracted {
                field: found.field,
                value: f(found.value),
                page: found.page,
                line: found.line,
            }),
            Extraction::Unparseable { field, candidates } => {
                Extraction::Unparseable { field, candidates }
            }
            Extraction::Absent { field } => Extraction::Absent { field },
        }
    }

    /// Keep `self` if it found something, otherwise try `other`
    pub fn or_else(self, other: impl FnOnce() -> Extraction<T>) -> Extraction<T> {
        if self.is_found() {
            self
        } else {
            other()
        }
    }
}

/// Core scanning loop shared by the extractors
///
/// `matches` decides whether a line qualifies; `read` turns a qualifying
/// line into a value, or `None` to skip it.
pub(crate) fn first_match<T>(
    document: &ExtractedDocument,
    field: Field,
    matches: impl Fn(&str) -> bool,
    read: impl Fn(&str) -> Option<T>,
) -> Extraction<T> {
    let mut candidates = 0;

    for line in document.lines() {
        if !matches(line.text) {
            continue;
        }
        candidates += 1;

        match read(line.text) {
            Some(value) => {
                debug!(
                    field = field.label(),
                    page = line.page,
                    line = line.line,
                    skipped = candidates - 1,
                    "extracted value"
                );
                return Extraction::Found(Extracted {
                    field,
                    value,
                    page: line.page,
                    line: line.line,
                });
            }
            None => {
                trace!(
                    field = field.label(),
                    page = line.page,
                    line = line.line,
                    "keyword matched but no value, skipping line"
                );
            }
        }
    }

    if candidates == 0 {
        debug!(field = field.label(), "keyword not found");
        Extraction::Absent { field }
    } else {
        debug!(field = field.label(), candidates, "keyword found but unparseable");
        Extraction::Unparseable { field, candidates }
    }
}

/// Amount following the first occurrence of a literal keyword
///
/// The first numeric-looking token after the keyword is the candidate; if it
/// fails to parse the line is skipped.
pub fn extract_amount_after(
    document: &ExtractedDocument,
    field: Field,
    keyword: &str,
) -> Extraction<f64> {
    first_match(
        document,
        field,
        |line| line.contains(keyword),
        |line| amount_after(line, keyword),
    )
}

/// Parse the first numeric-looking token after `keyword` in `line`
pub(crate) fn amount_after(line: &str, keyword: &str) -> Option<f64> {
    let pos = line.find(keyword)?;
    first_amount(&line[pos + keyword.len()..])
}

/// Parse the first numeric-looking token in `text`
pub(crate) fn first_amount(text: &str) -> Option<f64> {
    let token = numeric_tokens(text).next()?;

    match parse_amount(token) {
        Ok(value) => Some(value),
        Err(e) => {
            trace!(token, error = %e, "amount token rejected");
            None
        }
    }
}

/// Case-insensitive test against a keyword list
pub(crate) fn contains_any(line: &str, keywords: &[&str]) -> bool {
    let lower = line.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(text: &str) -> ExtractedDocument {
        ExtractedDocument::from_text(text)
    }

    #[test]
    fn test_amount_after_keyword() {
        let d = doc("Employer: ACME\n14  1,200.50\n");
        let result = extract_amount_after(&d, Field::AnnualIncome, "14");

        assert_eq!(
            result,
            Extraction::Found(Extracted {
                field: Field::AnnualIncome,
                value: 1200.50,
                page: 1,
                line: 2,
            })
        );
    }

    #[test]
    fn test_absent_keyword_is_absent_not_error() {
        let d = doc("nothing to see here\n");
        let result = extract_amount_after(&d, Field::NoaTotalIncome, "15000");
        assert_eq!(result, Extraction::Absent { field: Field::NoaTotalIncome });
        assert_eq!(result.value(), None);
    }

    #[test]
    fn test_empty_document_is_absent() {
        let d = ExtractedDocument::default();
        assert!(matches!(
            extract_amount_after(&d, Field::YtdIncome, "YTD"),
            Extraction::Absent { .. }
        ));
    }

    #[test]
    fn test_unparseable_lines_are_skipped() {
        let d = doc("YTD totals follow\nYTD 1.2.3\nYTD $45,000.00\n");
        let result = extract_amount_after(&d, Field::YtdIncome, "YTD");
        assert_eq!(result.value(), Some(&45000.0));
        if let Extraction::Found(found) = result {
            assert_eq!(found.line, 3);
        }
    }

    #[test]
    fn test_only_unparseable_lines_reports_candidates() {
        let d = doc("YTD n/a\nYTD 1.2.3\n");
        assert_eq!(
            extract_amount_after(&d, Field::YtdIncome, "YTD"),
            Extraction::Unparseable {
                field: Field::YtdIncome,
                candidates: 2
            }
        );
    }

    #[test]
    fn test_first_match_wins_across_pages() {
        let d = doc("14 100.00\x0C14 200.00");
        let result = extract_amount_after(&d, Field::AnnualIncome, "14");
        assert_eq!(result.value(), Some(&100.0));
    }

    #[test]
    fn test_substring_keyword_matches_inside_numbers() {
        // "2014" contains "14": the heuristic takes the first parseable line
        let d = doc("Tax year 2014 5,000.00\n14 60,000.00");
        let result = extract_amount_after(&d, Field::AnnualIncome, "14");
        assert_eq!(result.value(), Some(&5000.0));
    }

    #[test]
    fn test_amount_must_follow_keyword() {
        assert_eq!(amount_after("1,000 YTD", "YTD"), None);
        assert_eq!(amount_after("YTD: $1,000", "YTD"), Some(1000.0));
    }

    #[test]
    fn test_or_else_prefers_found() {
        let found: Extraction<f64> = Extraction::Found(Extracted {
            field: Field::AnnualIncome,
            value: 1.0,
            page: 1,
            line: 1,
        });
        let fallback = || Extraction::Absent { field: Field::YtdIncome };
        assert_eq!(found.clone().or_else(fallback).value(), Some(&1.0));

        let absent: Extraction<f64> = Extraction::Absent { field: Field::AnnualIncome };
        assert_eq!(absent.or_else(fallback).field(), Field::YtdIncome);
    }
}
