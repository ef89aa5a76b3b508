//! Income figures from tax slips and pay stubs

use super::{extract_amount_after, Extraction, Field};
use crate::document::ExtractedDocument;

/// T4 box 14: employment income
pub const T4_EMPLOYMENT_INCOME_BOX: &str = "14";

/// Notice of Assessment line 15000: total income
pub const NOA_TOTAL_INCOME_LINE: &str = "15000";

/// Pay stub year-to-date column marker
pub const PAYSTUB_YTD_MARKER: &str = "YTD";

/// Employment income from a T4 slip
pub fn extract_t4_income(document: &ExtractedDocument) -> Extraction<f64> {
    extract_amount_after(document, Field::AnnualIncome, T4_EMPLOYMENT_INCOME_BOX)
}

/// Total income from a Notice of Assessment
pub fn extract_noa_total_income(document: &ExtractedDocument) -> Extraction<f64> {
    extract_amount_after(document, Field::NoaTotalIncome, NOA_TOTAL_INCOME_LINE)
}

/// Year-to-date gross from a pay stub
pub fn extract_paystub_ytd(document: &ExtractedDocument) -> Extraction<f64> {
    extract_amount_after(document, Field::YtdIncome, PAYSTUB_YTD_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_t4_box_14() {
        let doc = ExtractedDocument::from_text(
            "Statement of Remuneration Paid\nBox 10 Province ON\n14  1,200.50\n22  300.00",
        );
        assert_eq!(extract_t4_income(&doc).value(), Some(&1200.50));
    }

    #[test]
    fn test_noa_line_15000() {
        let doc = ExtractedDocument::from_text(
            "Notice of Assessment 2023\nLine 15000 Total income $75,000.00\nLine 26000 Taxable income $70,000.00",
        );
        assert_eq!(extract_noa_total_income(&doc).value(), Some(&75000.0));
    }

    #[test]
    fn test_paystub_ytd() {
        let doc = ExtractedDocument::from_text("Gross Pay 2,500.00\nYTD Gross $32,500.00");
        assert_eq!(extract_paystub_ytd(&doc).value(), Some(&32500.0));
    }

    #[test]
    fn test_missing_income_lines() {
        let doc = ExtractedDocument::from_text("Letter of Employment\nTo whom it may concern");
        assert!(matches!(
            extract_t4_income(&doc),
            Extraction::Absent {
                field: Field::AnnualIncome
            }
        ));
        assert!(matches!(
            extract_noa_total_income(&doc),
            Extraction::Absent { .. }
        ));
    }
}
