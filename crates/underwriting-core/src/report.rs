//! Underwriting summary PDF
//!
//! [`TextPdfWriter`] lays plain lines of text onto Letter pages using the
//! built-in Helvetica fonts. Every line is its own `BT`/`ET` block so text
//! extraction gives one line back per line written.

use chrono::{Local, NaiveDate};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use thiserror::Error;
use tracing::debug;

use crate::application::{DocumentStatus, IncomeSource, Occupancy, UnderwritingSummary};
use crate::config::BrokerProfile;
use crate::extractors::RentPeriod;
use crate::format::{money, money_or_na, percent_or_na, text_or_na, NOT_AVAILABLE};

/// Download name for the generated report
pub const REPORT_FILENAME: &str = "MortgageMate_Filogix_Application.pdf";

pub const REPORT_TITLE: &str = "Mortgage Application Summary";

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: f32 = 72.0;
/// Helvetica-Bold glyph width as a share of the font size, on average
const AVERAGE_GLYPH_WIDTH: f32 = 0.56;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReportError {
    #[error("failed to encode page content: {0}")]
    Encode(String),

    #[error("failed to save PDF: {0}")]
    Save(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineStyle {
    Title,
    Heading,
    Body,
    Blank,
}

impl LineStyle {
    fn font(&self) -> &'static [u8] {
        match self {
            LineStyle::Title | LineStyle::Heading => b"F2",
            LineStyle::Body | LineStyle::Blank => b"F1",
        }
    }

    fn size(&self) -> f32 {
        match self {
            LineStyle::Title => 18.0,
            LineStyle::Heading => 13.0,
            LineStyle::Body | LineStyle::Blank => 11.0,
        }
    }

    /// Left edge of the line; titles are centred on an estimated width
    fn x(&self, text: &str) -> f32 {
        match self {
            LineStyle::Title => {
                let width = text.chars().count() as f32 * self.size() * AVERAGE_GLYPH_WIDTH;
                ((PAGE_WIDTH as f32 - width) / 2.0).max(MARGIN)
            }
            _ => MARGIN,
        }
    }

    /// Characters that fit between the margins at the estimated glyph width
    fn max_chars(&self) -> usize {
        let usable = PAGE_WIDTH as f32 - 2.0 * MARGIN;
        ((usable / (self.size() * AVERAGE_GLYPH_WIDTH)) as usize).max(1)
    }

    /// Vertical space the line takes
    fn leading(&self) -> f32 {
        match self {
            LineStyle::Title => 28.0,
            LineStyle::Heading => 22.0,
            LineStyle::Body => 15.0,
            LineStyle::Blank => 8.0,
        }
    }
}

/// Minimal text-only PDF builder
#[derive(Debug, Clone, Default)]
pub struct TextPdfWriter {
    lines: Vec<(LineStyle, String)>,
}

impl TextPdfWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.lines.push((LineStyle::Title, text.into()));
        self
    }

    pub fn heading(mut self, text: impl Into<String>) -> Self {
        self.lines.push((LineStyle::Heading, text.into()));
        self
    }

    pub fn line(mut self, text: impl Into<String>) -> Self {
        self.lines.push((LineStyle::Body, text.into()));
        self
    }

    /// Vertical gap, no text
    pub fn blank(mut self) -> Self {
        self.lines.push((LineStyle::Blank, String::new()));
        self
    }

    /// Serialize to PDF bytes
    ///
    /// Always produces at least one page, even with no lines.
    pub fn finish(self) -> Result<Vec<u8>, ReportError> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular,
                "F2" => bold,
            },
        });

        let mut page_ids: Vec<ObjectId> = Vec::new();
        for operations in self.layout() {
            let content = Content { operations }
                .encode()
                .map_err(|e| ReportError::Encode(e.to_string()))?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
                "Resources" => resources_id,
                "Contents" => content_id,
            });
            page_ids.push(page_id);
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => Object::Integer(page_ids.len() as i64),
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)
            .map_err(|e| ReportError::Save(e.to_string()))?;

        debug!(pages = page_ids.len(), bytes = buffer.len(), "report written");
        Ok(buffer)
    }

    /// Wrap lines at the right margin and split them across pages, one
    /// operation list per page
    fn layout(&self) -> Vec<Vec<Operation>> {
        let top = PAGE_HEIGHT as f32 - MARGIN;
        let mut pages = vec![Vec::new()];
        let mut y = top;

        let rows = self.lines.iter().flat_map(|(style, text)| {
            let pieces = if *style == LineStyle::Blank || text.is_empty() {
                vec![String::new()]
            } else {
                wrap(text, style.max_chars())
            };
            pieces.into_iter().map(move |piece| (*style, piece))
        });

        for (style, text) in rows {
            if y - style.leading() < MARGIN {
                pages.push(Vec::new());
                y = top;
            }
            y -= style.leading();

            if style == LineStyle::Blank || text.is_empty() {
                continue;
            }

            // Infallible: `pages` starts non-empty and only grows
            if let Some(ops) = pages.last_mut() {
                ops.extend([
                    Operation::new("BT", vec![]),
                    Operation::new(
                        "Tf",
                        vec![Object::Name(style.font().to_vec()), Object::Real(style.size())],
                    ),
                    Operation::new("Td", vec![Object::Real(style.x(&text)), Object::Real(y)]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(win_ansi_bytes(&text), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ]);
            }
        }

        pages
    }
}

/// Break `text` at whitespace into rows of at most `max_chars`
///
/// Text that already fits is returned untouched. A word longer than a row is
/// split across rows.
fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut rows = Vec::new();
    let mut row = String::new();
    let mut row_len = 0;
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for chunk in chars.chunks(max_chars) {
            if row_len > 0 && row_len + 1 + chunk.len() > max_chars {
                rows.push(std::mem::take(&mut row));
                row_len = 0;
            }
            if row_len > 0 {
                row.push(' ');
                row_len += 1;
            }
            row.extend(chunk);
            row_len += chunk.len();
        }
    }
    if !row.is_empty() {
        rows.push(row);
    }
    rows
}

/// Encode for the standard fonts; anything outside Latin-1 becomes '?'
fn win_ansi_bytes(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Render the underwriting summary, dated today
pub fn render_report(
    summary: &UnderwritingSummary,
    broker: &BrokerProfile,
) -> Result<Vec<u8>, ReportError> {
    render_report_on(summary, broker, Local::now().date_naive())
}

/// Render the underwriting summary with an explicit generation date
pub fn render_report_on(
    summary: &UnderwritingSummary,
    broker: &BrokerProfile,
    generated: NaiveDate,
) -> Result<Vec<u8>, ReportError> {
    let mut w = TextPdfWriter::new()
        .title(REPORT_TITLE)
        .line(format!("Generated on {}", generated.format("%Y-%m-%d")))
        .blank();

    w = w
        .heading("Broker")
        .line(format!("Brokerage: {}", text_or_na(&broker.brokerage)))
        .line(format!("Agent: {}", text_or_na(&broker.agent_name)))
        .line(format!("License #: {}", text_or_na(&broker.license_number)))
        .blank();

    w = w
        .heading("Applicant")
        .line(format!("Name: {}", text_or_na(&summary.applicant_name)));
    if let Some(co) = &summary.co_applicant_name {
        w = w.line(format!("Co-Applicant: {}", text_or_na(co)));
    }
    w = w
        .line(format!("Employment Type: {}", summary.employment.label()))
        .blank();

    w = w
        .heading("Income")
        .line(format!(
            "Annual Income: {}",
            money_or_na(summary.income.annual_income)
        ))
        .line(format!("Income Source: {}", income_source(&summary.income.source)));
    if summary.occupancy == Occupancy::Rental {
        w = w.line(format!("Monthly Rent: {}", money(summary.monthly_rent)));
        if let Some(RentPeriod::Yearly) = summary.lease.as_ref().and_then(|l| l.stated_period) {
            w = w.line("Rent stated yearly on lease, shown per month");
        }
    }
    w = w.blank();

    w = w.heading("Liabilities");
    let liabilities = summary.liabilities();
    if liabilities.is_empty() {
        w = w.line("None reported");
    }
    for liability in liabilities {
        w = w.line(format!(
            "{}: balance {}, payment {}/mo",
            liability.kind,
            money(liability.balance),
            money(liability.monthly_payment)
        ));
    }
    w = w
        .line(format!(
            "Total Monthly Debt: {}",
            money(summary.total_monthly_debt)
        ))
        .blank();

    w = w
        .heading("Property & Mortgage")
        .line(format!("Transaction Type: {}", summary.transaction.label()))
        .line(format!(
            "Property Address: {}",
            text_or_na(&summary.property_address)
        ))
        .line(format!("Property Type: {}", text_or_na(&summary.property_type)))
        .line(format!("Occupancy: {}", summary.occupancy.label()))
        .line(format!("Purchase Price: {}", money(summary.purchase_price)))
        .line(format!("Mortgage Amount: {}", money(summary.mortgage_amount)))
        .line(format!("Interest Type: {}", summary.interest_type.label()))
        .line(format!("Amortization: {} years", summary.amortization_years))
        .line(format!(
            "Qualifying Payment: {}/mo",
            money(summary.qualifying_payment)
        ))
        .line(format!(
            "Property Tax: {}/mo",
            money(summary.monthly_property_tax)
        ))
        .line(format!("Heat: {}/mo", money(summary.monthly_heat)))
        .blank();

    let ratios = summary.ratios;
    w = w
        .heading("Credit & Ratios")
        .line(format!(
            "Beacon Score: {}",
            summary
                .beacon_score()
                .map(|s| s.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string())
        ))
        .line(format!("GDS: {}", percent_or_na(ratios.map(|r| r.gds))))
        .line(format!("TDS: {}", percent_or_na(ratios.map(|r| r.tds))))
        .line(format!("LTV: {}", percent_or_na(summary.ltv)))
        .blank();

    w = w.heading("Documents");
    for note in &summary.documents {
        let status = match &note.status {
            DocumentStatus::Read { pages: 1 } => "received (1 page)".to_string(),
            DocumentStatus::Read { pages } => format!("received ({} pages)", pages),
            DocumentStatus::Unreadable { reason } => format!("unreadable ({})", reason),
            DocumentStatus::Missing => "not provided".to_string(),
        };
        w = w.line(format!("{}: {}", note.kind.label(), status));
    }

    w.finish()
}

fn income_source(source: &IncomeSource) -> String {
    match source {
        IncomeSource::Document { kind, page, line } => {
            format!("{} (page {}, line {})", kind.label(), page, line)
        }
        IncomeSource::PolicyDefault => "Policy default, no income found in documents".to_string(),
        IncomeSource::Unavailable => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{
        DocumentKind, MortgageApplication, Underwriter, UploadedDocuments,
    };
    use crate::document::ExtractedDocument;
    use pretty_assertions::assert_eq;

    fn text_lines(pdf: &[u8]) -> Vec<String> {
        ExtractedDocument::from_pdf_bytes(pdf)
            .unwrap()
            .lines()
            .map(|l| l.text.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect()
    }

    fn summary(pairs: &[(&str, &str)], uploads: UploadedDocuments) -> UnderwritingSummary {
        let fields = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let app = MortgageApplication::from_form(&fields).unwrap();
        Underwriter::default().underwrite(&app, &uploads)
    }

    #[test]
    fn test_writer_lines_come_back_in_order() {
        let pdf = TextPdfWriter::new()
            .title("Heading")
            .line("first")
            .blank()
            .line("second (with parens)")
            .finish()
            .unwrap();

        assert!(pdf.starts_with(b"%PDF"));
        assert_eq!(
            text_lines(&pdf),
            vec!["Heading", "first", "second (with parens)"]
        );
    }

    #[test]
    fn test_writer_paginates() {
        let writer = (0..120).fold(TextPdfWriter::new(), |w, i| w.line(format!("row {}", i)));
        let doc = ExtractedDocument::from_pdf_bytes(&writer.finish().unwrap()).unwrap();

        assert!(doc.page_count() > 1);
        let lines: Vec<&str> = doc.lines().map(|l| l.text.trim()).filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 120);
        assert_eq!(lines[119], "row 119");
    }

    #[test]
    fn test_wrap_breaks_at_spaces_and_splits_long_words() {
        assert_eq!(wrap("short line", 20), vec!["short line"]);
        assert_eq!(wrap("aaa bbb ccc ddd", 8), vec!["aaa bbb", "ccc ddd"]);
        assert_eq!(wrap("x abcdefghij", 4), vec!["x", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_long_lines_wrap_inside_the_margin() {
        let reason = format!(
            "unreadable (invalid cross-reference table at offset 48213, {})",
            "object stream could not be decoded ".repeat(4).trim_end()
        );
        let address = format!("Property Address: {}", "Unit-1402-Harbourfront-".repeat(6));
        let pdf = TextPdfWriter::new()
            .line(format!("Notice of Assessment: {}", reason))
            .line(address.clone())
            .line("after")
            .finish()
            .unwrap();

        let lines = text_lines(&pdf);
        let max = LineStyle::Body.max_chars();
        assert!(lines.len() > 4);
        assert!(lines.iter().all(|l| l.chars().count() <= max), "{:?}", lines);
        assert_eq!(lines.last().map(String::as_str), Some("after"));

        // No text is lost: rows rejoin to the original words
        let printed = lines[..lines.len() - 1].join(" ");
        let written = format!("Notice of Assessment: {} {}", reason, address);
        assert_eq!(
            printed.split_whitespace().collect::<String>(),
            written.split_whitespace().collect::<String>()
        );
    }

    #[test]
    fn test_win_ansi_replaces_unmappable() {
        assert_eq!(win_ansi_bytes("Zo\u{eb} \u{540d}"), vec![b'Z', b'o', 0xEB, b' ', b'?']);
        assert_eq!(win_ansi_bytes("a\tb"), b"a?b".to_vec());
    }

    #[test]
    fn test_report_sections_and_values() {
        let credit = TextPdfWriter::new()
            .line("Beacon Score 742")
            .line("Auto Loan $12,000 $350")
            .finish()
            .unwrap();
        let summary = summary(
            &[
                ("first_name", "Jane"),
                ("last_name", "Smith"),
                ("employment_type", "salaried"),
                ("transaction_type", "purchase"),
                ("property_value", "500000"),
                ("down_payment", "50000"),
                ("monthly_property_tax", "300"),
                ("monthly_heat", "100"),
            ],
            UploadedDocuments::new().with(DocumentKind::CreditReport, credit),
        );

        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let pdf = render_report_on(&summary, &BrokerProfile::default(), date).unwrap();
        let lines = text_lines(&pdf);

        assert_eq!(lines[0], REPORT_TITLE);
        assert_eq!(lines[1], "Generated on 2024-03-01");

        let headings = [
            "Broker",
            "Applicant",
            "Income",
            "Liabilities",
            "Property & Mortgage",
            "Credit & Ratios",
            "Documents",
        ];
        let positions: Vec<usize> = headings
            .iter()
            .map(|h| lines.iter().position(|l| l == h).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        for expected in [
            "Agent: John Doe",
            "Name: Jane Smith",
            "Annual Income: $60,000.00",
            "Auto: balance $12,000.00, payment $350.00/mo",
            "Total Monthly Debt: $350.00",
            "Mortgage Amount: $450,000.00",
            "Beacon Score: 742",
            "GDS: 62.00%",
            "TDS: 69.00%",
            "LTV: 90.00%",
            "Credit Report: received (1 page)",
            "T4 Slips: not provided",
        ] {
            assert!(lines.iter().any(|l| l == expected), "missing {:?}", expected);
        }
    }

    #[test]
    fn test_undefined_values_print_na() {
        let mut policy = crate::UnderwritingPolicy::default();
        policy.fallback_income.enabled = false;
        let fields = [
            ("first_name", "Jane"),
            ("last_name", "Smith"),
            ("employment_type", "salaried"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let app = MortgageApplication::from_form(&fields).unwrap();
        let summary = Underwriter::new(policy).underwrite(&app, &UploadedDocuments::new());

        let pdf = render_report(&summary, &BrokerProfile::default()).unwrap();
        let lines = text_lines(&pdf);
        for expected in [
            "Annual Income: N/A",
            "GDS: N/A",
            "TDS: N/A",
            "LTV: N/A",
            "Beacon Score: N/A",
            "None reported",
            "Property Address: N/A",
        ] {
            assert!(lines.iter().any(|l| l == expected), "missing {:?}", expected);
        }
    }
}
