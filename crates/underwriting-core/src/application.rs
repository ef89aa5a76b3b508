//! Mortgage application model and the underwriting pass
//!
//! A submission is a set of form fields plus whatever PDFs the applicant
//! uploaded. [`Underwriter::underwrite`] decodes each upload once, runs the
//! extractors that apply to it, and computes the ratios. Nothing here fails
//! on bad documents: unreadable uploads become [`DocumentStatus::Unreadable`]
//! notes and missing figures become `None`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span, warn};

use crate::amount::parse_amount;
use crate::config::UnderwritingPolicy;
use crate::document::ExtractedDocument;
use crate::extractors::{
    extract_credit_report, extract_lease_rent, extract_noa_total_income, extract_paystub_ytd,
    extract_t4_income, CreditReport, Extraction, LeaseRent, Liability,
};
use crate::ratios::{
    debt_service_ratios, loan_to_value, qualifying_payment, DebtServiceRatios, HousingCosts,
};

/// Submitted form fields by input name
pub type FormFields = HashMap<String, String>;

/// Default amortization, in years
pub const DEFAULT_AMORTIZATION_YEARS: u32 = 25;

/// Longest amortization the form offers, in years
pub const MAX_AMORTIZATION_YEARS: u32 = 30;

// ============================================================
// Form errors
// ============================================================

/// Problems with the submitted form
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormError {
    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("field '{field}' is not a number: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("field '{field}' has unknown choice {value:?}")]
    InvalidChoice { field: &'static str, value: String },

    #[error("field '{field}' must not be negative")]
    OutOfRange { field: &'static str },
}

// ============================================================
// Choices
// ============================================================

/// Normalise a select value: "Self-Employed" -> "self_employed"
fn choice_key(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace(['-', ' '], "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    Salaried,
    SelfEmployed,
}

impl EmploymentType {
    pub fn parse(value: &str) -> Option<Self> {
        match choice_key(value).as_str() {
            "salaried" => Some(Self::Salaried),
            "self_employed" => Some(Self::SelfEmployed),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Salaried => "Salaried",
            Self::SelfEmployed => "Self-Employed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Switch,
    Refinance,
}

impl TransactionType {
    pub fn parse(value: &str) -> Option<Self> {
        match choice_key(value).as_str() {
            "purchase" => Some(Self::Purchase),
            "switch" => Some(Self::Switch),
            "refinance" => Some(Self::Refinance),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Purchase => "Purchase",
            Self::Switch => "Switch",
            Self::Refinance => "Refinance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestType {
    Fixed,
    Variable,
}

impl InterestType {
    pub fn parse(value: &str) -> Option<Self> {
        match choice_key(value).as_str() {
            "fixed" => Some(Self::Fixed),
            "variable" => Some(Self::Variable),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Fixed => "Fixed",
            Self::Variable => "Variable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occupancy {
    OwnerOccupied,
    Rental,
}

impl Occupancy {
    pub fn parse(value: &str) -> Option<Self> {
        match choice_key(value).as_str() {
            "owner_occupied" | "owner" => Some(Self::OwnerOccupied),
            "rental" => Some(Self::Rental),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OwnerOccupied => "Owner-Occupied",
            Self::Rental => "Rental",
        }
    }
}

// ============================================================
// Documents
// ============================================================

/// Upload slots on the form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Paystub,
    EmploymentLetter,
    T4Slip,
    NoticeOfAssessment,
    T1General,
    BankStatement,
    PurchaseAgreement,
    MlsListing,
    MortgageStatement,
    PropertyTaxStatement,
    GovernmentId,
    CreditReport,
    LeaseAgreement,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 13] = [
        DocumentKind::Paystub,
        DocumentKind::EmploymentLetter,
        DocumentKind::T4Slip,
        DocumentKind::NoticeOfAssessment,
        DocumentKind::T1General,
        DocumentKind::BankStatement,
        DocumentKind::PurchaseAgreement,
        DocumentKind::MlsListing,
        DocumentKind::MortgageStatement,
        DocumentKind::PropertyTaxStatement,
        DocumentKind::GovernmentId,
        DocumentKind::CreditReport,
        DocumentKind::LeaseAgreement,
    ];

    /// Form input name
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Paystub => "paystub",
            Self::EmploymentLetter => "employment_letter",
            Self::T4Slip => "t4_slip",
            Self::NoticeOfAssessment => "notice_of_assessment",
            Self::T1General => "t1_general",
            Self::BankStatement => "bank_statement",
            Self::PurchaseAgreement => "purchase_agreement",
            Self::MlsListing => "mls_listing",
            Self::MortgageStatement => "mortgage_statement",
            Self::PropertyTaxStatement => "property_tax_statement",
            Self::GovernmentId => "government_id",
            Self::CreditReport => "credit_report",
            Self::LeaseAgreement => "lease_agreement",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Paystub => "Paystubs",
            Self::EmploymentLetter => "Letter of Employment",
            Self::T4Slip => "T4 Slips",
            Self::NoticeOfAssessment => "Notice of Assessment",
            Self::T1General => "T1 Generals",
            Self::BankStatement => "Bank Statements",
            Self::PurchaseAgreement => "Agreement of Purchase & Sale",
            Self::MlsListing => "MLS Listing",
            Self::MortgageStatement => "Current Mortgage Statement",
            Self::PropertyTaxStatement => "Property Tax Statement",
            Self::GovernmentId => "Government Issued ID",
            Self::CreditReport => "Credit Report",
            Self::LeaseAgreement => "Lease Agreement",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }
}

/// Raw uploads for one submission, one file per slot
#[derive(Debug, Clone, Default)]
pub struct UploadedDocuments {
    files: BTreeMap<DocumentKind, Vec<u8>>,
}

impl UploadedDocuments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an upload; a second file for the same slot replaces the first
    pub fn insert(&mut self, kind: DocumentKind, bytes: Vec<u8>) {
        self.files.insert(kind, bytes);
    }

    pub fn with(mut self, kind: DocumentKind, bytes: Vec<u8>) -> Self {
        self.insert(kind, bytes);
        self
    }

    pub fn get(&self, kind: DocumentKind) -> Option<&[u8]> {
        self.files.get(&kind).map(Vec::as_slice)
    }

    pub fn kinds(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.files.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// How an upload fared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Read { pages: usize },
    Unreadable { reason: String },
    /// Required for this application but not uploaded
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentNote {
    pub kind: DocumentKind,
    pub status: DocumentStatus,
}

// ============================================================
// Application
// ============================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrower {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub employment: EmploymentType,
}

impl Borrower {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDetails {
    pub address: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub value: f64,
    pub property_type: String,
    pub occupancy: Occupancy,
}

/// Amount the applicant brings or still owes, by transaction type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Financing {
    Purchase { down_payment: f64 },
    Existing { mortgage_owed: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MortgageApplication {
    pub primary: Borrower,
    pub co_borrower: Option<Borrower>,
    pub transaction: TransactionType,
    pub property: PropertyDetails,
    pub interest_type: InterestType,
    pub amortization_years: u32,
    pub financing: Financing,
    pub monthly_property_tax: f64,
    pub monthly_heat: f64,
}

impl MortgageApplication {
    /// Parse submitted form fields
    ///
    /// Blank numeric inputs are zero. The co-borrower block is read only when
    /// `add_co_borrower` is checked.
    pub fn from_form(fields: &FormFields) -> Result<Self, FormError> {
        let primary = borrower(fields, "")?;

        let co_borrower = if checkbox(fields, "add_co_borrower") {
            Some(borrower(fields, "co_")?)
        } else {
            None
        };

        let transaction = choice(
            fields,
            "transaction_type",
            TransactionType::parse,
            Some(TransactionType::Purchase),
        )?;

        let property = PropertyDetails {
            address: text(fields, "property_address"),
            city: text(fields, "city"),
            province: text(fields, "province"),
            postal_code: text(fields, "postal_code"),
            value: amount(fields, "property_value")?,
            property_type: text(fields, "property_type"),
            occupancy: choice(
                fields,
                "occupancy",
                Occupancy::parse,
                Some(Occupancy::OwnerOccupied),
            )?,
        };

        let financing = match transaction {
            TransactionType::Purchase => Financing::Purchase {
                down_payment: amount(fields, "down_payment")?,
            },
            TransactionType::Switch | TransactionType::Refinance => Financing::Existing {
                mortgage_owed: amount(fields, "mortgage_owed")?,
            },
        };

        Ok(Self {
            primary,
            co_borrower,
            transaction,
            property,
            interest_type: choice(
                fields,
                "interest_type",
                InterestType::parse,
                Some(InterestType::Fixed),
            )?,
            amortization_years: amortization(fields)?,
            financing,
            monthly_property_tax: amount(fields, "monthly_property_tax")?,
            monthly_heat: amount(fields, "monthly_heat")?,
        })
    }

    /// Property value, used as the purchase price for LTV
    pub fn purchase_price(&self) -> f64 {
        self.property.value
    }

    /// Principal to be financed
    pub fn mortgage_amount(&self) -> f64 {
        match self.financing {
            Financing::Purchase { down_payment } => (self.property.value - down_payment).max(0.0),
            Financing::Existing { mortgage_owed } => mortgage_owed,
        }
    }

    /// Upload checklist for this application, in form order
    pub fn required_documents(&self) -> Vec<DocumentKind> {
        use DocumentKind::*;

        let mut kinds = match self.primary.employment {
            EmploymentType::Salaried => vec![Paystub, EmploymentLetter, T4Slip],
            EmploymentType::SelfEmployed => vec![
                NoticeOfAssessment,
                T1General,
                BankStatement,
                Paystub,
                EmploymentLetter,
                T4Slip,
            ],
        };

        match self.transaction {
            TransactionType::Purchase => kinds.extend([PurchaseAgreement, MlsListing]),
            TransactionType::Switch | TransactionType::Refinance => {
                kinds.extend([MortgageStatement, PropertyTaxStatement])
            }
        }

        kinds.extend([GovernmentId, CreditReport]);
        if self.property.occupancy == Occupancy::Rental {
            kinds.push(LeaseAgreement);
        }
        kinds
    }
}

fn text(fields: &FormFields, name: &str) -> String {
    fields
        .get(name)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

fn checkbox(fields: &FormFields, name: &str) -> bool {
    matches!(
        fields.get(name).map(|v| v.trim().to_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn amount(fields: &FormFields, name: &'static str) -> Result<f64, FormError> {
    let raw = text(fields, name);
    if raw.is_empty() {
        return Ok(0.0);
    }

    let value = parse_amount(&raw).map_err(|_| FormError::InvalidNumber {
        field: name,
        value: raw.clone(),
    })?;
    if value < 0.0 {
        return Err(FormError::OutOfRange { field: name });
    }
    Ok(value)
}

fn amortization(fields: &FormFields) -> Result<u32, FormError> {
    let raw = text(fields, "amortization_years");
    if raw.is_empty() {
        return Ok(DEFAULT_AMORTIZATION_YEARS);
    }
    let years: i64 = raw.parse().map_err(|_| FormError::InvalidNumber {
        field: "amortization_years",
        value: raw.clone(),
    })?;
    Ok(years.clamp(0, MAX_AMORTIZATION_YEARS as i64) as u32)
}

fn choice<T>(
    fields: &FormFields,
    name: &'static str,
    parse: fn(&str) -> Option<T>,
    default: Option<T>,
) -> Result<T, FormError> {
    let raw = text(fields, name);
    if raw.is_empty() {
        return default.ok_or(FormError::Missing(name));
    }
    parse(&raw).ok_or(FormError::InvalidChoice { field: name, value: raw })
}

fn borrower(fields: &FormFields, prefix: &str) -> Result<Borrower, FormError> {
    // Field names are static so errors can point at them
    let (first, last, email, phone, employment) = if prefix.is_empty() {
        ("first_name", "last_name", "email", "phone", "employment_type")
    } else {
        (
            "co_first_name",
            "co_last_name",
            "co_email",
            "co_phone",
            "co_employment_type",
        )
    };

    let first_name = text(fields, first);
    if first_name.is_empty() {
        return Err(FormError::Missing(first));
    }
    let last_name = text(fields, last);
    if last_name.is_empty() {
        return Err(FormError::Missing(last));
    }

    Ok(Borrower {
        first_name,
        last_name,
        email: text(fields, email),
        phone: text(fields, phone),
        employment: choice(fields, employment, EmploymentType::parse, None)?,
    })
}

// ============================================================
// Underwriting pass
// ============================================================

/// Where the annual income figure came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IncomeSource {
    Document {
        kind: DocumentKind,
        page: usize,
        line: usize,
    },
    /// No document yielded income; the policy fallback was used
    PolicyDefault,
    /// No document yielded income and fallbacks are disabled
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncomeFinding {
    pub annual_income: Option<f64>,
    pub source: IncomeSource,
}

/// Result of one underwriting pass, in the shape the report prints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingSummary {
    pub applicant_name: String,
    pub co_applicant_name: Option<String>,
    pub employment: EmploymentType,
    pub transaction: TransactionType,
    pub interest_type: InterestType,
    pub amortization_years: u32,

    pub income: IncomeFinding,
    /// Lease scan, present only for rental occupancy with a readable lease
    pub lease: Option<LeaseRent>,
    pub monthly_rent: f64,

    /// Credit report scan, present only when a readable report was uploaded
    pub credit: Option<CreditReport>,
    pub total_monthly_debt: f64,

    pub purchase_price: f64,
    pub mortgage_amount: f64,
    pub qualifying_payment: f64,
    pub monthly_property_tax: f64,
    pub monthly_heat: f64,
    pub ltv: Option<f64>,
    pub ratios: Option<DebtServiceRatios>,

    pub property_address: String,
    pub property_type: String,
    pub occupancy: Occupancy,

    pub documents: Vec<DocumentNote>,
}

impl UnderwritingSummary {
    pub fn beacon_score(&self) -> Option<u16> {
        self.credit
            .as_ref()
            .and_then(|c| c.beacon_score.value().copied())
    }

    pub fn liabilities(&self) -> &[Liability] {
        self.credit
            .as_ref()
            .map(|c| c.liabilities.as_slice())
            .unwrap_or(&[])
    }
}

/// Uploads decoded once per pass
struct DecodedDocuments {
    documents: BTreeMap<DocumentKind, ExtractedDocument>,
    notes: BTreeMap<DocumentKind, DocumentStatus>,
}

impl DecodedDocuments {
    fn decode(uploads: &UploadedDocuments) -> Self {
        let mut documents = BTreeMap::new();
        let mut notes = BTreeMap::new();

        for kind in uploads.kinds() {
            let Some(bytes) = uploads.get(kind) else {
                continue;
            };
            match ExtractedDocument::from_pdf_bytes(bytes) {
                Ok(document) => {
                    notes.insert(
                        kind,
                        DocumentStatus::Read {
                            pages: document.page_count(),
                        },
                    );
                    documents.insert(kind, document);
                }
                Err(e) => {
                    warn!(document = kind.slug(), error = %e, "upload unreadable");
                    notes.insert(
                        kind,
                        DocumentStatus::Unreadable {
                            reason: e.to_string(),
                        },
                    );
                }
            }
        }

        Self { documents, notes }
    }

    /// Run an extractor over a decoded upload, if there is one
    fn scan<T>(&self, kind: DocumentKind, f: impl FnOnce(&ExtractedDocument) -> T) -> Option<T> {
        self.documents.get(&kind).map(f)
    }
}

/// Income rule tried against one upload slot
type IncomeExtractor = fn(&ExtractedDocument) -> Extraction<f64>;

/// Runs underwriting passes under a fixed policy
#[derive(Debug, Clone, Default)]
pub struct Underwriter {
    policy: UnderwritingPolicy,
}

impl Underwriter {
    pub fn new(policy: UnderwritingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UnderwritingPolicy {
        &self.policy
    }

    /// One underwriting pass over a submission
    pub fn underwrite(
        &self,
        application: &MortgageApplication,
        uploads: &UploadedDocuments,
    ) -> UnderwritingSummary {
        let span = info_span!(
            "underwrite",
            employment = application.primary.employment.label(),
            transaction = application.transaction.label(),
            uploads = uploads.len(),
        );
        let _enter = span.enter();

        let decoded = DecodedDocuments::decode(uploads);

        let income = self.find_income(application.primary.employment, &decoded);

        let lease = match application.property.occupancy {
            Occupancy::Rental => decoded.scan(DocumentKind::LeaseAgreement, extract_lease_rent),
            Occupancy::OwnerOccupied => None,
        };
        let monthly_rent = lease
            .as_ref()
            .and_then(|l| l.monthly_rent.value().copied())
            .unwrap_or(0.0);

        let credit = decoded.scan(DocumentKind::CreditReport, extract_credit_report);
        let total_monthly_debt = credit
            .as_ref()
            .map(CreditReport::total_monthly_payments)
            .unwrap_or(0.0);

        let mortgage_amount = application.mortgage_amount();
        let purchase_price = application.purchase_price();
        let payment = qualifying_payment(mortgage_amount, self.policy.qualifying_payment_rate);

        let costs = HousingCosts {
            qualifying_payment: payment,
            property_tax: application.monthly_property_tax,
            heat: application.monthly_heat,
            rent: monthly_rent,
            other_debt: total_monthly_debt,
        };
        let ratios = debt_service_ratios(income.annual_income, &costs);
        let ltv = loan_to_value(mortgage_amount, purchase_price);

        let documents = document_notes(application, &decoded);

        info!(
            income_found = income.annual_income.is_some(),
            liabilities = credit.as_ref().map(|c| c.liabilities.len()).unwrap_or(0),
            ratios_defined = ratios.is_some(),
            "underwriting pass complete"
        );

        UnderwritingSummary {
            applicant_name: application.primary.full_name(),
            co_applicant_name: application.co_borrower.as_ref().map(Borrower::full_name),
            employment: application.primary.employment,
            transaction: application.transaction,
            interest_type: application.interest_type,
            amortization_years: application.amortization_years,
            income,
            lease,
            monthly_rent,
            credit,
            total_monthly_debt,
            purchase_price,
            mortgage_amount,
            qualifying_payment: payment,
            monthly_property_tax: application.monthly_property_tax,
            monthly_heat: application.monthly_heat,
            ltv,
            ratios,
            property_address: application.property.address.clone(),
            property_type: application.property.property_type.clone(),
            occupancy: application.property.occupancy,
            documents,
        }
    }

    fn find_income(&self, employment: EmploymentType, decoded: &DecodedDocuments) -> IncomeFinding {
        let candidates: [(DocumentKind, IncomeExtractor); 2] = match employment {
            EmploymentType::Salaried => [
                (DocumentKind::T4Slip, extract_t4_income as IncomeExtractor),
                (DocumentKind::Paystub, extract_paystub_ytd),
            ],
            EmploymentType::SelfEmployed => [
                (
                    DocumentKind::NoticeOfAssessment,
                    extract_noa_total_income as IncomeExtractor,
                ),
                (DocumentKind::T4Slip, extract_t4_income),
            ],
        };

        for (kind, extractor) in candidates {
            if let Some(Extraction::Found(found)) = decoded.scan(kind, extractor) {
                return IncomeFinding {
                    annual_income: Some(found.value),
                    source: IncomeSource::Document {
                        kind,
                        page: found.page,
                        line: found.line,
                    },
                };
            }
        }

        match self.policy.fallback_income.for_employment(employment) {
            Some(amount) => {
                warn!(
                    employment = employment.label(),
                    amount, "no income in documents, using policy fallback"
                );
                IncomeFinding {
                    annual_income: Some(amount),
                    source: IncomeSource::PolicyDefault,
                }
            }
            None => IncomeFinding {
                annual_income: None,
                source: IncomeSource::Unavailable,
            },
        }
    }
}

/// Status of every required or uploaded document, in slot order
fn document_notes(
    application: &MortgageApplication,
    decoded: &DecodedDocuments,
) -> Vec<DocumentNote> {
    let mut kinds = application.required_documents();
    kinds.extend(decoded.notes.keys().copied());
    kinds.sort();
    kinds.dedup();

    kinds
        .into_iter()
        .map(|kind| DocumentNote {
            kind,
            status: decoded
                .notes
                .get(&kind)
                .cloned()
                .unwrap_or(DocumentStatus::Missing),
        })
        .collect()
}
