//! Mortgage underwriting core
//!
//! This crate turns uploaded applicant documents into the handful of numbers
//! an underwriter looks at first:
//!
//! - [`document`]: PDF bytes to page/line text
//! - [`extractors`]: keyword line-scanning for income, rent, credit score and liabilities
//! - [`ratios`]: GDS / TDS / LTV
//! - [`application`]: form model and the per-submission underwriting pass
//! - [`report`]: flat PDF summary
//! - [`wizard`]: page navigation state machine
//!
//! The extraction layer is a heuristic. It never fails on odd input; it
//! reports what it found, what it saw but could not parse, and what was
//! missing altogether.

pub mod amount;
pub mod application;
pub mod config;
pub mod document;
pub mod extractors;
pub mod format;
pub mod ratios;
pub mod report;
pub mod wizard;

pub use application::{
    DocumentKind, DocumentStatus, EmploymentType, FormError, FormFields, IncomeSource,
    InterestType, MortgageApplication, Occupancy, TransactionType, Underwriter,
    UnderwritingSummary, UploadedDocuments,
};
pub use config::UnderwritingPolicy;
pub use document::{DocumentError, ExtractedDocument};
pub use extractors::{Extracted, Extraction, Field};
pub use ratios::{debt_service_ratios, loan_to_value, DebtServiceRatios, HousingCosts};
pub use report::{render_report, render_report_on, ReportError, TextPdfWriter, REPORT_FILENAME};
pub use wizard::{NavAction, Page};
