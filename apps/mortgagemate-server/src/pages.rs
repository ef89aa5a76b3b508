//! HTML for the wizard pages
//!
//! Plain server-rendered markup; the current page travels in the query
//! string and forms, never in server-side session state.

use std::fmt::Write;

use axum::response::Html;
use underwriting_core::{DocumentKind, Page};

const STYLE: &str = "body{font-family:Helvetica,Arial,sans-serif;max-width:760px;margin:2em auto;padding:0 1em;color:#222}\
fieldset{margin:1.5em 0;border:1px solid #ccc;padding:1em}\
label{display:block;margin:.5em 0}\
input,select{margin-left:.5em}\
button{padding:.6em 1.4em;font-size:1em}";

/// When an upload group belongs on an application's checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequiredWhen {
    Always,
    SelfEmployed,
    Purchase,
    SwitchOrRefinance,
    RentalOccupancy,
}

impl RequiredWhen {
    fn note(&self) -> &'static str {
        match self {
            RequiredWhen::Always => "required for every application",
            RequiredWhen::SelfEmployed => "self-employed applicants only",
            RequiredWhen::Purchase => "purchases only",
            RequiredWhen::SwitchOrRefinance => "switches and refinances only",
            RequiredWhen::RentalOccupancy => "rental occupancy only",
        }
    }
}

/// Upload slots grouped as the form shows them
const UPLOAD_GROUPS: &[(&str, RequiredWhen, &[DocumentKind])] = &[
    (
        "Income Documents",
        RequiredWhen::Always,
        &[
            DocumentKind::Paystub,
            DocumentKind::EmploymentLetter,
            DocumentKind::T4Slip,
        ],
    ),
    (
        "Self-Employment Income",
        RequiredWhen::SelfEmployed,
        &[
            DocumentKind::NoticeOfAssessment,
            DocumentKind::T1General,
            DocumentKind::BankStatement,
        ],
    ),
    (
        "Purchase",
        RequiredWhen::Purchase,
        &[DocumentKind::PurchaseAgreement, DocumentKind::MlsListing],
    ),
    (
        "Switch / Refinance",
        RequiredWhen::SwitchOrRefinance,
        &[
            DocumentKind::MortgageStatement,
            DocumentKind::PropertyTaxStatement,
        ],
    ),
    (
        "Identity & Credit",
        RequiredWhen::Always,
        &[DocumentKind::GovernmentId, DocumentKind::CreditReport],
    ),
    (
        "Rental Properties",
        RequiredWhen::RentalOccupancy,
        &[DocumentKind::LeaseAgreement],
    ),
];

pub fn render_page(page: Page) -> Html<String> {
    let body = match page {
        Page::Landing => landing(),
        Page::Underwriting => underwriting_form(),
        Page::Submitted => submitted(),
    };

    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        page.title(),
        STYLE,
        body
    ))
}

fn landing() -> String {
    r#"<h1>MortgageMate</h1>
<h3>Your Mortgage Underwriting Assistant</h3>
<p>Upload your client's documents and get a lender-ready summary.</p>
<ul>
<li><strong>Document Extraction</strong>: income, rent, credit score and liabilities read from the PDFs you upload.</li>
<li><strong>GDS / TDS &amp; LTV</strong>: calculated from the extracted figures.</li>
<li><strong>Lender-Ready Packaging</strong>: a Filogix-style application summary to download.</li>
</ul>
<form method="get" action="/">
<input type="hidden" name="page" value="landing">
<input type="hidden" name="action" value="start">
<button type="submit">Start Underwriting Now</button>
</form>"#
        .to_string()
}

fn select(name: &str, label: &str, options: &[(&str, &str)]) -> String {
    let mut html = format!("<label>{} <select name=\"{}\">", label, name);
    for (value, text) in options {
        let _ = write!(html, "<option value=\"{}\">{}</option>", value, text);
    }
    html.push_str("</select></label>\n");
    html
}

fn text_input(name: &str, label: &str) -> String {
    format!(
        "<label>{} <input type=\"text\" name=\"{}\"></label>\n",
        label, name
    )
}

fn money_input(name: &str, label: &str) -> String {
    format!(
        "<label>{} <input type=\"number\" name=\"{}\" min=\"0\" step=\"0.01\" value=\"0\"></label>\n",
        label, name
    )
}

const EMPLOYMENT: &[(&str, &str)] = &[("salaried", "Salaried"), ("self_employed", "Self-Employed")];

fn borrower_fields(prefix: &str) -> String {
    let mut html = String::new();
    html.push_str(&text_input(&format!("{}first_name", prefix), "First Name"));
    html.push_str(&text_input(&format!("{}last_name", prefix), "Last Name"));
    html.push_str(&text_input(&format!("{}email", prefix), "Email"));
    html.push_str(&text_input(&format!("{}phone", prefix), "Phone Number"));
    html.push_str(&select(
        &format!("{}employment_type", prefix),
        "Employment Type",
        EMPLOYMENT,
    ));
    html
}

fn underwriting_form() -> String {
    let mut html = String::from(
        "<h1>MortgageMate - Underwriting Form</h1>\n\
         <form method=\"post\" action=\"/api/underwrite\" enctype=\"multipart/form-data\">\n",
    );

    html.push_str("<fieldset><legend>Primary Borrower Information</legend>\n");
    html.push_str(&borrower_fields(""));
    html.push_str("<label><input type=\"checkbox\" name=\"add_co_borrower\"> Add Secondary Borrower</label>\n");
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Secondary Borrower (if added)</legend>\n");
    html.push_str(&borrower_fields("co_"));
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Application &amp; Property Details</legend>\n");
    html.push_str(&select(
        "transaction_type",
        "Transaction Type",
        &[
            ("purchase", "Purchase"),
            ("switch", "Switch"),
            ("refinance", "Refinance"),
        ],
    ));
    html.push_str(&text_input("property_address", "Property Address"));
    html.push_str(&text_input("city", "City"));
    html.push_str(&text_input("province", "Province"));
    html.push_str(&text_input("postal_code", "Postal Code"));
    html.push_str(&text_input("property_type", "Property Type"));
    html.push_str(&select(
        "occupancy",
        "Occupancy",
        &[("owner_occupied", "Owner-Occupied"), ("rental", "Rental")],
    ));
    html.push_str(&money_input("property_value", "Property Value ($)"));
    html.push_str(&money_input("down_payment", "Down Payment ($, purchase)"));
    html.push_str(&money_input(
        "mortgage_owed",
        "Current Mortgage Owed ($, switch / refinance)",
    ));
    html.push_str(&money_input("monthly_property_tax", "Monthly Property Tax ($)"));
    html.push_str(&money_input("monthly_heat", "Monthly Heat ($)"));
    html.push_str(&select(
        "interest_type",
        "Interest Rate Type",
        &[("fixed", "Fixed"), ("variable", "Variable")],
    ));
    html.push_str(
        "<label>Amortization (Years) <input type=\"range\" name=\"amortization_years\" min=\"0\" max=\"30\" value=\"25\"></label>\n",
    );
    html.push_str("</fieldset>\n");

    html.push_str("<fieldset><legend>Upload Required Documents (PDF)</legend>\n");
    html.push_str("<p>Upload only the groups that apply to this application; leave the rest empty.</p>\n");
    for (group, when, kinds) in UPLOAD_GROUPS {
        let _ = writeln!(
            html,
            "<p><strong>{}</strong> <em>({})</em></p>",
            group.replace('&', "&amp;"),
            when.note()
        );
        for kind in *kinds {
            let _ = writeln!(
                html,
                "<label>{} <input type=\"file\" name=\"{}\" accept=\"application/pdf,.pdf\"></label>",
                kind.label().replace('&', "&amp;"),
                kind.slug()
            );
        }
    }
    html.push_str("</fieldset>\n");

    html.push_str("<button type=\"submit\">Run Underwriting</button>\n</form>\n");
    html.push_str("<p><a href=\"/?page=underwriting&amp;action=restart\">Back to start</a></p>");
    html
}

fn submitted() -> String {
    r#"<h1>Underwriting Complete</h1>
<p>Documents received. Your application summary has been downloaded.</p>
<p><a href="/?page=submitted&amp;action=restart">Start a new application</a></p>"#
        .to_string()
}
