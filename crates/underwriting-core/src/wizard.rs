//! Page navigation
//!
//! The user moves landing → form → submitted. The current page travels with
//! each request; transitions are pure.

use serde::{Deserialize, Serialize};

/// Where the user is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    #[default]
    Landing,
    Underwriting,
    Submitted,
}

/// What the user clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavAction {
    /// "Start Underwriting Now"
    Start,
    /// "Run Underwriting"
    Submit,
    /// Back to the landing page
    Restart,
}

impl Page {
    /// Next page for an action; unknown pairs stay put
    pub fn transition(self, action: NavAction) -> Page {
        match (self, action) {
            (_, NavAction::Restart) => Page::Landing,
            (Page::Landing, NavAction::Start) => Page::Underwriting,
            (Page::Underwriting, NavAction::Submit) => Page::Submitted,
            (page, _) => page,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Page::Landing => "MortgageMate",
            Page::Underwriting => "Underwriting Form",
            Page::Submitted => "Underwriting Complete",
        }
    }
}
