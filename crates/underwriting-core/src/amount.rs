//! Dollar amount tokens
//!
//! Statements print money as `$1,200.50`, `1200.5`, `(350.00)` or `$350:`.
//! These helpers strip the decoration and parse what is left.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    /// A cleaned amount: optional sign, digits, optional fraction
    static ref PLAIN_AMOUNT: Regex = Regex::new(r"^-?\d+(?:\.\d+)?$").unwrap();
}

/// Why a token could not be read as an amount
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty token")]
    Empty,

    #[error("not a number: {0:?}")]
    NotNumeric(String),
}

/// True when the token has at least one ASCII digit
pub fn looks_numeric(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
}

/// Strip currency symbols, thousands separators and surrounding punctuation
pub fn clean_amount(token: &str) -> String {
    let stripped: String = token
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();

    stripped
        .trim_matches(|c: char| matches!(c, ':' | ';' | '(' | ')' | '*'))
        .trim_end_matches('.')
        .to_string()
}

/// Parse a single amount token
///
/// `inf`, `NaN` and friends are rejected even though `f64::from_str`
/// accepts them.
pub fn parse_amount(token: &str) -> Result<f64, AmountError> {
    let cleaned = clean_amount(token);
    if cleaned.is_empty() {
        return Err(AmountError::Empty);
    }

    if !PLAIN_AMOUNT.is_match(&cleaned) {
        return Err(AmountError::NotNumeric(token.to_string()));
    }

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(AmountError::NotNumeric(token.to_string())),
    }
}

/// Iterator over the numeric-looking whitespace tokens of `text`
pub fn numeric_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().filter(|t| looks_numeric(t))
}
