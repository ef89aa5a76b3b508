//! Affordability ratios
//!
//! GDS and TDS are the share of gross monthly income eaten by housing costs
//! and by all debt respectively. LTV is the loan as a share of the price.
//! Undefined results are `None`; they are shown as "N/A", never as 0%.

use serde::{Deserialize, Serialize};

/// Stress-test proxy: monthly qualifying payment as a share of principal
///
/// This is a policy constant, not an amortized payment.
pub const QUALIFYING_PAYMENT_RATE: f64 = 0.006;

/// Monthly qualifying payment for a mortgage principal
pub fn qualifying_payment(mortgage_amount: f64, rate: f64) -> f64 {
    mortgage_amount * rate
}

/// Monthly housing and debt costs going into the ratios
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HousingCosts {
    pub qualifying_payment: f64,
    pub property_tax: f64,
    pub heat: f64,
    #[serde(default)]
    pub rent: f64,
    #[serde(default)]
    pub other_debt: f64,
}

impl HousingCosts {
    fn housing(&self) -> f64 {
        self.qualifying_payment + self.property_tax + self.heat + self.rent
    }
}

/// Gross and total debt service, as percentages rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtServiceRatios {
    pub gds: f64,
    pub tds: f64,
}

/// GDS and TDS for an annual income
///
/// Returns `None` when income is missing, zero, negative or not finite.
pub fn debt_service_ratios(
    annual_income: Option<f64>,
    costs: &HousingCosts,
) -> Option<DebtServiceRatios> {
    let income = annual_income.filter(|i| i.is_finite() && *i > 0.0)?;
    let monthly_income = income / 12.0;

    let housing = costs.housing();
    Some(DebtServiceRatios {
        gds: round2(housing / monthly_income * 100.0),
        tds: round2((housing + costs.other_debt) / monthly_income * 100.0),
    })
}

/// Loan-to-value percentage; `None` when the price is not positive
pub fn loan_to_value(mortgage_amount: f64, purchase_price: f64) -> Option<f64> {
    if !(purchase_price.is_finite() && purchase_price > 0.0) {
        return None;
    }
    Some(round2(mortgage_amount / purchase_price * 100.0))
}

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
