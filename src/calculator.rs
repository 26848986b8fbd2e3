//! Pricing calculator for jobs.
//!
//! Pure arithmetic over a job's cost inputs: total cost, suggested prices and
//! profit figures. The output is saved verbatim onto the job record and never
//! recomputed when other job fields change.

use crate::models::Calculator;

/// Round a currency amount to two decimals.
///
/// Derived prices pass through a two-decimal money field before being stored,
/// so the derivation rounds the same way.
#[must_use]
pub fn round_money(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Parse a user-entered amount, defaulting to 0 on anything non-numeric.
#[must_use]
pub fn parse_amount(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Treat non-finite values as 0 so a bad input can never poison a sum.
fn amount(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Compute cost totals and derived prices for a set of calculator inputs.
///
/// `total_cost` is the sum of all seven cost fields. `price_without_iva` is
/// derived from the total cost and profit margin only when not already
/// supplied (zero counts as unset) and there is a positive cost to price;
/// `final_price` is likewise derived from the (possibly just derived) net
/// price and the tax percentage only when unset. User-supplied prices are
/// never overwritten.
#[must_use]
pub fn compute_totals(inputs: &Calculator) -> Calculator {
    let mut result = inputs.clone();

    result.publicity = amount(result.publicity);
    result.services = amount(result.services);
    result.transport = amount(result.transport);
    result.provider_cost = amount(result.provider_cost);
    result.packaging_cost = amount(result.packaging_cost);
    result.design_cost = amount(result.design_cost);
    result.installation_cost = amount(result.installation_cost);
    result.profit_margin = amount(result.profit_margin);
    result.iva = amount(result.iva);
    result.price_without_iva = amount(result.price_without_iva);
    result.final_price = amount(result.final_price);

    result.total_cost = result.publicity
        + result.services
        + result.transport
        + result.provider_cost
        + result.packaging_cost
        + result.design_cost
        + result.installation_cost;

    if result.price_without_iva == 0.0 && result.total_cost > 0.0 {
        result.price_without_iva =
            round_money(result.total_cost * (1.0 + result.profit_margin / 100.0));
    }

    if result.final_price == 0.0 && result.price_without_iva > 0.0 {
        result.final_price =
            round_money(result.price_without_iva * (1.0 + result.iva / 100.0));
    }

    result
}

/// Absolute profit: final price minus total cost.
#[must_use]
pub fn profit(calc: &Calculator) -> f64 {
    calc.final_price - calc.total_cost
}

/// Profit percentage over total cost, as shown in the live calculator view.
///
/// Returns 0 when there is no cost to divide by. Note this deliberately
/// differs from [`margin_on_price`], which the details view and reports use;
/// both formulas exist in the product and are kept apart here by name.
#[must_use]
pub fn margin_on_cost(calc: &Calculator) -> f64 {
    if calc.total_cost > 0.0 {
        profit(calc) / calc.total_cost * 100.0
    } else {
        0.0
    }
}

/// Profit percentage over final price, as shown in the job details view and
/// used by reporting.
#[must_use]
pub fn margin_on_price(calc: &Calculator) -> f64 {
    if calc.final_price > 0.0 {
        profit(calc) / calc.final_price * 100.0
    } else {
        0.0
    }
}
