//! Money calculation utilities using rust_decimal for precision
//!
//! Totals are summed as `Decimal` and converted back to `f64` for storage,
//! so `0.1 + 0.2` style drift never reaches a total comparison.
//! Validation paths use the checked variants; display totals saturate.

use rust_decimal::prelude::*;
use shared::order::{CartLine, OrderItem};

/// Rounding strategy for monetary values (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// `None` for NaN, infinities and magnitudes a `Decimal` cannot hold
pub fn to_decimal(value: f64) -> Option<Decimal> {
    Decimal::from_f64(value)
}

pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// unit price × quantity, `None` on overflow
pub fn line_total(unit_price: f64, quantity: u32) -> Option<Decimal> {
    to_decimal(unit_price)?.checked_mul(Decimal::from(quantity))
}

/// Checked sum of every line, `None` if any step overflows
pub fn items_total(items: &[OrderItem]) -> Option<Decimal> {
    items.iter().try_fold(Decimal::ZERO, |acc, i| {
        acc.checked_add(line_total(i.unit_price, i.quantity)?)
    })
}

/// Display total of the cart; saturates instead of overflowing
pub fn cart_total(lines: &[CartLine]) -> f64 {
    to_f64(lines.iter().fold(Decimal::ZERO, |acc, l| {
        acc.saturating_add(line_total(l.unit_price, l.quantity).unwrap_or(Decimal::MAX))
    }))
}

/// Saturating sum; unrepresentable values are skipped
pub fn sum(values: impl IntoIterator<Item = f64>) -> f64 {
    to_f64(
        values
            .into_iter()
            .filter_map(to_decimal)
            .fold(Decimal::ZERO, Decimal::saturating_add),
    )
}

/// Equal within [`MONEY_TOLERANCE`]
pub fn money_eq(a: Decimal, b: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() < MONEY_TOLERANCE)
}
