//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic is done with `Decimal` internally and converted
//! back to `f64` (2 decimal places, midpoint-away-from-zero) for storage
//! and serialization. `recompute` is a pure function: identical inputs
//! always yield an identical snapshot, which reactivation and the refund
//! round-trip rely on.

use rust_decimal::prelude::*;
use shared::models::{FinancialSnapshot, OrderItem, PaymentMethod, Refund};

use super::error::OrderError;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Bank transfer surcharge rate (4%)
const BANK_TRANSFER_FEE_RATE: Decimal = Decimal::from_parts(4, 0, 0, false, 2);

/// Maximum allowed monetary amount per field ($1,000,000)
const MAX_AMOUNT: f64 = 1_000_000.0;
/// Maximum allowed quantity per line
const MAX_QUANTITY: i32 = 9999;

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
pub fn require_finite(value: f64, field_name: &str) -> Result<(), OrderError> {
    if !value.is_finite() {
        return Err(OrderError::Validation(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a monetary amount: finite, non-negative, within bounds
pub fn validate_amount(value: f64, field_name: &str) -> Result<(), OrderError> {
    require_finite(value, field_name)?;
    if value < 0.0 {
        return Err(OrderError::Validation(format!(
            "{} must be non-negative, got {}",
            field_name, value
        )));
    }
    if value > MAX_AMOUNT {
        return Err(OrderError::Validation(format!(
            "{} exceeds maximum allowed ({}), got {}",
            field_name, MAX_AMOUNT, value
        )));
    }
    Ok(())
}

/// Validate a line quantity: positive, within bounds
pub fn validate_quantity(quantity: i32) -> Result<(), OrderError> {
    if quantity <= 0 {
        return Err(OrderError::Validation(format!(
            "quantity must be positive, got {}",
            quantity
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(OrderError::Validation(format!(
            "quantity exceeds maximum allowed ({}), got {}",
            MAX_QUANTITY, quantity
        )));
    }
    Ok(())
}

/// Convert f64 to Decimal for calculation
///
/// Input values should be pre-validated via `require_finite()` at the
/// boundary. If NaN/Infinity somehow reaches here, logs an error and
/// returns ZERO to avoid silent data corruption.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    round(value)
        .to_f64()
        // SAFETY: Decimal rounded to 2dp with inputs bounded by MAX_AMOUNT
        // is always within f64 representable range
        .expect("Decimal rounded to 2dp is always representable as f64")
}

/// Round to monetary precision
#[inline]
pub fn round(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Compare two monetary values for equality (within 0.01 tolerance)
pub fn money_eq(a: f64, b: f64) -> bool {
    let diff = (to_decimal(a) - to_decimal(b)).abs();
    diff < MONEY_TOLERANCE
}

/// Derive the materialized line fields from unit price/cost and quantity
///
/// `sub_total = price * qty`, `cogs = cost * qty`, margin is the
/// difference. Manual overrides (`update_all`) write these fields
/// directly instead and back-derive the unit values.
pub fn sync_line(item: &mut OrderItem) {
    let quantity = Decimal::from(item.quantity);
    let sub_total = round(to_decimal(item.price_usd_at_purchase) * quantity);
    let cogs = round(to_decimal(item.cost_usd_at_purchase) * quantity);

    item.sub_total = to_f64(sub_total);
    item.cogs_usd = to_f64(cogs);
    item.contribution_margin_usd = to_f64(sub_total - cogs);
}

/// Sum of item quantities (physical units)
pub fn items_count(items: &[OrderItem]) -> i32 {
    items.iter().map(|i| i.quantity).sum()
}

/// Recompute the order-level financial snapshot from its item list
///
/// Order totals roll up from the materialized line fields so that manual
/// line overrides flow through without re-derivation.
pub fn recompute(
    items: &[OrderItem],
    exchange_rate: f64,
    payment_method: PaymentMethod,
    refund: Option<&Refund>,
) -> FinancialSnapshot {
    let sub_total: Decimal = items.iter().map(|i| to_decimal(i.sub_total)).sum();
    recompute_with_subtotal(to_f64(sub_total), items, exchange_rate, payment_method, refund)
}

/// Recompute the financial snapshot with an explicit subtotal
///
/// Used by refund cancellation, which restores the exact pre-refund
/// subtotal instead of re-deriving it from the item list.
pub fn recompute_with_subtotal(
    sub_total: f64,
    items: &[OrderItem],
    exchange_rate: f64,
    payment_method: PaymentMethod,
    refund: Option<&Refund>,
) -> FinancialSnapshot {
    let sub_total = to_decimal(sub_total);
    let total_cogs: Decimal = items.iter().map(|i| to_decimal(i.cogs_usd)).sum();

    let bank_transfer_expense = match payment_method {
        PaymentMethod::BankTransfer => Some(round(sub_total * BANK_TRANSFER_FEE_RATE)),
        _ => None,
    };

    let applied_refund = refund
        .map(|r| to_decimal(r.applied_amount))
        .unwrap_or(Decimal::ZERO);

    let total_amount =
        sub_total + bank_transfer_expense.unwrap_or(Decimal::ZERO) - applied_refund;
    let total_amount_ars = round(total_amount) * to_decimal(exchange_rate);

    let margin = sub_total - total_cogs - applied_refund;
    // Guard the percentage against an empty/zeroed order
    let margin_percentage = if sub_total.is_zero() {
        Decimal::ZERO
    } else {
        margin / sub_total * Decimal::ONE_HUNDRED
    };

    FinancialSnapshot {
        sub_total: to_f64(sub_total),
        total_amount: to_f64(total_amount),
        total_amount_ars: to_f64(total_amount_ars),
        total_cogs_usd: to_f64(total_cogs),
        total_contribution_margin_usd: to_f64(margin),
        contribution_margin_percentage: to_f64(margin_percentage),
        bank_transfer_expense: bank_transfer_expense.map(to_f64),
    }
}
