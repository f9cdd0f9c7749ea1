//! Money calculation utilities using rust_decimal for precision
//!
//! All monetary arithmetic runs on `Decimal`; storage is integer cents so
//! repeated additions never accumulate binary-float drift.

use rust_decimal::prelude::*;

use crate::error::{AppError, AppResult};

/// Rounding: 2 decimal places, half-up
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed catalog price per item (€1,000,000)
pub const MAX_PRICE: i64 = 100_000_000; // cents
/// Maximum allowed quantity per order line
pub const MAX_QUANTITY: i64 = 9999;

/// Round to 2 decimal places, half-up
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Integer cents -> 2-dp decimal
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, DECIMAL_PLACES)
}

/// Decimal amount -> integer cents (rounds half-up to 2 dp first)
pub fn to_cents(value: Decimal) -> i64 {
    let rounded = round2(value) * Decimal::ONE_HUNDRED;
    rounded.to_i64().unwrap_or(0)
}

/// Subtotal of one order line: quantity × captured price
pub fn line_subtotal(quantity: i64, price_cents: i64) -> Decimal {
    Decimal::from(quantity) * from_cents(price_cents)
}

/// Validate a catalog price (non-negative, bounded)
pub fn validate_price(price: Decimal) -> AppResult<i64> {
    if price.is_sign_negative() {
        return Err(AppError::validation(format!(
            "Price must be non-negative, got {price}"
        )));
    }
    // Bound-check on the Decimal itself: cents conversion saturates and
    // would let an over-wide value slip past as 0
    if round2(price) > from_cents(MAX_PRICE) {
        return Err(AppError::validation(format!(
            "Price exceeds maximum allowed, got {price}"
        )));
    }
    Ok(to_cents(price))
}

/// Validate an order line quantity (positive, bounded)
pub fn validate_quantity(quantity: i64) -> AppResult<()> {
    if quantity < 1 {
        return Err(AppError::validation(format!(
            "Quantity must be a positive integer, got {quantity}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(AppError::validation(format!(
            "Quantity exceeds maximum allowed ({MAX_QUANTITY}), got {quantity}"
        )));
    }
    Ok(())
}
