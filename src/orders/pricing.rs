//! Authoritative order pricing.
//!
//! `tax` and `total` are rounded to 2 decimal places, half away from zero.
//! `subtotal` keeps full precision until the derived values are computed.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use thiserror::Error;

use super::menu::ValidatedLine;

pub const TAX_RATE: Decimal = dec!(0.05);
pub const DELIVERY_FEE: Decimal = dec!(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pricing {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub delivery_fee: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PricingError {
    #[error("Order amount is out of range")]
    Overflow,
    #[error("Item {item_id} has a negative price")]
    NegativePrice { item_id: i32 },
}

pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn price(lines: &[ValidatedLine]) -> Result<Pricing, PricingError> {
    let mut subtotal = Decimal::ZERO;
    for line in lines {
        if line.price.is_sign_negative() {
            return Err(PricingError::NegativePrice {
                item_id: line.item_id,
            });
        }
        let amount = line
            .price
            .checked_mul(Decimal::from(line.quantity))
            .ok_or(PricingError::Overflow)?;
        subtotal = subtotal
            .checked_add(amount)
            .ok_or(PricingError::Overflow)?;
    }

    let tax = round2(
        subtotal
            .checked_mul(TAX_RATE)
            .ok_or(PricingError::Overflow)?,
    );
    let total = subtotal
        .checked_add(tax)
        .and_then(|sum| sum.checked_add(DELIVERY_FEE))
        .map(round2)
        .ok_or(PricingError::Overflow)?;

    Ok(Pricing {
        subtotal,
        tax,
        delivery_fee: DELIVERY_FEE,
        total,
    })
}

/// Client totals are advisory: they must agree with the server after the same
/// rounding, and are never stored.
pub fn matches_client_total(pricing: &Pricing, client_total: Decimal) -> bool {
    round2(client_total) == pricing.total
}
