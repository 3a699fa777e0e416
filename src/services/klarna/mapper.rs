//! Conversions from cart values to the Klarna wire representation.

use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{entities::OrderAddress, models::Address};

pub fn to_address(address: &OrderAddress) -> Address {
    Address {
        given_name: Some(address.first_name.clone()),
        family_name: Some(address.last_name.clone()),
        organization_name: address.organization.clone(),
        email: address.email.clone(),
        street_address: Some(address.line1.clone()),
        street_address2: address.line2.clone(),
        postal_code: Some(address.postal_code.clone()),
        city: Some(address.city.clone()),
        region: address.region_name.clone(),
        phone: address.phone_number.clone(),
        country: Some(address.country_code.clone()),
    }
}

/// Minor units, truncated toward zero. Non-positive amounts map to 0 and
/// amounts beyond the wire range saturate at `i64::MAX`.
pub fn to_amount(amount: Decimal) -> i64 {
    if amount <= Decimal::ZERO {
        return 0;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|minor| minor.trunc().to_i64())
        .unwrap_or(i64::MAX)
}
