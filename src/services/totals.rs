use rust_decimal::Decimal;
use serde::Serialize;

use crate::entities::Cart;

/// Cart totals in the cart currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub sub_total: Decimal,
    pub shipping_total: Decimal,
    pub discount_total: Decimal,
    pub total: Decimal,
}

pub trait TotalsCalculator: Send + Sync {
    fn get_totals(&self, cart: &Cart) -> OrderTotals;
}

/// Sums extended line prices and shipment costs. No taxes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTotalsCalculator;

impl TotalsCalculator for DefaultTotalsCalculator {
    fn get_totals(&self, cart: &Cart) -> OrderTotals {
        let sub_total: Decimal = cart.line_items.iter().map(|item| item.extended_price()).sum();
        let discount_total: Decimal = cart
            .line_items
            .iter()
            .map(|item| item.discount_amount.max(Decimal::ZERO))
            .sum();
        let shipping_total = cart
            .shipments
            .iter()
            .map(|shipment| shipment.shipping_cost)
            .sum::<Decimal>()
            .max(Decimal::ZERO);

        OrderTotals {
            sub_total,
            shipping_total,
            discount_total,
            total: sub_total + shipping_total,
        }
    }
}
