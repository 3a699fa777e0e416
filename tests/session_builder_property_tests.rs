mod common;

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use common::{address, us_cart};
use stateset_klarna_payments::{
    catalog::InMemoryCatalog,
    constants::SHIPPING_LINE_NAME,
    entities::{LineItem, Shipment},
    geo::StaticCountryResolver,
    services::{
        klarna::{mapper::to_amount, Configuration, SessionRequestBuilder},
        totals::{DefaultTotalsCalculator, TotalsCalculator},
    },
};

fn builder() -> SessionRequestBuilder {
    SessionRequestBuilder::new(
        Arc::new(DefaultTotalsCalculator),
        Arc::new(InMemoryCatalog::new()),
        Arc::new(StaticCountryResolver::new()),
    )
}

/// (price mantissa, price scale, quantity, discount in percent of the line)
fn line_strategy() -> impl Strategy<Value = (i64, u32, u32, u32)> {
    (0i64..50_000_000, 2u32..=4, 1u32..20, 0u32..=100)
}

fn to_line(index: usize, (mantissa, scale, quantity, discount_pct): (i64, u32, u32, u32)) -> LineItem {
    let price = Decimal::new(mantissa, scale);
    let gross = price * Decimal::from(quantity);
    LineItem {
        code: format!("SKU-{}", index),
        display_name: format!("Product {}", index),
        quantity,
        placed_price: price,
        discount_amount: gross * Decimal::from(discount_pct) / Decimal::ONE_HUNDRED,
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn order_amount_always_equals_line_total(
        lines in prop::collection::vec(line_strategy(), 0..8),
        shipping_mantissa in 0i64..100_000,
        shipping_scale in 2u32..=4,
    ) {
        let mut cart = us_cart();
        cart.line_items = lines.into_iter().enumerate().map(|(i, l)| to_line(i, l)).collect();
        cart.shipments = vec![Shipment {
            id: Uuid::new_v4(),
            shipping_method_name: None,
            shipping_cost: Decimal::new(shipping_mantissa, shipping_scale),
            shipping_address: Some(address("US")),
        }];

        let session = runtime()
            .block_on(builder().build(&cart, &Configuration::default(), None))
            .unwrap();

        prop_assert_eq!(session.order_lines_total(), Some(session.order_amount));
        prop_assert!(session.order_amount >= 0);
        for line in &session.order_lines {
            prop_assert_eq!(
                line.unit_price * line.quantity - line.total_discount_amount,
                line.total_amount
            );
            prop_assert!(line.total_discount_amount >= 0);
        }

        let grand_total = to_amount(DefaultTotalsCalculator.get_totals(&cart).total);
        let rounding: i64 = cart.line_items.iter().map(|i| i64::from(i.quantity) + 1).sum::<i64>() + 1;
        prop_assert!((session.order_amount - grand_total).abs() <= rounding);
        if cart.line_items.is_empty() {
            prop_assert_eq!(session.order_amount, grand_total);
        }
    }

    #[test]
    fn shipping_line_only_for_paid_shipping(shipping_cents in 0i64..2_000) {
        let mut cart = us_cart();
        cart.shipments[0].shipping_cost = Decimal::new(shipping_cents, 2);

        let session = runtime()
            .block_on(builder().build(&cart, &Configuration::default(), None))
            .unwrap();

        let shipping_lines: Vec<_> = session
            .order_lines
            .iter()
            .filter(|line| line.name == SHIPPING_LINE_NAME)
            .collect();
        if shipping_cents > 0 {
            prop_assert_eq!(shipping_lines.len(), 1);
            prop_assert_eq!(shipping_lines[0].total_amount, shipping_cents);
            prop_assert_eq!(session.order_lines.last().map(|l| l.name.as_str()), Some(SHIPPING_LINE_NAME));
        } else {
            prop_assert!(shipping_lines.is_empty());
        }
    }
}
