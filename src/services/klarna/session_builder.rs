use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    configuration::Configuration,
    mapper::{to_address, to_amount},
};
use crate::{
    catalog::CatalogUrlResolver,
    constants::*,
    entities::{Cart, LineItem},
    errors::ServiceError,
    geo::CountryResolver,
    models::{Customer, MerchantUrls, OrderLine, Session, WidgetOptions},
    payment_methods::PaymentMethod,
    services::totals::TotalsCalculator,
};

/// Merchant hook applied to every session request after the core fields are built
pub trait SessionEnricher: Send + Sync {
    fn enrich(&self, session: Session, cart: &Cart, configuration: &Configuration) -> Session;
}

/// Copies the billing address and pre-assessment data stored on the cart
#[derive(Debug, Clone, Copy, Default)]
pub struct CartSessionEnricher;

impl SessionEnricher for CartSessionEnricher {
    fn enrich(&self, mut session: Session, cart: &Cart, _configuration: &Configuration) -> Session {
        if let Some(address) = &cart.billing_address {
            session.billing_address = Some(to_address(address));
        }
        if let Some(customer) = &cart.customer {
            session.customer = Some(Customer {
                date_of_birth: customer.date_of_birth.clone(),
                gender: customer.gender.clone(),
                title: customer.title.clone(),
                national_identification_number: customer.national_identification_number.clone(),
            });
        }
        session
    }
}

/// Assembles the Klarna session payload for a cart
#[derive(Clone)]
pub struct SessionRequestBuilder {
    totals: Arc<dyn TotalsCalculator>,
    catalog: Arc<dyn CatalogUrlResolver>,
    countries: Arc<dyn CountryResolver>,
}

impl SessionRequestBuilder {
    pub fn new(
        totals: Arc<dyn TotalsCalculator>,
        catalog: Arc<dyn CatalogUrlResolver>,
        countries: Arc<dyn CountryResolver>,
    ) -> Self {
        Self {
            totals,
            catalog,
            countries,
        }
    }

    /// Two-letter purchase country of the cart's market
    pub fn purchase_country(&self, cart: &Cart) -> Result<String, ServiceError> {
        let market_country = cart.market_country().ok_or_else(|| {
            ServiceError::UnknownCountry(format!("market {} has no countries", cart.market.market_id))
        })?;

        self.countries
            .two_letter_code(market_country)
            .ok_or_else(|| ServiceError::UnknownCountry(market_country.to_string()))
    }

    #[instrument(skip_all, fields(cart_id = %cart.id))]
    pub async fn build(
        &self,
        cart: &Cart,
        configuration: &Configuration,
        payment_method: Option<&PaymentMethod>,
    ) -> Result<Session, ServiceError> {
        let mut session = Session {
            purchase_country: self.purchase_country(cart)?,
            purchase_currency: cart.currency.clone(),
            locale: cart.market.default_language.clone(),
            ..Session::default()
        };

        if let Some(method) = payment_method {
            session.merchant_urls = Some(MerchantUrls {
                confirmation: non_empty(method.get_parameter(CONFIRMATION_URL_FIELD, "")),
                notification: non_empty(method.get_parameter(NOTIFICATION_URL_FIELD, "")),
            });
            session.options = Some(widget_options(method));
        }

        let totals = self.totals.get_totals(cart);

        session.shipping_address = cart
            .shipments
            .iter()
            .find_map(|shipment| shipment.shipping_address.as_ref())
            .map(to_address);

        for item in &cart.line_items {
            let line = self.order_line(item, configuration).await?;
            session.order_lines.push(line);
        }
        let product_lines = session.order_lines.len();

        let shipping_amount = to_amount(totals.shipping_total);
        if shipping_amount > 0 {
            session.order_lines.push(OrderLine {
                reference: None,
                name: SHIPPING_LINE_NAME.to_string(),
                quantity: 1,
                unit_price: shipping_amount,
                total_discount_amount: 0,
                total_amount: shipping_amount,
                product_url: None,
                product_image_url: None,
            });
        }

        let lines_total = session.order_lines_total().ok_or_else(|| {
            ServiceError::InvalidSession(
                "order line total exceeds the supported amount range".to_string(),
            )
        })?;
        let order_amount = to_amount(totals.total);
        let drift = order_amount - lines_total;

        if drift.abs() > rounding_tolerance(cart) {
            return Err(ServiceError::InvalidSession(format!(
                "order_amount {} does not match order line total {}",
                order_amount, lines_total
            )));
        }

        session.order_amount = order_amount;
        if drift != 0 && !absorb_rounding(&mut session.order_lines[..product_lines], drift) {
            warn!(
                order_amount,
                lines_total, "Rounding difference could not be placed on a line; using the line total"
            );
            session.order_amount = lines_total;
        }

        debug!(
            order_amount = session.order_amount,
            lines = session.order_lines.len(),
            "Session request built"
        );
        Ok(session)
    }

    async fn order_line(
        &self,
        item: &LineItem,
        configuration: &Configuration,
    ) -> Result<OrderLine, ServiceError> {
        let quantity = i64::from(item.quantity);
        let unit_price = to_amount(item.placed_price);
        let gross = unit_price.checked_mul(quantity).ok_or_else(|| {
            ServiceError::InvalidSession(format!(
                "line {} exceeds the supported amount range",
                item.code
            ))
        })?;
        let total_discount_amount = to_amount(item.discount_amount).min(gross);

        let mut line = OrderLine {
            reference: Some(item.code.clone()),
            name: item.display_name.clone(),
            quantity,
            unit_price,
            total_discount_amount,
            total_amount: gross - total_discount_amount,
            product_url: None,
            product_image_url: None,
        };

        if configuration.send_product_and_image_url {
            if let Some(link) = self.catalog.content_link(&item.code).await {
                line.product_url = Some(self.catalog.url(&link).await.unwrap_or_default());
                line.product_image_url =
                    Some(self.catalog.variant_image_url(&link).await.unwrap_or_default());
            }
        }

        Ok(line)
    }
}

/// Largest difference truncating each line to minor units can produce
/// against the truncated grand total.
fn rounding_tolerance(cart: &Cart) -> i64 {
    cart.line_items
        .iter()
        .fold(1i64, |acc, item| acc.saturating_add(i64::from(item.quantity) + 1))
}

/// Moves a rounding difference into the discount of the last product line
/// that can take it, so every line still satisfies
/// `unit_price * quantity - total_discount_amount == total_amount`.
fn absorb_rounding(lines: &mut [OrderLine], drift: i64) -> bool {
    let target = lines.iter_mut().rev().find(|line| {
        let discount = line.total_discount_amount - drift;
        discount >= 0 && discount <= line.unit_price * line.quantity
    });

    match target {
        Some(line) => {
            line.total_discount_amount -= drift;
            line.total_amount += drift;
            true
        }
        None => false,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn widget_options(method: &PaymentMethod) -> WidgetOptions {
    let color = |field: &str| method.get_parameter(field, DEFAULT_WIDGET_COLOR);

    WidgetOptions {
        color_details: color(WIDGET_COLOR_DETAILS_FIELD),
        color_button: color(WIDGET_COLOR_BUTTON_FIELD),
        color_button_text: color(WIDGET_COLOR_BUTTON_TEXT_FIELD),
        color_checkbox: color(WIDGET_COLOR_CHECKBOX_FIELD),
        color_checkbox_checkmark: color(WIDGET_COLOR_CHECKBOX_CHECKMARK_FIELD),
        color_header: color(WIDGET_COLOR_HEADER_FIELD),
        color_link: color(WIDGET_COLOR_LINK_FIELD),
        color_border: color(WIDGET_COLOR_BORDER_FIELD),
        color_border_selected: color(WIDGET_COLOR_BORDER_SELECTED_FIELD),
        color_text: color(WIDGET_COLOR_TEXT_FIELD),
        color_text_secondary: color(WIDGET_COLOR_TEXT_SECONDARY_FIELD),
        radius_border: method.get_parameter(WIDGET_RADIUS_BORDER_FIELD, DEFAULT_WIDGET_RADIUS_BORDER),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::InMemoryCatalog,
        entities::{CustomerInfo, Market, OrderAddress, Shipment},
        geo::StaticCountryResolver,
        services::totals::{DefaultTotalsCalculator, OrderTotals},
    };
    use assert_matches::assert_matches;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn builder(catalog: InMemoryCatalog) -> SessionRequestBuilder {
        SessionRequestBuilder::new(
            Arc::new(DefaultTotalsCalculator),
            Arc::new(catalog),
            Arc::new(StaticCountryResolver::new()),
        )
    }

    fn item(code: &str, price: Decimal, quantity: u32) -> LineItem {
        LineItem {
            code: code.into(),
            display_name: format!("Product {}", code),
            quantity,
            placed_price: price,
            discount_amount: Decimal::ZERO,
        }
    }

    fn address(country: &str) -> OrderAddress {
        OrderAddress {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            line1: "1 Main St".into(),
            city: "Springfield".into(),
            postal_code: "12345".into(),
            country_code: country.into(),
            ..OrderAddress::default()
        }
    }

    fn us_cart() -> Cart {
        let mut cart = Cart::new(
            Market {
                market_id: "US".into(),
                countries: vec!["USA".into()],
                default_language: "en-US".into(),
            },
            "USD",
        );
        cart.line_items = vec![item("SKU-1", dec!(10.00), 2), item("SKU-2", dec!(5.00), 1)];
        cart.shipments = vec![Shipment {
            id: Uuid::new_v4(),
            shipping_method_name: Some("Ground".into()),
            shipping_cost: dec!(3.00),
            shipping_address: Some(address("US")),
        }];
        cart
    }

    fn klarna_method() -> PaymentMethod {
        PaymentMethod::new(KLARNA_PAYMENT_SYSTEM_KEYWORD, "en-US", HashMap::new())
            .with_parameter(CONFIRMATION_URL_FIELD, "https://shop.example.com/klarna/confirm")
            .with_parameter(WIDGET_COLOR_BUTTON_FIELD, "#FF0000")
    }

    #[tokio::test]
    async fn builds_lines_and_shipping() {
        let session = builder(InMemoryCatalog::new())
            .build(&us_cart(), &Configuration::default(), None)
            .await
            .unwrap();

        assert_eq!(session.purchase_country, "US");
        assert_eq!(session.purchase_currency, "USD");
        assert_eq!(session.locale, "en-US");
        assert_eq!(session.order_amount, 2800);
        assert_eq!(session.order_lines.len(), 3);
        assert_eq!(session.order_lines[0].total_amount, 2000);
        assert_eq!(session.order_lines[2].name, SHIPPING_LINE_NAME);
        assert_eq!(session.order_lines[2].total_amount, 300);
        assert!(session.order_lines[2].reference.is_none());
        assert!(session.merchant_urls.is_none());
        assert!(session.options.is_none());
        assert_eq!(
            session.shipping_address.and_then(|a| a.country).as_deref(),
            Some("US")
        );
    }

    #[tokio::test]
    async fn free_shipping_adds_no_line() {
        let mut cart = us_cart();
        cart.shipments[0].shipping_cost = Decimal::ZERO;

        let session = builder(InMemoryCatalog::new())
            .build(&cart, &Configuration::default(), None)
            .await
            .unwrap();

        assert_eq!(session.order_lines.len(), 2);
        assert_eq!(session.order_amount, 2500);
    }

    #[tokio::test]
    async fn payment_method_supplies_urls_and_widget() {
        let method = klarna_method();
        let session = builder(InMemoryCatalog::new())
            .build(&us_cart(), &Configuration::default(), Some(&method))
            .await
            .unwrap();

        let urls = session.merchant_urls.unwrap();
        assert_eq!(
            urls.confirmation.as_deref(),
            Some("https://shop.example.com/klarna/confirm")
        );
        assert!(urls.notification.is_none());

        let options = session.options.unwrap();
        assert_eq!(options.color_button, "#FF0000");
        assert_eq!(options.color_details, DEFAULT_WIDGET_COLOR);
        assert_eq!(options.radius_border, DEFAULT_WIDGET_RADIUS_BORDER);
    }

    #[tokio::test]
    async fn product_urls_when_enabled() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(
            "SKU-1",
            "https://shop.example.com/p/sku-1",
            vec!["https://cdn.example.com/sku-1.png".into()],
        );
        catalog.insert("SKU-2", "https://shop.example.com/p/sku-2", vec![]);
        let configuration = Configuration {
            send_product_and_image_url: true,
            ..Configuration::default()
        };

        let mut cart = us_cart();
        cart.line_items.push(item("SKU-3", dec!(1.00), 1));
        let session = builder(catalog).build(&cart, &configuration, None).await.unwrap();

        let lines = &session.order_lines;
        assert_eq!(
            lines[0].product_image_url.as_deref(),
            Some("https://cdn.example.com/sku-1.png")
        );
        assert_eq!(lines[1].product_image_url.as_deref(), Some(""));
        assert!(lines[2].product_url.is_none());
    }

    #[tokio::test]
    async fn unknown_market_country_is_rejected() {
        let mut cart = us_cart();
        cart.market.countries = vec!["XXX".into()];
        assert_matches!(
            builder(InMemoryCatalog::new())
                .build(&cart, &Configuration::default(), None)
                .await,
            Err(ServiceError::UnknownCountry(code)) if code == "XXX"
        );

        cart.market.countries.clear();
        assert_matches!(
            builder(InMemoryCatalog::new())
                .build(&cart, &Configuration::default(), None)
                .await,
            Err(ServiceError::UnknownCountry(_))
        );
    }

    struct InflatedTotals;

    impl TotalsCalculator for InflatedTotals {
        fn get_totals(&self, cart: &Cart) -> OrderTotals {
            let mut totals = DefaultTotalsCalculator.get_totals(cart);
            totals.total += dec!(1.00);
            totals
        }
    }

    #[tokio::test]
    async fn amount_mismatch_is_rejected() {
        let builder = SessionRequestBuilder::new(
            Arc::new(InflatedTotals),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(StaticCountryResolver::new()),
        );

        assert_matches!(
            builder.build(&us_cart(), &Configuration::default(), None).await,
            Err(ServiceError::InvalidSession(_))
        );
    }

    fn assert_lines_consistent(session: &Session) {
        for line in &session.order_lines {
            assert_eq!(
                line.unit_price * line.quantity - line.total_discount_amount,
                line.total_amount,
                "line {}",
                line.name
            );
        }
        assert_eq!(session.order_lines_total(), Some(session.order_amount));
    }

    #[tokio::test]
    async fn percentage_discounts_reconcile_to_grand_total() {
        let mut cart = us_cart();
        cart.shipments[0].shipping_cost = Decimal::ZERO;
        cart.line_items = (1..=3)
            .map(|n| LineItem {
                discount_amount: dec!(3.3333),
                ..item(&format!("SKU-{}", n), dec!(9.99), 1)
            })
            .collect();

        let session = builder(InMemoryCatalog::new())
            .build(&cart, &Configuration::default(), None)
            .await
            .unwrap();

        assert_eq!(session.order_amount, 1997);
        assert_eq!(session.order_lines[0].total_amount, 666);
        assert_eq!(session.order_lines[2].total_amount, 665);
        assert_eq!(session.order_lines[2].total_discount_amount, 334);
        assert_lines_consistent(&session);
    }

    #[tokio::test]
    async fn sub_cent_prices_without_discount_use_line_total() {
        let mut cart = us_cart();
        cart.line_items = vec![item("SKU-1", dec!(9.995), 2)];

        let session = builder(InMemoryCatalog::new())
            .build(&cart, &Configuration::default(), None)
            .await
            .unwrap();

        assert_eq!(session.order_amount, 1998 + 300);
        assert_lines_consistent(&session);
    }

    #[tokio::test]
    async fn oversized_amounts_are_rejected() {
        let mut cart = us_cart();
        cart.line_items = vec![
            item("SKU-1", dec!(100000000000000000), 1),
            item("SKU-2", dec!(100000000000000000), 1),
        ];

        assert_matches!(
            builder(InMemoryCatalog::new())
                .build(&cart, &Configuration::default(), None)
                .await,
            Err(ServiceError::InvalidSession(_))
        );

        cart.line_items = vec![item("SKU-1", dec!(100000000000000000), 3)];
        assert_matches!(
            builder(InMemoryCatalog::new())
                .build(&cart, &Configuration::default(), None)
                .await,
            Err(ServiceError::InvalidSession(_))
        );
    }

    #[tokio::test]
    async fn shipping_only_cart() {
        let mut cart = us_cart();
        cart.line_items.clear();

        let session = builder(InMemoryCatalog::new())
            .build(&cart, &Configuration::default(), None)
            .await
            .unwrap();

        assert_eq!(session.order_lines.len(), 1);
        assert_eq!(session.order_amount, 300);
    }

    #[test]
    fn enricher_copies_billing_and_customer() {
        let mut cart = us_cart();
        cart.billing_address = Some(address("US"));
        cart.customer = Some(CustomerInfo {
            date_of_birth: Some("1980-01-01".into()),
            ..CustomerInfo::default()
        });

        let session = CartSessionEnricher.enrich(Session::default(), &cart, &Configuration::default());
        assert_eq!(
            session.billing_address.and_then(|a| a.given_name).as_deref(),
            Some("Jane")
        );
        assert_eq!(
            session.customer.and_then(|c| c.date_of_birth).as_deref(),
            Some("1980-01-01")
        );
    }
}
