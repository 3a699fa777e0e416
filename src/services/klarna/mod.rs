/*!
 * # Klarna Payments integration
 *
 * Keeps a cart in sync with its Klarna Payments session, turns an authorized
 * session into a Klarna order and applies asynchronous fraud decisions to
 * placed orders.
 *
 * Configuration is read from the `KlarnaPayments` payment method on every
 * operation, so one `KlarnaService` can be shared across requests.
 */

pub mod configuration;
pub mod fraud;
pub mod mapper;
pub mod order_finalizer;
pub mod personal_information;
pub mod session_builder;
pub mod session_sync;

use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    catalog::CatalogUrlResolver,
    clients::KlarnaPaymentsApi,
    constants::KLARNA_PAYMENT_SYSTEM_KEYWORD,
    entities::{Cart, PurchaseOrder},
    errors::ServiceError,
    geo::CountryResolver,
    models::Session,
    payment_methods::{PaymentMethod, PaymentMethodRepository},
    repositories::OrderRepository,
    services::{
        order_numbers::OrderNumberGenerator, payment_processor::PaymentProcessor,
        totals::TotalsCalculator,
    },
};

pub use configuration::Configuration;
pub use fraud::FraudUpdateOutcome;
pub use session_builder::{CartSessionEnricher, SessionEnricher, SessionRequestBuilder};

pub struct KlarnaService {
    api: Arc<dyn KlarnaPaymentsApi>,
    repository: Arc<dyn OrderRepository>,
    countries: Arc<dyn CountryResolver>,
    payment_methods: Arc<dyn PaymentMethodRepository>,
    order_numbers: Arc<dyn OrderNumberGenerator>,
    payment_processor: Arc<dyn PaymentProcessor>,
    enricher: Arc<dyn SessionEnricher>,
    builder: SessionRequestBuilder,
}

impl KlarnaService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        api: Arc<dyn KlarnaPaymentsApi>,
        totals: Arc<dyn TotalsCalculator>,
        repository: Arc<dyn OrderRepository>,
        catalog: Arc<dyn CatalogUrlResolver>,
        countries: Arc<dyn CountryResolver>,
        payment_methods: Arc<dyn PaymentMethodRepository>,
        order_numbers: Arc<dyn OrderNumberGenerator>,
        payment_processor: Arc<dyn PaymentProcessor>,
        enricher: Arc<dyn SessionEnricher>,
    ) -> Self {
        let builder = SessionRequestBuilder::new(totals, catalog, countries.clone());
        Self {
            api,
            repository,
            countries,
            payment_methods,
            order_numbers,
            payment_processor,
            enricher,
            builder,
        }
    }

    pub fn client_token<'a>(&self, cart: &'a Cart) -> Option<&'a str> {
        cart.client_token()
    }

    pub fn session_id<'a>(&self, cart: &'a Cart) -> Option<&'a str> {
        cart.session_id()
    }

    #[instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> Result<Session, ServiceError> {
        self.api.get_session(session_id).await.map_err(|e| {
            error!(error = %e, session_id, "Failed to fetch Klarna session");
            ServiceError::from(e)
        })
    }

    /// Stored Klarna confirmation page of a placed order, if any
    pub fn confirmation_url(&self, order: &PurchaseOrder) -> Option<String> {
        order
            .payments
            .iter()
            .filter(|payment| payment.payment_method_name == KLARNA_PAYMENT_SYSTEM_KEYWORD)
            .find_map(|payment| {
                payment
                    .confirmation_url
                    .as_deref()
                    .filter(|url| !url.trim().is_empty())
                    .map(str::to_string)
            })
    }

    pub fn payment_method(&self, cart: &Cart) -> Option<PaymentMethod> {
        self.payment_methods
            .get_by_system_name(KLARNA_PAYMENT_SYSTEM_KEYWORD, &cart.market.default_language)
    }

    /// Payment method and switches in effect for this cart right now
    fn configuration_for(
        &self,
        cart: &Cart,
    ) -> Result<(Configuration, Option<PaymentMethod>), ServiceError> {
        let method = self.payment_method(cart);
        let configuration = Configuration::from_payment_method(method.as_ref())?;
        Ok((configuration, method))
    }
}
