//! Shared fixtures for the Klarna integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use stateset_klarna_payments::{
    catalog::InMemoryCatalog,
    clients::{KlarnaApiError, KlarnaPaymentsApi},
    constants::*,
    entities::{Cart, CustomerInfo, LineItem, Market, OrderAddress, Shipment},
    geo::StaticCountryResolver,
    models::{CreateOrderResponse, CreateSessionResponse, Session},
    payment_methods::{InMemoryPaymentMethodRepository, PaymentMethod, PaymentMethodRepository},
    repositories::InMemoryOrderRepository,
    services::{
        klarna::{CartSessionEnricher, KlarnaService},
        order_numbers::OrderNumberGenerator,
        payment_processor::FraudAwarePaymentProcessor,
        totals::DefaultTotalsCalculator,
    },
    AppState,
};

/// A call received by [`FakeKlarnaApi`]
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateSession(Session),
    UpdateSession(String, Session),
    GetSession(String),
    CreateOrder(String, Session),
    CancelAuthorization(String),
}

/// In-process stand-in for Klarna that keeps sessions in memory and records calls
#[derive(Default)]
pub struct FakeKlarnaApi {
    calls: Mutex<Vec<ApiCall>>,
    sessions: Mutex<HashMap<String, Session>>,
    created: AtomicUsize,
    next_update_error: Mutex<Option<KlarnaApiError>>,
    next_create_error: Mutex<Option<KlarnaApiError>>,
    next_cancel_error: Mutex<Option<KlarnaApiError>>,
}

impl FakeKlarnaApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> usize {
        self.count(|call| matches!(call, ApiCall::CreateSession(_)))
    }

    pub fn update_calls(&self) -> usize {
        self.count(|call| matches!(call, ApiCall::UpdateSession(..)))
    }

    fn count(&self, predicate: impl Fn(&ApiCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn remote_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(session_id).cloned()
    }

    /// Registers a session as if it had been created earlier
    pub fn seed_session(&self, session_id: &str, session: Session) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.to_string(), session);
    }

    /// Drops a session as Klarna does when it expires
    pub fn expire_session(&self, session_id: &str) {
        self.sessions.lock().unwrap().remove(session_id);
    }

    pub fn fail_next_update(&self, error: KlarnaApiError) {
        *self.next_update_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_create(&self, error: KlarnaApiError) {
        *self.next_create_error.lock().unwrap() = Some(error);
    }

    pub fn fail_next_cancel(&self, error: KlarnaApiError) {
        *self.next_cancel_error.lock().unwrap() = Some(error);
    }

    fn record(&self, call: ApiCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl KlarnaPaymentsApi for FakeKlarnaApi {
    async fn create_session(
        &self,
        session: &Session,
    ) -> Result<CreateSessionResponse, KlarnaApiError> {
        self.record(ApiCall::CreateSession(session.clone()));
        if let Some(error) = self.next_create_error.lock().unwrap().take() {
            return Err(error);
        }

        let number = self.created.fetch_add(1, Ordering::SeqCst) + 1;
        let session_id = format!("sess-{}", number);
        self.sessions
            .lock()
            .unwrap()
            .insert(session_id.clone(), session.clone());
        Ok(CreateSessionResponse {
            session_id,
            client_token: format!("token-{}", number),
        })
    }

    async fn update_session(
        &self,
        session_id: &str,
        session: &Session,
    ) -> Result<(), KlarnaApiError> {
        self.record(ApiCall::UpdateSession(session_id.to_string(), session.clone()));
        if let Some(error) = self.next_update_error.lock().unwrap().take() {
            return Err(error);
        }

        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(session_id) {
            Some(stored) => {
                *stored = session.clone();
                Ok(())
            }
            None => Err(KlarnaApiError::NotFound(format!("sessions/{}", session_id))),
        }
    }

    async fn get_session(&self, session_id: &str) -> Result<Session, KlarnaApiError> {
        self.record(ApiCall::GetSession(session_id.to_string()));
        self.remote_session(session_id)
            .ok_or_else(|| KlarnaApiError::NotFound(format!("sessions/{}", session_id)))
    }

    async fn create_order(
        &self,
        authorization_token: &str,
        session: &Session,
    ) -> Result<CreateOrderResponse, KlarnaApiError> {
        self.record(ApiCall::CreateOrder(
            authorization_token.to_string(),
            session.clone(),
        ));
        if authorization_token == "expired-token" {
            return Err(KlarnaApiError::NotFound(format!(
                "authorizations/{}/order",
                authorization_token
            )));
        }
        Ok(CreateOrderResponse {
            order_id: format!("kl-order-{}", authorization_token),
            redirect_url: Some("https://payments.klarna.com/redirect/abc".to_string()),
            fraud_status: None,
        })
    }

    async fn cancel_authorization(&self, authorization_token: &str) -> Result<(), KlarnaApiError> {
        self.record(ApiCall::CancelAuthorization(authorization_token.to_string()));
        match self.next_cancel_error.lock().unwrap().take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

/// Always hands out the same merchant reference
pub struct FixedOrderNumbers(pub &'static str);

impl OrderNumberGenerator for FixedOrderNumbers {
    fn generate_order_number(&self, _cart: &Cart) -> String {
        self.0.to_string()
    }
}

pub fn klarna_method(language: &str) -> PaymentMethod {
    PaymentMethod::new(KLARNA_PAYMENT_SYSTEM_KEYWORD, language, HashMap::new())
        .with_parameter(
            CONFIRMATION_URL_FIELD,
            "https://shop.example.com/klarna/confirm",
        )
        .with_parameter(
            NOTIFICATION_URL_FIELD,
            "https://shop.example.com/klarna/notifications/fraud",
        )
}

pub fn address(country: &str) -> OrderAddress {
    OrderAddress {
        first_name: "Jane".into(),
        last_name: "Doe".into(),
        line1: "1 Main St".into(),
        city: "Springfield".into(),
        postal_code: "12345".into(),
        country_code: country.into(),
        email: Some("jane@example.com".into()),
        ..OrderAddress::default()
    }
}

pub fn line_item(code: &str, price: Decimal, quantity: u32) -> LineItem {
    LineItem {
        code: code.into(),
        display_name: format!("Product {}", code),
        quantity,
        placed_price: price,
        discount_amount: Decimal::ZERO,
    }
}

/// US cart: $10 x 2, $5 x 1 and $3 shipping
pub fn us_cart() -> Cart {
    let mut cart = Cart::new(
        Market {
            market_id: "US".into(),
            countries: vec!["USA".into()],
            default_language: "en-US".into(),
        },
        "USD",
    );
    cart.line_items = vec![
        line_item("SKU-1", dec!(10.00), 2),
        line_item("SKU-2", dec!(5.00), 1),
    ];
    cart.shipments = vec![Shipment {
        id: Uuid::new_v4(),
        shipping_method_name: Some("Ground".into()),
        shipping_cost: dec!(3.00),
        shipping_address: Some(address("US")),
    }];
    cart.customer = Some(CustomerInfo {
        date_of_birth: Some("1980-01-01".into()),
        ..CustomerInfo::default()
    });
    cart
}

pub fn swedish_cart() -> Cart {
    let mut cart = us_cart();
    cart.market = Market {
        market_id: "SE".into(),
        countries: vec!["SWE".into()],
        default_language: "sv-SE".into(),
    };
    cart.currency = "SEK".into();
    cart
}

pub struct Harness {
    pub api: Arc<FakeKlarnaApi>,
    pub repository: Arc<InMemoryOrderRepository>,
    pub payment_methods: Arc<InMemoryPaymentMethodRepository>,
    pub catalog: Arc<InMemoryCatalog>,
    pub service: Arc<KlarnaService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_order_numbers(Arc::new(FixedOrderNumbers("PO-1001")))
    }

    pub fn with_order_numbers(order_numbers: Arc<dyn OrderNumberGenerator>) -> Self {
        let api = Arc::new(FakeKlarnaApi::new());
        let repository = Arc::new(InMemoryOrderRepository::new());
        let payment_methods = Arc::new(InMemoryPaymentMethodRepository::new());
        payment_methods.upsert(klarna_method("en-US"));
        payment_methods.upsert(klarna_method("sv-SE"));
        let catalog = Arc::new(InMemoryCatalog::new());

        let service = Arc::new(KlarnaService::new(
            api.clone(),
            Arc::new(DefaultTotalsCalculator),
            repository.clone(),
            catalog.clone(),
            Arc::new(StaticCountryResolver::new()),
            payment_methods.clone(),
            order_numbers,
            Arc::new(FraudAwarePaymentProcessor),
            Arc::new(CartSessionEnricher),
        ));

        Self {
            api,
            repository,
            payment_methods,
            catalog,
            service,
        }
    }

    /// Adds a parameter to the Klarna method configured for `language`
    pub fn set_parameter(&self, language: &str, name: &str, value: &str) {
        let mut method = self
            .payment_methods
            .get_by_system_name(KLARNA_PAYMENT_SYSTEM_KEYWORD, language)
            .unwrap_or_else(|| klarna_method(language));
        method = method.with_parameter(name, value);
        self.payment_methods.upsert(method);
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(self.service.clone(), self.repository.clone())
    }
}
