use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::address::OrderAddress;
use crate::{
    constants::{KLARNA_CLIENT_TOKEN_FIELD, KLARNA_SESSION_ID_FIELD},
    errors::ServiceError,
};

/// Shopping cart as seen by the Klarna integration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub market: Market,
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub shipments: Vec<Shipment>,
    pub billing_address: Option<OrderAddress>,
    /// Data sent to Klarna for customer pre-assessment
    pub customer: Option<CustomerInfo>,
    /// Remote session this cart is bound to
    pub klarna_session: Option<KlarnaSessionRef>,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(market: Market, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            customer_id: None,
            market,
            currency: currency.into(),
            line_items: Vec::new(),
            shipments: Vec::new(),
            billing_address: None,
            customer: None,
            klarna_session: None,
            properties: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// First market country, as configured on the market (two or three letters)
    pub fn market_country(&self) -> Option<&str> {
        self.market.countries.first().map(String::as_str)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.klarna_session.as_ref().map(|s| s.session_id.as_str())
    }

    pub fn client_token(&self) -> Option<&str> {
        self.klarna_session.as_ref().map(|s| s.client_token.as_str())
    }

    /// Brings `klarna_session` and the persisted property bag into agreement.
    ///
    /// A binding found only in the bag is adopted, one found only on the typed
    /// field is written to the bag. Two different bindings are rejected.
    pub fn sync_klarna_session(&mut self) -> Result<(), ServiceError> {
        let stored = KlarnaSessionRef::from_properties(&self.properties)?;
        match (stored, &self.klarna_session) {
            (Some(stored), None) => self.klarna_session = Some(stored),
            (Some(stored), Some(current)) if stored != *current => {
                return Err(ServiceError::ValidationError(format!(
                    "cart {} is bound to Klarna session {} but its properties name {}",
                    self.id, current.session_id, stored.session_id
                )));
            }
            (None, Some(current)) => current.to_properties(&mut self.properties),
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub market_id: String,
    pub countries: Vec<String>,
    /// Language used for the payment method lookup and the session locale (e.g. "en-US")
    pub default_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub code: String,
    pub display_name: String,
    pub quantity: u32,
    pub placed_price: Decimal,
    /// Sum of all discounts applied to this entry
    #[serde(default)]
    pub discount_amount: Decimal,
}

impl LineItem {
    /// Placed price times quantity minus the entry discount, never negative
    pub fn extended_price(&self) -> Decimal {
        let extended = self.placed_price * Decimal::from(self.quantity) - self.discount_amount;
        extended.max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub shipping_method_name: Option<String>,
    pub shipping_cost: Decimal,
    pub shipping_address: Option<OrderAddress>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub title: Option<String>,
    pub national_identification_number: Option<String>,
}

/// Identifiers of the Klarna session bound to a cart. Both values travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlarnaSessionRef {
    pub session_id: String,
    pub client_token: String,
}

impl KlarnaSessionRef {
    pub fn new(session_id: impl Into<String>, client_token: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            client_token: client_token.into(),
        }
    }

    /// Reads the identifier pair from a cart property bag.
    ///
    /// A bag holding only one of the two non-empty values is rejected.
    pub fn from_properties(
        properties: &BTreeMap<String, String>,
    ) -> Result<Option<Self>, ServiceError> {
        let read = |key: &str| {
            properties
                .get(key)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        match (read(KLARNA_SESSION_ID_FIELD), read(KLARNA_CLIENT_TOKEN_FIELD)) {
            (Some(session_id), Some(client_token)) => {
                Ok(Some(Self::new(session_id, client_token)))
            }
            (None, None) => Ok(None),
            (Some(_), None) => Err(ServiceError::ValidationError(format!(
                "{} is set without {}",
                KLARNA_SESSION_ID_FIELD, KLARNA_CLIENT_TOKEN_FIELD
            ))),
            (None, Some(_)) => Err(ServiceError::ValidationError(format!(
                "{} is set without {}",
                KLARNA_CLIENT_TOKEN_FIELD, KLARNA_SESSION_ID_FIELD
            ))),
        }
    }

    pub fn to_properties(&self, properties: &mut BTreeMap<String, String>) {
        properties.insert(KLARNA_SESSION_ID_FIELD.to_string(), self.session_id.clone());
        properties.insert(
            KLARNA_CLIENT_TOKEN_FIELD.to_string(),
            self.client_token.clone(),
        );
    }
}
