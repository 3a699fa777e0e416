use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::constants::{KLARNA_ORDER_ID_FIELD, KLARNA_PAYMENT_SYSTEM_KEYWORD};

/// Order placed from a cart once Klarna authorized the payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: Uuid,
    pub order_number: String,
    pub currency: String,
    pub payments: Vec<Payment>,
    /// Searchable meta fields (e.g. the Klarna order id)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PurchaseOrder {
    pub fn new(order_number: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            order_number: order_number.into(),
            currency: currency.into(),
            payments: Vec::new(),
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn klarna_order_id(&self) -> Option<&str> {
        self.metadata.get(KLARNA_ORDER_ID_FIELD).map(String::as_str)
    }

    pub fn set_klarna_order_id(&mut self, order_id: impl Into<String>) {
        self.metadata
            .insert(KLARNA_ORDER_ID_FIELD.to_string(), order_id.into());
    }

    /// The payment the fraud notification applies to
    pub fn primary_payment_mut(&mut self) -> Option<&mut Payment> {
        self.payments.first_mut()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub payment_method_name: String,
    pub amount: Decimal,
    pub status: PaymentStatus,
    pub fraud_status: Option<FraudStatus>,
    /// Klarna hosted confirmation page for this payment
    pub confirmation_url: Option<String>,
}

impl Payment {
    pub fn klarna(amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_method_name: KLARNA_PAYMENT_SYSTEM_KEYWORD.to_string(),
            amount,
            status: PaymentStatus::Pending,
            fraud_status: None,
            confirmation_url: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == PaymentStatus::Pending
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum PaymentStatus {
    Pending,
    Processed,
    Failed,
}

/// Klarna fraud decision for an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum FraudStatus {
    #[serde(rename = "FRAUD_RISK_ACCEPTED", alias = "ACCEPTED")]
    Accepted,
    #[serde(rename = "FRAUD_RISK_REJECTED", alias = "REJECTED")]
    Rejected,
    #[serde(rename = "FRAUD_RISK_PENDING", alias = "PENDING")]
    Pending,
    #[serde(rename = "FRAUD_RISK_STOPPED", alias = "STOPPED")]
    Stopped,
}
