//! StateSet Klarna Payments
//!
//! Keeps shopping carts in sync with Klarna Payments sessions, finalizes
//! authorized sessions into Klarna orders and reconciles fraud decisions.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod catalog;
pub mod clients;
pub mod config;
pub mod constants;
pub mod entities;
pub mod errors;
pub mod geo;
pub mod handlers;
pub mod models;
pub mod payment_methods;
pub mod repositories;
pub mod services;

use axum::{response::Json, Router};
use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use repositories::OrderRepository;
use services::klarna::KlarnaService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub klarna: Arc<KlarnaService>,
    pub repository: Arc<dyn OrderRepository>,
    cart_locks: CartLocks,
}

impl AppState {
    pub fn new(klarna: Arc<KlarnaService>, repository: Arc<dyn OrderRepository>) -> Self {
        Self {
            klarna,
            repository,
            cart_locks: CartLocks::default(),
        }
    }

    /// Serializes session operations on one cart until the guard is dropped
    pub async fn lock_cart(&self, cart_id: Uuid) -> CartGuard {
        self.cart_locks.lock(cart_id).await
    }
}

/// Per-cart mutexes. An entry lives only while someone holds or waits for it.
#[derive(Clone, Default)]
struct CartLocks {
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl CartLocks {
    async fn lock(&self, cart_id: Uuid) -> CartGuard {
        let lock = self.locks.entry(cart_id).or_default().clone();
        let guard = lock.lock_owned().await;
        CartGuard {
            cart_id,
            locks: self.locks.clone(),
            guard: Some(guard),
        }
    }
}

pub struct CartGuard {
    cart_id: Uuid,
    locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for CartGuard {
    fn drop(&mut self) {
        // Unlock first: the table entry is then the only reference unless a task waits.
        drop(self.guard.take());
        self.locks
            .remove_if(&self.cart_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Full HTTP application with request tracing
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::health::health_routes())
        .merge(handlers::klarna::klarna_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
