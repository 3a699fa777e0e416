use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Redirect, Response},
    routing::{delete, get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use super::load_cart;
use crate::{
    entities::OrderAddress,
    errors::ServiceError,
    handlers::AppState,
    models::{CreateOrderResponse, NotificationModel},
    services::klarna::{mapper::to_address, FraudUpdateOutcome},
    ApiResponse, ApiResult,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Option<String>,
    /// Empty when Klarna could not be reached
    pub client_token: String,
    pub available: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddressUpdateResponse {
    pub updated: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1, message = "Authorization token is required"))]
    pub authorization_token: String,
}

/// POST /carts/:cart_id/klarna/session
pub async fn create_or_update_session(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    let _guard = state.lock_cart(cart_id).await;

    let mut cart = load_cart(&state, cart_id).await?;
    match state.klarna.create_or_update_session(&mut cart).await {
        Ok(client_token) => Ok(Json(ApiResponse::success(SessionResponse {
            session_id: cart.session_id().map(str::to_string),
            client_token,
            available: true,
        }))),
        Err(e) if e.is_recoverable() => {
            warn!(error = %e, %cart_id, "Klarna session unavailable for cart");
            Ok(Json(ApiResponse::with_message(
                SessionResponse {
                    session_id: cart.session_id().map(str::to_string),
                    client_token: String::new(),
                    available: false,
                },
                e.response_message(),
            )))
        }
        Err(e) => Err(e),
    }
}

/// GET /carts/:cart_id/klarna/session
pub async fn get_session(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    let cart = load_cart(&state, cart_id).await?;
    Ok(Json(ApiResponse::success(SessionResponse {
        session_id: state.klarna.session_id(&cart).map(str::to_string),
        client_token: state
            .klarna
            .client_token(&cart)
            .unwrap_or_default()
            .to_string(),
        available: cart.klarna_session.is_some(),
    })))
}

/// PUT /carts/:cart_id/klarna/billing-address
pub async fn update_billing_address(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(address): Json<OrderAddress>,
) -> ApiResult<AddressUpdateResponse> {
    let _guard = state.lock_cart(cart_id).await;

    let cart = load_cart(&state, cart_id).await?;
    let result = state
        .klarna
        .update_billing_address(&cart, to_address(&address))
        .await;
    address_response(result)
}

/// PUT /carts/:cart_id/klarna/shipping-address
pub async fn update_shipping_address(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(address): Json<OrderAddress>,
) -> ApiResult<AddressUpdateResponse> {
    let _guard = state.lock_cart(cart_id).await;

    let cart = load_cart(&state, cart_id).await?;
    let result = state
        .klarna
        .update_shipping_address(&cart, to_address(&address))
        .await;
    address_response(result)
}

fn address_response(result: Result<bool, ServiceError>) -> ApiResult<AddressUpdateResponse> {
    match result {
        Ok(updated) => Ok(Json(ApiResponse::success(AddressUpdateResponse { updated }))),
        Err(e) if e.is_recoverable() => Ok(Json(ApiResponse::with_message(
            AddressUpdateResponse { updated: false },
            e.response_message(),
        ))),
        Err(e) => Err(e),
    }
}

/// POST /carts/:cart_id/klarna/orders
pub async fn create_order(
    State(state): State<AppState>,
    Path(cart_id): Path<Uuid>,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<CreateOrderResponse> {
    request
        .validate()
        .map_err(|e| ServiceError::ValidationError(format!("Validation failed: {}", e)))?;

    let _guard = state.lock_cart(cart_id).await;

    let cart = load_cart(&state, cart_id).await?;
    let response = state
        .klarna
        .create_order(&request.authorization_token, &cart)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Cart {} has no Klarna session", cart_id)))?;

    Ok(Json(ApiResponse::success(response)))
}

/// DELETE /klarna/authorizations/:token
///
/// Fire and forget: failures are logged by the service and never reported.
pub async fn cancel_authorization(
    State(state): State<AppState>,
    Path(authorization_token): Path<String>,
) -> StatusCode {
    if let Err(e) = state.klarna.cancel_authorization(&authorization_token).await {
        debug!(error = %e, "Cancel failure not reported to caller");
    }
    StatusCode::NO_CONTENT
}

/// POST /klarna/notifications/fraud
pub async fn fraud_notification(
    State(state): State<AppState>,
    Json(notification): Json<NotificationModel>,
) -> ApiResult<FraudUpdateOutcome> {
    let outcome = state.klarna.fraud_update(&notification).await?;
    info!(klarna_order_id = %notification.order_id, ?outcome, "Fraud notification handled");
    Ok(Json(ApiResponse::success(outcome)))
}

/// GET /orders/:order_id/klarna/confirmation
pub async fn confirmation_redirect(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let order = state
        .repository
        .load_order(order_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

    let url = state.klarna.confirmation_url(&order).ok_or_else(|| {
        ServiceError::NotFound(format!("Order {} has no Klarna confirmation URL", order_id))
    })?;

    Ok(Redirect::to(&url).into_response())
}

pub fn klarna_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/carts/:cart_id/klarna/session",
            post(create_or_update_session).get(get_session),
        )
        .route(
            "/carts/:cart_id/klarna/billing-address",
            put(update_billing_address),
        )
        .route(
            "/carts/:cart_id/klarna/shipping-address",
            put(update_shipping_address),
        )
        .route("/carts/:cart_id/klarna/orders", post(create_order))
        .route(
            "/klarna/authorizations/:token",
            delete(cancel_authorization),
        )
        .route("/klarna/notifications/fraud", post(fraud_notification))
        .route(
            "/orders/:order_id/klarna/confirmation",
            get(confirmation_redirect),
        )
}
