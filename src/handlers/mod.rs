pub mod health;
pub mod klarna;

use uuid::Uuid;

use crate::{entities::Cart, errors::ServiceError};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Loads a cart or fails with 404. The Klarna binding is checked against the
/// cart's property bag here.
pub(crate) async fn load_cart(state: &AppState, cart_id: Uuid) -> Result<Cart, ServiceError> {
    let mut cart = state
        .repository
        .load_cart(cart_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Cart {} not found", cart_id)))?;

    cart.sync_klarna_session()?;
    Ok(cart)
}
