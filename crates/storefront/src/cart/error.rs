//! Error vocabulary of the cart layer.

use storefront_cart_core::{CartId, IdError};
use thiserror::Error;

use crate::shopify::ShopifyError;

/// Errors returned by cart mutations.
///
/// Reads never produce these; they degrade to the empty cart instead.
#[derive(Debug, Error)]
pub enum CartError {
    /// Caller input was malformed (missing ids, zero quantity on add).
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A mutation other than add was attempted with no cart identity.
    #[error("No cart exists for this session")]
    MissingCart,

    /// Transport or backend failure.
    #[error("Cart backend unavailable: {0}")]
    BackendUnavailable(#[source] ShopifyError),

    /// The backend has no record of the cart.
    #[error("Cart not found: {0}")]
    NotFound(CartId),

    /// The backend refused the change (out of stock, quantity limits).
    #[error("Cart update rejected: {0}")]
    Rejected(String),
}

impl CartError {
    /// Classify a backend failure for a mutation on `cart_id`.
    #[must_use]
    pub fn from_backend(cart_id: &CartId, err: ShopifyError) -> Self {
        match err {
            ShopifyError::NotFound(_) => Self::NotFound(cart_id.clone()),
            ShopifyError::UserError(message) => Self::Rejected(message),
            other => Self::BackendUnavailable(other),
        }
    }

    /// Short message suitable for inline display next to the control.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) | Self::Rejected(message) => message.clone(),
            Self::MissingCart => "Your cart is empty. Add an item first.".to_string(),
            Self::BackendUnavailable(_) => {
                "We couldn't reach the store. Please try again.".to_string()
            }
            Self::NotFound(_) => "Your cart has expired. Please try again.".to_string(),
        }
    }
}

impl From<IdError> for CartError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use storefront_cart_core::LineId;

    use super::*;

    #[test]
    fn test_from_backend_classification() {
        let cart_id = CartId::parse("cart-1").unwrap();

        let err = CartError::from_backend(&cart_id, ShopifyError::NotFound("x".to_string()));
        assert!(matches!(err, CartError::NotFound(id) if id == cart_id));

        let err = CartError::from_backend(&cart_id, ShopifyError::UserError("Sold out".into()));
        assert_eq!(err.user_message(), "Sold out");

        let err = CartError::from_backend(&cart_id, ShopifyError::RateLimited(1));
        assert!(matches!(err, CartError::BackendUnavailable(_)));
    }

    #[test]
    fn test_id_error_is_validation() {
        let err: CartError = LineId::parse("").unwrap_err().into();
        assert_eq!(err.user_message(), "line id must not be empty");
        assert_eq!(err.to_string(), "Invalid input: line id must not be empty");
    }

    #[test]
    fn test_user_message_hides_backend_details() {
        let err = CartError::BackendUnavailable(ShopifyError::RateLimited(30));
        assert!(!err.user_message().contains("30"));
    }
}
