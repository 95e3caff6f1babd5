//! Cart route handlers.
//!
//! Cart mutations use HTMX for dynamic updates without full page reloads.
//! The cart id lives in the `cartId` cookie; every handler takes a
//! [`CookieIdentityStore`] and returns it so identity changes are written
//! back with `Set-Cookie`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Json,
    extract::State,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use crate::cart::{CART_UPDATED_EVENT, CartDetail, CartError, CookieIdentityStore, IdentityStore};
use crate::error::AppError;
use crate::shopify::types::Cart;
use crate::state::AppState;

/// HTMX response header carrying the update signal.
pub const HX_TRIGGER: &str = "HX-Trigger";

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    #[serde(default)]
    pub merchandise_id: String,
    /// Raw field; parsed by the handler so bad input gets the inline error.
    pub quantity: Option<String>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    #[serde(default)]
    pub line_id: String,
    #[serde(default)]
    pub merchandise_id: String,
    pub quantity: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    #[serde(default)]
    pub line_id: String,
}

/// Cart note form data.
#[derive(Debug, Deserialize)]
pub struct CartNoteForm {
    #[serde(default)]
    pub note: String,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Inline, dismissible mutation error fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_error.html")]
pub struct CartErrorTemplate {
    pub message: String,
}

/// Parse a quantity field. A blank value counts as absent.
///
/// Values past `u32` saturate so the gateway's limit check reports them.
fn parse_quantity(raw: Option<&str>) -> Result<Option<u32>, CartError> {
    let Some(raw) = raw.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(|q| Some(u32::try_from(q).unwrap_or(u32::MAX)))
        .map_err(|_| CartError::Validation("Quantity must be a whole number".to_string()))
}

/// Respond to a mutation: count badge plus the update signal on success,
/// the inline error fragment (and no signal) on failure.
fn mutation_response(identity: CookieIdentityStore, result: Result<Cart, CartError>) -> Response {
    match result {
        Ok(cart) => (
            identity,
            AppendHeaders([(HX_TRIGGER, CART_UPDATED_EVENT)]),
            CartCountTemplate {
                count: cart.total_quantity,
            },
        )
            .into_response(),
        Err(e) => (identity, AppError::from(e)).into_response(),
    }
}

/// Cart contents as JSON. Empty on any failure.
#[instrument(skip(state, identity))]
pub async fn show(State(state): State<AppState>, identity: CookieIdentityStore) -> Json<CartDetail> {
    Json(state.reader().read_detail(identity.get().as_ref()).await)
}

/// Add item to cart (HTMX).
///
/// Creates the cart on first add and binds the `cartId` cookie.
#[instrument(skip(state, identity))]
pub async fn add(
    State(state): State<AppState>,
    mut identity: CookieIdentityStore,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let quantity = match parse_quantity(form.quantity.as_deref()) {
        Ok(quantity) => quantity.unwrap_or(1),
        Err(err) => return mutation_response(identity, Err(err)),
    };

    let result = state
        .gateway()
        .add_line(&mut identity, &form.merchandise_id, quantity)
        .await;
    mutation_response(identity, result)
}

/// Update cart line quantity (HTMX). Quantity zero removes the line.
#[instrument(skip(state, identity))]
pub async fn update(
    State(state): State<AppState>,
    mut identity: CookieIdentityStore,
    Form(form): Form<UpdateCartForm>,
) -> Response {
    let quantity = match parse_quantity(form.quantity.as_deref()) {
        Ok(Some(quantity)) => quantity,
        Ok(None) => {
            let err = CartError::Validation("Quantity is required".to_string());
            return mutation_response(identity, Err(err));
        }
        Err(err) => return mutation_response(identity, Err(err)),
    };

    let result = state
        .gateway()
        .update_line(&mut identity, &form.line_id, &form.merchandise_id, quantity)
        .await;
    mutation_response(identity, result)
}

/// Remove cart line (HTMX).
#[instrument(skip(state, identity))]
pub async fn remove(
    State(state): State<AppState>,
    mut identity: CookieIdentityStore,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let result = state.gateway().remove_line(&mut identity, &form.line_id).await;
    mutation_response(identity, result)
}

/// Replace the buyer note (HTMX).
#[instrument(skip(state, identity, form))]
pub async fn note(
    State(state): State<AppState>,
    mut identity: CookieIdentityStore,
    Form(form): Form<CartNoteForm>,
) -> Response {
    let result = state.gateway().update_note(&mut identity, &form.note).await;
    mutation_response(identity, result)
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, identity))]
pub async fn count(State(state): State<AppState>, identity: CookieIdentityStore) -> impl IntoResponse {
    let summary = state.reader().read_summary(identity.get().as_ref()).await;

    CartCountTemplate {
        count: summary.total_quantity,
    }
}

/// Redirect to Shopify checkout.
#[instrument(skip(state, identity))]
pub async fn checkout(State(state): State<AppState>, identity: CookieIdentityStore) -> Redirect {
    // No cart (or an unreadable one) sends the shopper back to the cart page
    state
        .reader()
        .fetch(identity.get().as_ref())
        .await
        .map_or_else(
            || Redirect::to("/cart"),
            |cart| Redirect::to(&cart.checkout_url),
        )
}
