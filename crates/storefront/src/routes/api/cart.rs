//! Cart state endpoints for badges and per-variant buttons.
//!
//! These never fail: any internal error yields the zero-value shape so
//! badge rendering stays unconditionally resilient.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use storefront_cart_core::MerchandiseId;
use tracing::instrument;

use crate::cart::{CartSummary, CookieIdentityStore, IdentityStore, VariantCartState};
use crate::state::AppState;

/// Summary shape read by the header badge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummaryResponse {
    pub total_quantity: u32,
    pub has_items: bool,
    pub item_count: usize,
}

impl From<CartSummary> for CartSummaryResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            total_quantity: summary.total_quantity,
            has_items: summary.has_items(),
            item_count: summary.line_count,
        }
    }
}

/// `GET /api/cart/summary`
#[instrument(skip(state, identity))]
pub async fn summary(
    State(state): State<AppState>,
    identity: CookieIdentityStore,
) -> Json<CartSummaryResponse> {
    let summary = state.reader().read_summary(identity.get().as_ref()).await;
    Json(summary.into())
}

/// `GET /api/cart/variants/{id}`
#[instrument(skip(state, identity))]
pub async fn variant(
    State(state): State<AppState>,
    identity: CookieIdentityStore,
    Path(merchandise_id): Path<String>,
) -> Json<VariantCartState> {
    let Ok(merchandise_id) = MerchandiseId::parse(merchandise_id) else {
        return Json(VariantCartState::default());
    };

    Json(
        state
            .reader()
            .read_variant(identity.get().as_ref(), &merchandise_id)
            .await,
    )
}
