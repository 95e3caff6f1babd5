//! Product route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use storefront_cart_core::MerchandiseId;
use tracing::instrument;

use crate::cart::variant::{self, SelectedOptionQuery};
use crate::cart::{CookieIdentityStore, IdentityStore, VariantCartState};
use crate::error::{AppError, Result};
use crate::shopify::types::{Product, ProductOption, ProductVariant};
use crate::state::AppState;

/// Product summary for the variant picker.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub handle: String,
    pub title: String,
    pub options: Vec<ProductOption>,
}

/// The variant resolved from URL option state, with its cart state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariantResponse {
    pub product: ProductView,
    pub variant: ProductVariant,
    pub cart: VariantCartState,
}

/// The product's default variant: first available for sale.
fn default_variant_id(product: &Product) -> Option<&MerchandiseId> {
    product
        .variants
        .iter()
        .find(|v| v.available_for_sale)
        .map(|v| &v.id)
}

/// Display a product with the variant selected by query parameters.
///
/// `?size=M&color=Blue` selects by option; unknown keys are ignored, and an
/// impossible combination falls back to the default variant.
#[instrument(skip(state, identity, params))]
pub async fn show(
    State(state): State<AppState>,
    identity: CookieIdentityStore,
    Path(handle): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ProductVariantResponse>> {
    let product = state.backend().get_product_by_handle(&handle).await?;

    let selected = SelectedOptionQuery::from_pairs(params).retain_options(&product.options);
    let variant = variant::resolve(&product.variants, &selected, default_variant_id(&product))
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Product has no variants: {handle}")))?;

    let cart = state
        .reader()
        .read_variant(identity.get().as_ref(), &variant.id)
        .await;

    Ok(Json(ProductVariantResponse {
        product: ProductView {
            handle: product.handle,
            title: product.title,
            options: product.options,
        },
        variant,
        cart,
    }))
}
