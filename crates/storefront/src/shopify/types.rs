//! Domain types for the Shopify Storefront API.
//!
//! These types provide a clean, ergonomic API separate from the raw
//! GraphQL response shapes in `storefront::queries`.

use serde::{Deserialize, Serialize};
use storefront_cart_core::{CartId, LineId, MerchandiseId, Price, ProductId};

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    /// Option name (e.g., "Size", "Color").
    pub name: String,
    /// Selected value (e.g., "Large", "Blue").
    pub value: String,
}

/// Product option definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Available values (e.g., `["Small", "Medium", "Large"]`).
    pub values: Vec<String>,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariant {
    /// Variant ID (the merchandise id used for cart lines).
    pub id: MerchandiseId,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Current price.
    pub price: Price,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Price>,
    /// Selected options for this variant, in option order.
    pub selected_options: Vec<SelectedOption>,
}

/// A product in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product ID.
    pub id: ProductId,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Option definitions.
    pub options: Vec<ProductOption>,
    /// Variants in backend order.
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Lower-cased option names, as used for URL query keys.
    #[must_use]
    pub fn option_keys(&self) -> Vec<String> {
        self.options.iter().map(|o| o.name.to_lowercase()).collect()
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// Product summary attached to a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandiseProduct {
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
}

/// Merchandise (variant) referenced by a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: MerchandiseId,
    /// Variant title.
    pub title: String,
    /// Unit price.
    pub price: Price,
    /// Selected options on the variant.
    pub selected_options: Vec<SelectedOption>,
    /// Owning product.
    pub product: CartMerchandiseProduct,
}

/// A line item in a cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Line ID.
    pub id: LineId,
    /// Quantity, always at least 1.
    pub quantity: u32,
    /// Line total after discounts.
    pub total: Price,
    /// Merchandise on this line.
    pub merchandise: CartMerchandise,
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartCost {
    /// Subtotal before taxes and shipping.
    pub subtotal: Price,
    /// Total including taxes.
    pub total: Price,
}

/// A shopping cart owned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Cart ID.
    pub id: CartId,
    /// URL to the backend-hosted checkout.
    pub checkout_url: String,
    /// Buyer note.
    pub note: Option<String>,
    /// Sum of line quantities, as reported by the backend.
    pub total_quantity: u32,
    /// Cost summary.
    pub cost: CartCost,
    /// Lines in backend order.
    pub lines: Vec<CartLine>,
}

impl Cart {
    /// Find the line holding a given merchandise id.
    #[must_use]
    pub fn line_for(&self, merchandise_id: &MerchandiseId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.merchandise.id == merchandise_id)
    }
}

// =============================================================================
// Cart Input Types
// =============================================================================

/// Input for adding a line to a cart.
#[derive(Debug, Clone)]
pub struct CartLineInput {
    /// Variant to add.
    pub merchandise_id: MerchandiseId,
    /// Quantity to add.
    pub quantity: u32,
}

/// Input for updating an existing cart line.
#[derive(Debug, Clone)]
pub struct CartLineUpdateInput {
    /// Line to update.
    pub id: LineId,
    /// Variant now on the line.
    pub merchandise_id: Option<MerchandiseId>,
    /// New quantity, at least 1.
    pub quantity: Option<u32>,
}

/// User error from a cart mutation.
#[derive(Debug, Clone)]
pub struct CartUserError {
    /// Machine-readable code (e.g., `INVALID`, `MERCHANDISE_NOT_ENOUGH_STOCK`).
    pub code: Option<String>,
    /// Input field path the error refers to.
    pub field: Vec<String>,
    /// Human-readable message.
    pub message: String,
}

impl CartUserError {
    /// Whether the error refers to the cart id itself (unknown or expired cart).
    #[must_use]
    pub fn targets_cart_id(&self) -> bool {
        self.field.iter().any(|f| f == "cartId")
    }
}
