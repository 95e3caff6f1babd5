//! In-memory commerce backend for tests and local development.
//!
//! - No IO
//! - Carts live in a mutex-guarded map for the lifetime of the process
//! - Failure injection for exercising error paths
//! - Per-operation call counters

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use storefront_cart_core::{CartId, LineId, MerchandiseId, Price};

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartLineInput, CartLineUpdateInput, CartMerchandise,
    CartMerchandiseProduct, Product,
};
use crate::shopify::{GraphQLError, ShopifyError};

use super::backend::CartBackend;

/// Currency used for merchandise not found in the catalog.
const DEFAULT_CURRENCY: &str = "USD";

/// Number of calls made to each backend operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub create: usize,
    pub get: usize,
    pub add: usize,
    pub update: usize,
    pub remove: usize,
    pub note: usize,
}

#[derive(Default)]
struct MemoryState {
    carts: HashMap<CartId, Cart>,
    products: HashMap<String, Product>,
    next_cart: u64,
    next_line: u64,
    unavailable: bool,
    reject_next: Option<String>,
    calls: CallCounts,
}

/// In-memory implementation of [`CartBackend`].
///
/// Cheap to clone; clones share the same carts.
#[derive(Clone, Default)]
pub struct InMemoryCartBackend {
    inner: Arc<Mutex<MemoryState>>,
}

impl InMemoryCartBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product to the catalog.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.state().products.insert(product.handle.clone(), product);
        self
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every subsequent call fail as if the backend were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Reject the next mutation with a business-rule error (e.g. out of stock).
    pub fn reject_next_mutation(&self, message: impl Into<String>) {
        self.state().reject_next = Some(message.into());
    }

    /// Drop a cart, as the backend does when a cart expires.
    pub fn expire_cart(&self, cart_id: &CartId) {
        self.state().carts.remove(cart_id);
    }

    /// Snapshot of a cart without counting a `get` call.
    #[must_use]
    pub fn cart(&self, cart_id: &CartId) -> Option<Cart> {
        self.state().carts.get(cart_id).cloned()
    }

    /// Calls made so far.
    #[must_use]
    pub fn call_counts(&self) -> CallCounts {
        self.state().calls
    }

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` if no product has this handle.
    pub fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let state = self.state();
        check_available(&state)?;
        state
            .products
            .get(handle)
            .cloned()
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))
    }
}

fn check_available(state: &MemoryState) -> Result<(), ShopifyError> {
    if state.unavailable {
        return Err(ShopifyError::GraphQL(vec![GraphQLError::message(
            "HTTP 503 Service Unavailable: backend unavailable",
        )]));
    }
    Ok(())
}

/// Availability check plus one-shot rejection for mutations.
fn check_mutation(state: &mut MemoryState) -> Result<(), ShopifyError> {
    check_available(state)?;
    if let Some(message) = state.reject_next.take() {
        return Err(ShopifyError::UserError(message));
    }
    Ok(())
}

fn cart_not_found(cart_id: &CartId) -> ShopifyError {
    ShopifyError::NotFound(format!("Cart not found: {cart_id}"))
}

impl MemoryState {
    fn cart_mut(&mut self, cart_id: &CartId) -> Result<&mut Cart, ShopifyError> {
        self.carts
            .get_mut(cart_id)
            .ok_or_else(|| cart_not_found(cart_id))
    }

    /// Build the merchandise for a variant id from the catalog.
    fn merchandise(&self, merchandise_id: &MerchandiseId) -> CartMerchandise {
        for product in self.products.values() {
            if let Some(variant) = product.variants.iter().find(|v| &v.id == merchandise_id) {
                return CartMerchandise {
                    id: variant.id.clone(),
                    title: variant.title.clone(),
                    price: variant.price.clone(),
                    selected_options: variant.selected_options.clone(),
                    product: CartMerchandiseProduct {
                        handle: product.handle.clone(),
                        title: product.title.clone(),
                    },
                };
            }
        }

        CartMerchandise {
            id: merchandise_id.clone(),
            title: "Default Title".to_string(),
            price: Price::zero(DEFAULT_CURRENCY),
            selected_options: Vec::new(),
            product: CartMerchandiseProduct {
                handle: merchandise_id.to_string(),
                title: merchandise_id.to_string(),
            },
        }
    }

    fn next_line_id(&mut self) -> LineId {
        self.next_line += 1;
        LineId::parse(format!("line-{}", self.next_line)).unwrap_or_else(|_| unreachable!())
    }
}

fn quantity_limit() -> ShopifyError {
    ShopifyError::UserError("Quantity limit exceeded".to_string())
}

/// Recompute totals after lines change.
///
/// Fails when the quantities overflow `u32`; callers discard the copy.
fn recompute(cart: &mut Cart) -> Result<(), ShopifyError> {
    cart.lines.retain(|l| l.quantity > 0);
    cart.total_quantity = cart
        .lines
        .iter()
        .try_fold(0_u32, |sum, l| sum.checked_add(l.quantity))
        .ok_or_else(quantity_limit)?;

    for line in &mut cart.lines {
        line.total = line.merchandise.price.times(line.quantity);
    }

    let currency = cart
        .lines
        .first()
        .map_or(DEFAULT_CURRENCY, |l| l.total.currency_code.as_str())
        .to_string();
    let subtotal = cart
        .lines
        .iter()
        .fold(Price::zero(&currency), |acc, l| {
            Price::new(acc.amount + l.total.amount, currency.clone())
        });
    cart.cost = CartCost {
        total: subtotal.clone(),
        subtotal,
    };
    Ok(())
}

impl CartBackend for InMemoryCartBackend {
    async fn create_cart(&self) -> Result<Cart, ShopifyError> {
        let mut state = self.state();
        state.calls.create += 1;
        check_available(&state)?;

        state.next_cart += 1;
        let raw_id = format!("cart-{}", state.next_cart);
        let cart = Cart {
            id: CartId::parse(raw_id.clone()).unwrap_or_else(|_| unreachable!()),
            checkout_url: format!("https://checkout.invalid/{raw_id}"),
            note: None,
            total_quantity: 0,
            cost: CartCost {
                subtotal: Price::zero(DEFAULT_CURRENCY),
                total: Price::zero(DEFAULT_CURRENCY),
            },
            lines: Vec::new(),
        };

        state.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn get_cart(&self, cart_id: &CartId) -> Result<Option<Cart>, ShopifyError> {
        let mut state = self.state();
        state.calls.get += 1;
        check_available(&state)?;
        Ok(state.carts.get(cart_id).cloned())
    }

    async fn add_to_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.state();
        state.calls.add += 1;
        check_mutation(&mut state)?;

        // Work on a copy so a rejected batch leaves the stored cart as it was
        let mut cart = state
            .carts
            .get(cart_id)
            .cloned()
            .ok_or_else(|| cart_not_found(cart_id))?;

        for input in lines {
            // Same merchandise merges into the existing line
            if let Some(line) = cart
                .lines
                .iter_mut()
                .find(|l| l.merchandise.id == input.merchandise_id)
            {
                line.quantity = line
                    .quantity
                    .checked_add(input.quantity)
                    .ok_or_else(quantity_limit)?;
            } else {
                let merchandise = state.merchandise(&input.merchandise_id);
                cart.lines.push(CartLine {
                    id: state.next_line_id(),
                    quantity: input.quantity,
                    total: merchandise.price.times(input.quantity),
                    merchandise,
                });
            }
        }

        recompute(&mut cart)?;
        state.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn update_cart(
        &self,
        cart_id: &CartId,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.state();
        state.calls.update += 1;
        check_mutation(&mut state)?;

        let mut cart = state
            .carts
            .get(cart_id)
            .cloned()
            .ok_or_else(|| cart_not_found(cart_id))?;

        for input in lines {
            let merchandise = input.merchandise_id.as_ref().map(|m| state.merchandise(m));
            let line = cart
                .lines
                .iter_mut()
                .find(|l| l.id == input.id)
                .ok_or_else(|| ShopifyError::UserError(format!("Line not found: {}", input.id)))?;

            if let Some(merchandise) = merchandise {
                line.merchandise = merchandise;
            }
            if let Some(quantity) = input.quantity {
                line.quantity = quantity;
            }
        }

        recompute(&mut cart)?;
        state.carts.insert(cart.id.clone(), cart.clone());
        Ok(cart)
    }

    async fn remove_from_cart(
        &self,
        cart_id: &CartId,
        line_ids: Vec<LineId>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.state();
        state.calls.remove += 1;
        check_mutation(&mut state)?;

        let cart = state.cart_mut(cart_id)?;
        if let Some(missing) = line_ids
            .iter()
            .find(|id| !cart.lines.iter().any(|l| &l.id == *id))
        {
            return Err(ShopifyError::UserError(format!("Line not found: {missing}")));
        }

        cart.lines.retain(|l| !line_ids.contains(&l.id));
        recompute(cart)?;
        Ok(cart.clone())
    }

    async fn update_cart_note(&self, cart_id: &CartId, note: &str) -> Result<Cart, ShopifyError> {
        let mut state = self.state();
        state.calls.note += 1;
        check_mutation(&mut state)?;

        let cart = state.cart_mut(cart_id)?;
        cart.note = Some(note.to_string()).filter(|n| !n.is_empty());
        Ok(cart.clone())
    }
}
