//! Conversions from raw GraphQL response shapes to domain types.

use storefront_cart_core::{CartId, LineId, MerchandiseId, Price, ProductId};
use tracing::warn;

use crate::shopify::types::{
    Cart, CartCost, CartLine, CartMerchandise, CartMerchandiseProduct, CartUserError, Product,
    ProductOption, ProductVariant, SelectedOption,
};
use crate::shopify::{GraphQLError, ShopifyError};

use super::queries::{
    RawCart, RawCartLine, RawMoney, RawProduct, RawSelectedOption, RawUserError, RawVariant,
};

/// Wrap a malformed-payload problem as a GraphQL error.
fn invalid(what: &str, detail: impl std::fmt::Display) -> ShopifyError {
    ShopifyError::GraphQL(vec![GraphQLError::message(format!(
        "Invalid {what} in response: {detail}"
    ))])
}

fn convert_money(money: RawMoney) -> Result<Price, ShopifyError> {
    Price::parse(&money.amount, &money.currency_code).map_err(|e| invalid("money", e))
}

fn convert_options(options: Vec<RawSelectedOption>) -> Vec<SelectedOption> {
    options
        .into_iter()
        .map(|o| SelectedOption {
            name: o.name,
            value: o.value,
        })
        .collect()
}

fn convert_quantity(quantity: i64) -> Result<u32, ShopifyError> {
    u32::try_from(quantity).map_err(|e| invalid("quantity", e))
}

// =============================================================================
// Cart
// =============================================================================

/// Convert a raw cart into the domain type.
pub fn convert_cart(cart: RawCart) -> Result<Cart, ShopifyError> {
    Ok(Cart {
        id: CartId::parse(cart.id).map_err(|e| invalid("cart", e))?,
        checkout_url: cart.checkout_url,
        note: cart.note.filter(|n| !n.is_empty()),
        total_quantity: convert_quantity(cart.total_quantity)?,
        cost: CartCost {
            subtotal: convert_money(cart.cost.subtotal_amount)?,
            total: convert_money(cart.cost.total_amount)?,
        },
        lines: cart
            .lines
            .edges
            .into_iter()
            .map(|e| convert_cart_line(e.node))
            .collect::<Result<_, _>>()?,
    })
}

fn convert_cart_line(line: RawCartLine) -> Result<CartLine, ShopifyError> {
    let merchandise = line.merchandise;
    Ok(CartLine {
        id: LineId::parse(line.id).map_err(|e| invalid("cart line", e))?,
        quantity: convert_quantity(line.quantity)?,
        total: convert_money(line.cost.total_amount)?,
        merchandise: CartMerchandise {
            id: MerchandiseId::parse(merchandise.id).map_err(|e| invalid("merchandise", e))?,
            title: merchandise.title,
            price: convert_money(merchandise.price)?,
            selected_options: convert_options(merchandise.selected_options),
            product: CartMerchandiseProduct {
                handle: merchandise.product.handle,
                title: merchandise.product.title,
            },
        },
    })
}

/// Convert raw mutation user errors.
pub fn convert_user_errors(errors: Vec<RawUserError>) -> Vec<CartUserError> {
    errors
        .into_iter()
        .map(|e| CartUserError {
            code: e.code,
            field: e.field.unwrap_or_default(),
            message: e.message,
        })
        .collect()
}

/// Turn a non-empty list of user errors into a `ShopifyError`.
///
/// Errors pointing at the `cartId` input mean the backend has no such cart.
pub fn user_errors_to_error(cart_id: &str, errors: &[CartUserError]) -> ShopifyError {
    if errors.iter().any(CartUserError::targets_cart_id) {
        return ShopifyError::NotFound(format!("Cart not found: {cart_id}"));
    }

    ShopifyError::UserError(
        errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    )
}

// =============================================================================
// Product
// =============================================================================

/// Convert a raw product into the domain type.
pub fn convert_product(product: RawProduct) -> Result<Product, ShopifyError> {
    let converted = Product {
        id: ProductId::parse(product.id).map_err(|e| invalid("product", e))?,
        handle: product.handle,
        title: product.title,
        options: product
            .options
            .into_iter()
            .map(|o| ProductOption {
                name: o.name,
                values: o.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants: product
            .variants
            .edges
            .into_iter()
            .map(|e| convert_variant(e.node))
            .collect::<Result<_, _>>()?,
    };

    if let Err(mismatch) = crate::cart::variant::check_option_completeness(&converted.variants) {
        warn!(
            handle = %converted.handle,
            variant_id = %mismatch.variant_id,
            "Product variants do not share one option set; resolving per pair"
        );
    }

    Ok(converted)
}

fn convert_variant(variant: RawVariant) -> Result<ProductVariant, ShopifyError> {
    Ok(ProductVariant {
        id: MerchandiseId::parse(variant.id).map_err(|e| invalid("variant", e))?,
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        price: convert_money(variant.price)?,
        compare_at_price: variant.compare_at_price.map(convert_money).transpose()?,
        selected_options: convert_options(variant.selected_options),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn raw_cart_json() -> serde_json::Value {
        serde_json::json!({
            "id": "gid://shopify/Cart/abc",
            "checkoutUrl": "https://shop.example/checkouts/abc",
            "note": "",
            "totalQuantity": 3,
            "cost": {
                "subtotalAmount": { "amount": "30.0", "currencyCode": "USD" },
                "totalAmount": { "amount": "32.5", "currencyCode": "USD" }
            },
            "lines": { "edges": [{ "node": {
                "id": "gid://shopify/CartLine/1",
                "quantity": 3,
                "cost": { "totalAmount": { "amount": "30.0", "currencyCode": "USD" } },
                "merchandise": {
                    "id": "gid://shopify/ProductVariant/7",
                    "title": "Large",
                    "price": { "amount": "10.0", "currencyCode": "USD" },
                    "selectedOptions": [{ "name": "Size", "value": "Large" }],
                    "product": { "handle": "tee", "title": "Tee" }
                }
            }}]}
        })
    }

    #[test]
    fn test_convert_cart() {
        let raw: RawCart = serde_json::from_value(raw_cart_json()).unwrap();
        let cart = convert_cart(raw).unwrap();

        assert_eq!(cart.id.as_str(), "gid://shopify/Cart/abc");
        assert_eq!(cart.note, None);
        assert_eq!(cart.total_quantity, 3);
        assert_eq!(cart.lines.len(), 1);
        assert_eq!(cart.lines[0].merchandise.product.handle, "tee");
        assert_eq!(cart.cost.total.display(), "$32.50");
    }

    #[test]
    fn test_convert_cart_rejects_negative_quantity() {
        let mut json = raw_cart_json();
        json["totalQuantity"] = serde_json::json!(-1);
        let raw: RawCart = serde_json::from_value(json).unwrap();
        assert!(convert_cart(raw).is_err());
    }

    #[test]
    fn test_user_errors_on_cart_id_are_not_found() {
        let errors = convert_user_errors(vec![RawUserError {
            code: Some("INVALID".to_string()),
            field: Some(vec!["cartId".to_string()]),
            message: "The specified cart does not exist.".to_string(),
        }]);
        assert!(user_errors_to_error("cart-1", &errors).is_not_found());
    }

    #[test]
    fn test_user_errors_are_joined() {
        let errors = convert_user_errors(vec![
            RawUserError {
                code: Some("MERCHANDISE_NOT_ENOUGH_STOCK".to_string()),
                field: Some(vec!["lines".to_string(), "0".to_string()]),
                message: "Only 2 left".to_string(),
            },
            RawUserError {
                code: None,
                field: None,
                message: "Try again".to_string(),
            },
        ]);
        let err = user_errors_to_error("cart-1", &errors);
        assert_eq!(err.to_string(), "User error: Only 2 left; Try again");
    }
}
