//! GraphQL operation definitions for the Shopify Storefront API.
//!
//! Each operation implements `graphql_client::GraphQLQuery` by hand: the query
//! text, a serializable variables type and a deserializable response type.

use graphql_client::{GraphQLQuery, QueryBody};
use serde::{Deserialize, Serialize};

/// Declare an operation type implementing `GraphQLQuery`.
macro_rules! operation {
    ($(#[$meta:meta])* $name:ident, $operation_name:literal, $query:expr, $vars:ty, $data:ty) => {
        $(#[$meta])*
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $vars;
            type ResponseData = $data;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $query,
                    operation_name: $operation_name,
                }
            }
        }
    };
}

/// Fields selected on every cart returned by a query or mutation.
macro_rules! cart_fragment {
    () => {
        r"
fragment CartFields on Cart {
  id
  checkoutUrl
  note
  totalQuantity
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        cost { totalAmount { amount currencyCode } }
        merchandise {
          ... on ProductVariant {
            id
            title
            price { amount currencyCode }
            selectedOptions { name value }
            product { handle title }
          }
        }
      }
    }
  }
}
"
    };
}

// =============================================================================
// Shared response shapes
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSelectedOption {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCartProduct {
    pub handle: String,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMerchandise {
    pub id: String,
    pub title: String,
    pub price: RawMoney,
    pub selected_options: Vec<RawSelectedOption>,
    pub product: RawCartProduct,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineCost {
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCartLine {
    pub id: String,
    pub quantity: i64,
    pub cost: RawLineCost,
    pub merchandise: RawMerchandise,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEdge<T> {
    pub node: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawConnection<T> {
    pub edges: Vec<RawEdge<T>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartCost {
    pub subtotal_amount: RawMoney,
    pub total_amount: RawMoney,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCart {
    pub id: String,
    pub checkout_url: String,
    pub note: Option<String>,
    pub total_quantity: i64,
    pub cost: RawCartCost,
    pub lines: RawConnection<RawCartLine>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawUserError {
    pub code: Option<String>,
    pub field: Option<Vec<String>>,
    pub message: String,
}

/// Payload shared by every cart mutation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartPayload {
    pub cart: Option<RawCart>,
    #[serde(default)]
    pub user_errors: Vec<RawUserError>,
}

// =============================================================================
// Cart operations
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartLineInput {
    pub merchandise_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCartLineUpdateInput {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchandise_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCartVariables {
    pub input: CreateCartInput,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateCartInput {
    pub lines: Vec<RawCartLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartData {
    pub cart_create: Option<RawCartPayload>,
}

operation!(
    /// `cartCreate` mutation.
    CreateCart,
    "CreateCart",
    concat!(
        r"
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    ),
    CreateCartVariables,
    CreateCartData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetCartVariables {
    pub cart_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetCartData {
    pub cart: Option<RawCart>,
}

operation!(
    /// `cart` query.
    GetCart,
    "GetCart",
    concat!(
        r"
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}
",
        cart_fragment!()
    ),
    GetCartVariables,
    GetCartData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartVariables {
    pub cart_id: String,
    pub lines: Vec<RawCartLineInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartData {
    pub cart_lines_add: Option<RawCartPayload>,
}

operation!(
    /// `cartLinesAdd` mutation.
    AddToCart,
    "AddToCart",
    concat!(
        r"
mutation AddToCart($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    ),
    AddToCartVariables,
    AddToCartData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesVariables {
    pub cart_id: String,
    pub lines: Vec<RawCartLineUpdateInput>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartLinesData {
    pub cart_lines_update: Option<RawCartPayload>,
}

operation!(
    /// `cartLinesUpdate` mutation.
    UpdateCartLines,
    "UpdateCartLines",
    concat!(
        r"
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    ),
    UpdateCartLinesVariables,
    UpdateCartLinesData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartVariables {
    pub cart_id: String,
    pub line_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFromCartData {
    pub cart_lines_remove: Option<RawCartPayload>,
}

operation!(
    /// `cartLinesRemove` mutation.
    RemoveFromCart,
    "RemoveFromCart",
    concat!(
        r"
mutation RemoveFromCart($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    ),
    RemoveFromCartVariables,
    RemoveFromCartData
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartNoteVariables {
    pub cart_id: String,
    pub note: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartNoteData {
    pub cart_note_update: Option<RawCartPayload>,
}

operation!(
    /// `cartNoteUpdate` mutation.
    UpdateCartNote,
    "UpdateCartNote",
    concat!(
        r"
mutation UpdateCartNote($cartId: ID!, $note: String!) {
  cartNoteUpdate(cartId: $cartId, note: $note) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}
",
        cart_fragment!()
    ),
    UpdateCartNoteVariables,
    UpdateCartNoteData
);

// =============================================================================
// Product operations
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RawOptionValue {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductOption {
    pub name: String,
    pub option_values: Vec<RawOptionValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: String,
    pub title: String,
    pub available_for_sale: bool,
    pub price: RawMoney,
    pub compare_at_price: Option<RawMoney>,
    pub selected_options: Vec<RawSelectedOption>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub id: String,
    pub handle: String,
    pub title: String,
    pub options: Vec<RawProductOption>,
    pub variants: RawConnection<RawVariant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetProductByHandleVariables {
    pub handle: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetProductByHandleData {
    pub product: Option<RawProduct>,
}

operation!(
    /// `product(handle:)` query.
    GetProductByHandle,
    "GetProductByHandle",
    r"
query GetProductByHandle($handle: String!) {
  product(handle: $handle) {
    id
    handle
    title
    options { name optionValues { name } }
    variants(first: 100) {
      edges {
        node {
          id
          title
          availableForSale
          price { amount currencyCode }
          compareAtPrice { amount currencyCode }
          selectedOptions { name value }
        }
      }
    }
  }
}
",
    GetProductByHandleVariables,
    GetProductByHandleData
);
