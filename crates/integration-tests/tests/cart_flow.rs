//! End-to-end cart flows over the in-memory backend.
//!
//! Each test drives the router the way a browser session would: the cart
//! cookie set by one response is sent with the next request.

use axum::http::StatusCode;
use serde_json::json;
use storefront_cart_integration_tests::TestContext;

const HX_TRIGGER: &str = "HX-Trigger";

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health() {
    let mut ctx = TestContext::new();
    let resp = ctx.get("/health").await.expect("health request");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.body, "ok");
}

// ============================================================================
// Add & Identity
// ============================================================================

#[tokio::test]
async fn test_first_add_creates_cart_and_sets_cookie() {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.summary().await.expect("summary"), json!({
        "totalQuantity": 0, "hasItems": false, "itemCount": 0
    }));

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-123&quantity=1")
        .await
        .expect("add request");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header(HX_TRIGGER), Some("cart-updated"));
    assert!(resp.body.contains('1'), "count fragment: {}", resp.body);
    assert_eq!(ctx.cart_cookie(), Some("cart-1"));

    let set_cookie = resp.header("set-cookie").expect("cookie header");
    assert!(set_cookie.contains("Path=/"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(!set_cookie.contains("HttpOnly"));

    assert_eq!(ctx.summary().await.expect("summary"), json!({
        "totalQuantity": 1, "hasItems": true, "itemCount": 1
    }));
}

#[tokio::test]
async fn test_second_add_reuses_cart() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red&quantity=2")
        .await
        .expect("first add");
    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-blue")
        .await
        .expect("second add");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ctx.cart_cookie(), Some("cart-1"));
    assert_eq!(ctx.backend.call_counts().create, 1);
    assert_eq!(ctx.summary().await.expect("summary"), json!({
        "totalQuantity": 3, "hasItems": true, "itemCount": 2
    }));
}

#[tokio::test]
async fn test_add_with_expired_cart_starts_new_cart() {
    let mut ctx = TestContext::new();
    ctx.set_cart_cookie("cart-404");

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add request");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(ctx.cart_cookie(), Some("cart-1"));
    assert_eq!(ctx.summary().await.expect("summary")["totalQuantity"], 1);
}

#[tokio::test]
async fn test_stale_cookie_reads_empty_summary() {
    let mut ctx = TestContext::new();
    ctx.set_cart_cookie("cart-gone");

    let summary = ctx.summary().await.expect("summary");
    assert_eq!(summary, json!({
        "totalQuantity": 0, "hasItems": false, "itemCount": 0
    }));
}

// ============================================================================
// Update & Remove
// ============================================================================

#[tokio::test]
async fn test_update_quantity() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    let resp = ctx
        .post_form(
            "/cart/update",
            "line_id=line-1&merchandise_id=variant-m-red&quantity=4",
        )
        .await
        .expect("update");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header(HX_TRIGGER), Some("cart-updated"));
    assert_eq!(ctx.summary().await.expect("summary")["totalQuantity"], 4);
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    let resp = ctx
        .post_form(
            "/cart/update",
            "line_id=line-1&merchandise_id=variant-m-red&quantity=0",
        )
        .await
        .expect("update");

    assert_eq!(resp.status, StatusCode::OK);
    let counts = ctx.backend.call_counts();
    assert_eq!(counts.remove, 1);
    assert_eq!(counts.update, 0);
    assert_eq!(ctx.summary().await.expect("summary"), json!({
        "totalQuantity": 0, "hasItems": false, "itemCount": 0
    }));
}

#[tokio::test]
async fn test_remove_line() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");
    ctx.post_form("/cart/add", "merchandise_id=variant-m-blue")
        .await
        .expect("add");

    let resp = ctx
        .post_form("/cart/remove", "line_id=line-1")
        .await
        .expect("remove");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header(HX_TRIGGER), Some("cart-updated"));
    assert_eq!(ctx.summary().await.expect("summary"), json!({
        "totalQuantity": 1, "hasItems": true, "itemCount": 1
    }));
}

#[tokio::test]
async fn test_update_note() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    let resp = ctx
        .post_form("/cart/note", "note=Gift+wrap+please")
        .await
        .expect("note");
    assert_eq!(resp.status, StatusCode::OK);

    let cart = ctx.get("/cart").await.expect("cart").json().expect("json");
    assert_eq!(cart["note"], "Gift wrap please");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_rejected_mutation_has_no_trigger_and_keeps_summary() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");
    let before = ctx.summary().await.expect("summary");

    ctx.backend.reject_next_mutation("Variant is sold out");
    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-s-red")
        .await
        .expect("add");

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.header(HX_TRIGGER), None);
    assert!(resp.body.contains("Variant is sold out"), "{}", resp.body);
    assert_eq!(ctx.summary().await.expect("summary"), before);
}

#[tokio::test]
async fn test_backend_outage_on_first_add_sets_no_cookie() {
    let mut ctx = TestContext::new();
    ctx.backend.set_unavailable(true);

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    assert_eq!(resp.status, StatusCode::BAD_GATEWAY);
    assert_eq!(resp.header(HX_TRIGGER), None);
    assert_eq!(ctx.cart_cookie(), None);

    // Reads degrade to the empty shape instead of failing
    let summary = ctx.get("/api/cart/summary").await.expect("summary");
    assert_eq!(summary.status, StatusCode::OK);
}

#[tokio::test]
async fn test_validation_errors() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=&quantity=1")
        .await
        .expect("add");
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=0")
        .await
        .expect("add");
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);

    // Nothing reached the backend
    assert_eq!(ctx.backend.call_counts().create, 0);
    assert_eq!(ctx.cart_cookie(), None);
}

#[tokio::test]
async fn test_blank_quantity_on_add_defaults_to_one() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=")
        .await
        .expect("add");

    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.header(HX_TRIGGER), Some("cart-updated"));
    assert_eq!(ctx.summary().await.expect("summary")["totalQuantity"], 1);
}

#[tokio::test]
async fn test_malformed_quantity_renders_inline_error() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    let resp = ctx
        .post_form(
            "/cart/update",
            "line_id=line-1&merchandise_id=variant-m-red&quantity=-1",
        )
        .await
        .expect("update");

    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.header(HX_TRIGGER), None);
    assert!(resp.body.contains("cart-error"), "{}", resp.body);
    assert!(
        resp.body.contains("Quantity must be a whole number"),
        "{}",
        resp.body
    );

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=lots")
        .await
        .expect("add");
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body.contains("cart-error"), "{}", resp.body);

    assert_eq!(ctx.summary().await.expect("summary")["totalQuantity"], 1);
}

#[tokio::test]
async fn test_huge_quantities_are_rejected_not_overflowed() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=4294967295")
        .await
        .expect("add");
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp.header(HX_TRIGGER), None);
    assert_eq!(ctx.cart_cookie(), None);

    // Two maximal adds fit in u32; the third would overflow the line
    for _ in 0..2 {
        let resp = ctx
            .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=2147483647")
            .await
            .expect("add");
        assert_eq!(resp.status, StatusCode::OK);
    }
    let before = ctx.summary().await.expect("summary");

    let resp = ctx
        .post_form("/cart/add", "merchandise_id=variant-m-red&quantity=2147483647")
        .await
        .expect("add");
    assert_eq!(resp.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(resp.body.contains("Quantity limit exceeded"), "{}", resp.body);
    assert_eq!(ctx.summary().await.expect("summary"), before);
}

#[tokio::test]
async fn test_mutations_without_cart_are_missing_cart() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .post_form(
            "/cart/update",
            "line_id=line-1&merchandise_id=variant-m-red&quantity=2",
        )
        .await
        .expect("update");
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx
        .post_form("/cart/remove", "line_id=line-1")
        .await
        .expect("remove");
    assert_eq!(resp.status, StatusCode::CONFLICT);

    let resp = ctx.post_form("/cart/note", "note=hi").await.expect("note");
    assert_eq!(resp.status, StatusCode::CONFLICT);

    assert_eq!(ctx.backend.call_counts().create, 0);
}

#[tokio::test]
async fn test_update_on_expired_cart_clears_cookie() {
    let mut ctx = TestContext::new();
    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");
    let cart_id = storefront_cart_core::CartId::parse("cart-1").expect("cart id");
    ctx.backend.expire_cart(&cart_id);

    let resp = ctx
        .post_form(
            "/cart/update",
            "line_id=line-1&merchandise_id=variant-m-red&quantity=2",
        )
        .await
        .expect("update");

    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(ctx.cart_cookie(), None);
}

// ============================================================================
// Variants
// ============================================================================

#[tokio::test]
async fn test_variant_state_endpoint() {
    let mut ctx = TestContext::new();

    let state = ctx
        .get("/api/cart/variants/variant-m-red")
        .await
        .expect("variant")
        .json()
        .expect("json");
    assert_eq!(state, json!({ "isInCart": false, "quantity": 0, "lineId": null }));

    ctx.post_form("/cart/add", "merchandise_id=variant-m-red&quantity=2")
        .await
        .expect("add");

    let state = ctx
        .get("/api/cart/variants/variant-m-red")
        .await
        .expect("variant")
        .json()
        .expect("json");
    assert_eq!(state, json!({ "isInCart": true, "quantity": 2, "lineId": "line-1" }));
}

#[tokio::test]
async fn test_product_resolves_selected_options() {
    let mut ctx = TestContext::new();

    let resp = ctx
        .get("/products/tee?size=M&color=Blue&utm_source=mail")
        .await
        .expect("product");
    assert_eq!(resp.status, StatusCode::OK);

    let body = resp.json().expect("json");
    assert_eq!(body["variant"]["id"], "variant-m-blue");
    assert_eq!(body["cart"]["isInCart"], false);
}

#[tokio::test]
async fn test_product_falls_back_to_default_variant() {
    let mut ctx = TestContext::new();

    // No selection: first available variant
    let body = ctx.get("/products/tee").await.expect("product").json().expect("json");
    assert_eq!(body["variant"]["id"], "variant-s-blue");

    // Impossible combination: same default
    let body = ctx
        .get("/products/tee?size=XL&color=Blue")
        .await
        .expect("product")
        .json()
        .expect("json");
    assert_eq!(body["variant"]["id"], "variant-s-blue");
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let mut ctx = TestContext::new();
    let resp = ctx.get("/products/missing").await.expect("product");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_checkout_redirects() {
    let mut ctx = TestContext::new();

    let resp = ctx.get("/checkout").await.expect("checkout");
    assert!(resp.status.is_redirection());
    assert_eq!(resp.header("location"), Some("/cart"));

    ctx.post_form("/cart/add", "merchandise_id=variant-m-red")
        .await
        .expect("add");

    let resp = ctx.get("/checkout").await.expect("checkout");
    assert!(resp.status.is_redirection());
    assert_eq!(
        resp.header("location"),
        Some("https://checkout.invalid/cart-1")
    );
}
