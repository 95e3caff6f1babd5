//! Cart identity held in the `cartId` cookie.
//!
//! The identity is an opaque backend cart id. It is created lazily by the
//! first add-to-cart, never mutated, and abandoned (not deleted on the
//! backend) when the backend stops recognizing it.

use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{
        HeaderValue,
        header::{COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{IntoResponseParts, ResponseParts},
};
use storefront_cart_core::CartId;
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::{info, instrument, warn};

use super::backend::CartBackend;
use super::error::CartError;

/// Name of the cookie carrying the cart identity.
pub const CART_ID_COOKIE: &str = "cartId";

/// Storage for the current session's cart identity.
pub trait IdentityStore {
    /// The bound identity, if any.
    fn get(&self) -> Option<CartId>;

    /// Bind a freshly created identity.
    fn bind(&mut self, cart_id: CartId);

    /// Abandon the current identity.
    fn forget(&mut self);
}

/// Return the bound identity, creating a backend cart first if there is none.
///
/// The identity is bound only after the backend confirmed the cart, so a
/// failed creation never leaves the session pointing at a nonexistent cart.
///
/// # Errors
///
/// Returns `CartError::BackendUnavailable` if cart creation fails.
#[instrument(skip_all)]
pub async fn ensure_identity<S, B>(store: &mut S, backend: &B) -> Result<CartId, CartError>
where
    S: IdentityStore + ?Sized,
    B: CartBackend,
{
    if let Some(cart_id) = store.get() {
        return Ok(cart_id);
    }

    let cart = backend.create_cart().await.map_err(|e| {
        warn!(error = %e, "Failed to create cart");
        CartError::BackendUnavailable(e)
    })?;

    info!(cart_id = %cart.id, "Created cart");
    store.bind(cart.id.clone());
    Ok(cart.id)
}

// =============================================================================
// Shared store
// =============================================================================

/// Identity store shared by every component of one browser profile.
///
/// Models the cookie jar on the client side: all clones see the same value,
/// and writes are atomic.
#[derive(Clone, Default)]
pub struct SharedIdentityStore {
    inner: Arc<RwLock<Option<CartId>>>,
}

impl SharedIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an identity already bound.
    #[must_use]
    pub fn with_identity(cart_id: CartId) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Some(cart_id))),
        }
    }
}

impl IdentityStore for SharedIdentityStore {
    fn get(&self) -> Option<CartId> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn bind(&mut self, cart_id: CartId) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(cart_id);
    }

    fn forget(&mut self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// =============================================================================
// Request cookie store
// =============================================================================

/// Cookie attributes for the cart identity.
#[derive(Debug, Clone, Copy, Default)]
pub struct CookieSettings {
    /// Mark the cookie `Secure` (production, HTTPS).
    pub secure: bool,
}

#[derive(Debug, Clone)]
enum CookieChange {
    Bind(CartId),
    Forget,
}

/// Identity store backed by the request's `cartId` cookie.
///
/// Extract it in a handler, pass it to the gateway, and return it as part of
/// the response so any change is written back with `Set-Cookie`.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(
///     State(state): State<AppState>,
///     mut identity: CookieIdentityStore,
/// ) -> impl IntoResponse {
///     let result = state.gateway().add_line(&mut identity, "gid://...", 1).await;
///     (identity, render(result))
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct CookieIdentityStore {
    current: Option<CartId>,
    change: Option<CookieChange>,
    settings: CookieSettings,
}

impl CookieIdentityStore {
    /// Read the identity from request headers.
    #[must_use]
    pub fn from_headers(headers: &axum::http::HeaderMap, settings: CookieSettings) -> Self {
        let current = headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == CART_ID_COOKIE)
            .and_then(|cookie| CartId::parse(cookie.value()).ok());

        Self {
            current,
            change: None,
            settings,
        }
    }

    /// The `Set-Cookie` value for a pending change, if any.
    #[must_use]
    pub fn set_cookie(&self) -> Option<String> {
        let cookie = match self.change.as_ref()? {
            CookieChange::Bind(cart_id) => Cookie::build((CART_ID_COOKIE, cart_id.to_string()))
                .path("/")
                .same_site(SameSite::Lax)
                .secure(self.settings.secure)
                .http_only(false)
                .build(),
            CookieChange::Forget => {
                let mut cookie = Cookie::build((CART_ID_COOKIE, "")).path("/").build();
                cookie.make_removal();
                cookie
            }
        };
        Some(cookie.to_string())
    }
}

impl IdentityStore for CookieIdentityStore {
    fn get(&self) -> Option<CartId> {
        self.current.clone()
    }

    fn bind(&mut self, cart_id: CartId) {
        self.current = Some(cart_id.clone());
        self.change = Some(CookieChange::Bind(cart_id));
    }

    fn forget(&mut self) {
        self.current = None;
        self.change = Some(CookieChange::Forget);
    }
}

impl<S> FromRequestParts<S> for CookieIdentityStore
where
    S: Send + Sync,
    CookieSettings: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, CookieSettings::from_ref(state)))
    }
}

impl IntoResponseParts for CookieIdentityStore {
    type Error = Infallible;

    fn into_response_parts(self, mut res: ResponseParts) -> Result<ResponseParts, Self::Error> {
        if let Some(cookie) = self.set_cookie() {
            match HeaderValue::from_str(&cookie) {
                Ok(value) => {
                    res.headers_mut().append(SET_COOKIE, value);
                }
                Err(e) => warn!(error = %e, "Cart cookie is not a valid header value"),
            }
        }
        Ok(res)
    }
}
