//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database)
//!
//! # Products (public)
//! GET  /products                    - Product listing
//! GET  /products/{id}               - Product detail
//! GET  /search?q=                   - Search suggestions
//!
//! # Auth
//! POST /auth/session                - Verify provider token, bind stores
//! POST /auth/logout                 - Clear session, tear stores down
//! GET  /auth/me                     - Current identity, if any
//!
//! # Cart (signed-in; mutations are no-ops for anonymous visitors)
//! GET    /api/cart                  - Cart view
//! POST   /api/cart/items            - Add item (merges quantity)
//! PATCH  /api/cart/items/{id}       - Update line quantity
//! DELETE /api/cart/items/{id}       - Remove line
//! DELETE /api/cart                  - Clear cart
//! GET    /api/cart/count            - Unit count badge
//!
//! # Wishlist
//! GET    /api/wishlist              - Wishlist view
//! POST   /api/wishlist/items        - Save product
//! DELETE /api/wishlist/items/{id}   - Remove product
//!
//! # Addresses
//! GET    /api/addresses             - Saved addresses
//! POST   /api/addresses             - Add address
//! PUT    /api/addresses/{id}        - Edit address
//! DELETE /api/addresses/{id}       - Delete address
//! POST   /api/addresses/{id}/default - Set default address
//!
//! # Orders
//! GET  /api/orders                  - Order history
//! POST /api/checkout                - Place order from cart + address
//!
//! # Notices
//! GET  /api/notices                 - Drain queued failure notices
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod notices;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the full storefront router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Products
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::show))
        .route("/search", get(products::search))
        // Auth
        .route("/auth/session", post(auth::sign_in))
        .route("/auth/logout", post(auth::sign_out))
        .route("/auth/me", get(auth::me))
        // Cart
        .route("/api/cart", get(cart::show).delete(cart::clear))
        .route("/api/cart/items", post(cart::add))
        .route(
            "/api/cart/items/{id}",
            axum::routing::patch(cart::update).delete(cart::remove),
        )
        .route("/api/cart/count", get(cart::count))
        // Wishlist
        .route("/api/wishlist", get(wishlist::show))
        .route("/api/wishlist/items", post(wishlist::add))
        .route("/api/wishlist/items/{id}", axum::routing::delete(wishlist::remove))
        // Addresses
        .route(
            "/api/addresses",
            get(addresses::list).post(addresses::create),
        )
        .route(
            "/api/addresses/{id}",
            put(addresses::update).delete(addresses::remove),
        )
        .route("/api/addresses/{id}/default", post(addresses::set_default))
        // Orders
        .route("/api/orders", get(orders::history))
        .route("/api/checkout", post(orders::checkout))
        // Notices
        .route("/api/notices", get(notices::drain))
}
