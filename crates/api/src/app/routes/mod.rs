use axum::{routing::get, Router};

pub mod deliveries;
pub mod orders;
pub mod products;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/deliveries", deliveries::router())
}

/// Public endpoints that still honour an optional bearer token.
pub fn public_router() -> Router {
    Router::new().nest("/products", products::router())
}
