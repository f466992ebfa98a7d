use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;

use souk_auth::Principal;
use souk_core::DeliveryId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_deliveries))
        .route("/tracking/:code", get(track_delivery))
        .route("/:id", get(get_delivery))
        .route("/:id/status", post(update_delivery_status))
}

pub async fn list_deliveries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    match services.lifecycle.all_deliveries(&principal) {
        Ok(deliveries) => (StatusCode::OK, Json(dto::deliveries_to_json(&deliveries))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let delivery_id = match id.parse::<DeliveryId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.delivery(&principal, delivery_id) {
        Ok(delivery) => (StatusCode::OK, Json(dto::delivery_to_json(&delivery))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn track_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.lifecycle.track(&principal, &code) {
        Ok(delivery) => (StatusCode::OK, Json(dto::delivery_to_json(&delivery))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_delivery_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::DeliveryStatusBody>, JsonRejection>,
) -> axum::response::Response {
    let delivery_id = match id.parse::<DeliveryId>() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text());
        }
    };
    let update = match body.into_update() {
        Ok(update) => update,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .update_delivery_status(&principal, delivery_id, update, Utc::now())
    {
        Ok(delivery) => (StatusCode::OK, Json(dto::delivery_to_json(&delivery))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
