use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;

use souk_auth::Principal;
use souk_core::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(place_order).get(list_orders))
        .route("/mine", get(my_orders))
        .route("/:id", get(get_order))
        .route("/:id/confirm", post(confirm_order))
        .route("/:id/payment", put(set_payment_status))
        .route("/:id/status", put(update_order_status))
        .route("/:id/deliveries", post(create_delivery).get(order_deliveries))
}

fn bad_body(rejection: JsonRejection) -> axum::response::Response {
    errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text())
}

fn parse_order_id(raw: &str) -> Result<OrderId, axum::response::Response> {
    raw.parse::<OrderId>().map_err(errors::domain_error_to_response)
}

pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    body: Result<Json<dto::PlaceOrderBody>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.builder.place_order(&principal, request, Utc::now()) {
        Ok(order) => (StatusCode::CREATED, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    params: Result<Query<dto::OrderListParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text()),
    };
    let query = match params.into_query() {
        Ok(query) => query,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.lifecycle.list_orders(&principal, &query) {
        Ok(page) => (StatusCode::OK, Json(dto::order_page_to_json(&page))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn my_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
) -> axum::response::Response {
    match services.lifecycle.orders_for_customer(&principal) {
        Ok(orders) => (StatusCode::OK, Json(dto::orders_to_json(&orders))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.order(&principal, order_id) {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

/// The body is optional; `{}` or no body keeps the address given at placement.
pub async fn confirm_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Option<Json<dto::ConfirmOrderBody>>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let body = body.map(|Json(b)| b).unwrap_or_default();

    match services
        .lifecycle
        .confirm_order(&principal, order_id, body.shipping_address, Utc::now())
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn set_payment_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::PaymentStatusBody>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let status = match body.status() {
        Ok(status) => status,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .set_payment_status(&principal, order_id, status, body.note, Utc::now())
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::OrderStatusBody>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let status = match body.status() {
        Ok(status) => status,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .update_order_status(&principal, order_id, status, Utc::now())
    {
        Ok(order) => (StatusCode::OK, Json(dto::order_to_json(&order))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn create_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    body: Result<Json<dto::CreateDeliveryBody>, JsonRejection>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => return bad_body(rejection),
    };
    let request = match body.into_new_delivery() {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .lifecycle
        .create_delivery(&principal, order_id, request, Utc::now())
    {
        Ok(delivery) => (StatusCode::CREATED, Json(dto::delivery_to_json(&delivery))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn order_deliveries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id = match parse_order_id(&id) {
        Ok(id) => id,
        Err(resp) => return resp,
    };

    match services.lifecycle.deliveries_for_order(&principal, order_id) {
        Ok(deliveries) => (StatusCode::OK, Json(dto::deliveries_to_json(&deliveries))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
