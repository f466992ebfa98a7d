use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::Utc;

use souk_auth::Operation;
use souk_search::search;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::Caller;

pub fn router() -> Router {
    Router::new().route("/search", get(search_products))
}

/// Anonymous callers and customers see active products only; admins also see inactive ones.
pub async fn search_products(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(caller): Extension<Caller>,
    params: Result<Query<dto::SearchParams>, QueryRejection>,
) -> axum::response::Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(rejection) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_request", rejection.body_text()),
    };
    if let Some(principal) = caller.principal() {
        if let Err(e) = principal.require(Operation::SearchCatalog) {
            return errors::domain_error_to_response(e);
        }
    }

    let request = match params.into_request(caller.is_admin()) {
        Ok(request) => request,
        Err(e) => return errors::domain_error_to_response(e),
    };

    let now = Utc::now();
    match search(&services.catalog, &request, &services.search, now) {
        Ok(page) => (StatusCode::OK, Json(dto::search_page_to_json(&page, now))).into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
