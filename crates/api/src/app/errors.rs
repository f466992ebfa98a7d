use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use souk_core::DomainError;

pub fn status_for(err: &DomainError) -> StatusCode {
    match err {
        DomainError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        DomainError::NotFound(_) => StatusCode::NOT_FOUND,
        DomainError::AccessDenied(_) => StatusCode::FORBIDDEN,
        DomainError::ProductInactive(_)
        | DomainError::InsufficientStock { .. }
        | DomainError::InvalidStatus(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DomainError::Conflict(_) => StatusCode::CONFLICT,
        DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let status = status_for(&err);
    if let DomainError::Internal(detail) = &err {
        tracing::error!(%detail, "request failed with internal error");
        return json_error(status, err.kind(), "internal error");
    }
    json_error(status, err.kind(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
