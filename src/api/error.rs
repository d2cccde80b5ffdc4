use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::domain::order::OrderError;
use crate::domain::ports::StoreError;
use crate::domain::promo::PromoError;
use crate::services::{CartServiceError, CheckoutError, LifecycleError};

// ============================================================================
// API Error Taxonomy
// ============================================================================
//
// Every failure crossing the HTTP boundary collapses into one of five
// statuses. Internal causes are logged server-side; the client sees a generic
// message so storage and mailer details never leak.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn internal(error: impl std::fmt::Display) -> Self {
        tracing::error!(error = %error, "request failed");
        ApiError::Internal
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "message": self.to_string(),
        }))
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::internal(error)
    }
}

impl From<OrderError> for ApiError {
    fn from(error: OrderError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<PromoError> for ApiError {
    fn from(error: PromoError) -> Self {
        match error {
            PromoError::NotFound => ApiError::NotFound(error.to_string()),
            PromoError::Store(inner) => ApiError::internal(inner),
            _ => ApiError::BadRequest(error.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::UnknownCustomer(_) => ApiError::Unauthorized(error.to_string()),
            CheckoutError::Order(inner) => inner.into(),
            CheckoutError::Promo(inner) => inner.into(),
            CheckoutError::Store(inner) => ApiError::internal(inner),
        }
    }
}

impl From<CartServiceError> for ApiError {
    fn from(error: CartServiceError) -> Self {
        match error {
            CartServiceError::Cart(inner) => ApiError::NotFound(inner.to_string()),
            CartServiceError::Store(inner) => ApiError::internal(inner),
        }
    }
}

impl From<LifecycleError> for ApiError {
    fn from(error: LifecycleError) -> Self {
        match error {
            LifecycleError::NotFound(_) => ApiError::NotFound(error.to_string()),
            LifecycleError::NotOwner => ApiError::Forbidden(error.to_string()),
            LifecycleError::Order(inner) => inner.into(),
            LifecycleError::Store(inner) => ApiError::internal(inner),
            LifecycleError::Notify(inner) => ApiError::internal(inner),
            LifecycleError::Invoice(inner) => ApiError::internal(inner),
        }
    }
}
