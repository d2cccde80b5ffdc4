use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::money::Money;
use crate::domain::promo::Discount;
use crate::domain::user::Role;

use super::auth::AuthedUser;
use super::error::ApiError;
use super::AppState;

// ============================================================================
// Promo Code Endpoints
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePromoRequest {
    pub code: String,
    #[serde(flatten)]
    pub discount: Discount,
    pub expiry_date: DateTime<Utc>,
    pub usage_limit: Option<i64>,
}

pub async fn create_promo(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<CreatePromoRequest>,
) -> Result<HttpResponse, ApiError> {
    if !user.0.is_operator() {
        return Err(ApiError::Forbidden("Operator role required".into()));
    }
    let body = body.into_inner();
    let promo = state
        .promos
        .create(body.code, body.discount, body.expiry_date, body.usage_limit, user.0.id)
        .await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "promoCode": promo })))
}

pub async fn list_promos(
    state: web::Data<AppState>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    if user.0.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin role required".into()));
    }
    let promos = state.promos.list().await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "promoCodes": promos })))
}

pub async fn delete_promo(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    if user.0.role != Role::Admin {
        return Err(ApiError::Forbidden("Admin role required".into()));
    }
    state.promos.delete(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Promo code deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatePromoRequest {
    pub code: String,
    /// Cart subtotal in cents. When present the response carries the
    /// discounted totals.
    pub amount: Option<i64>,
}

/// Validate-and-consume a promo code. A success spends one use.
pub async fn validate_promo(
    state: web::Data<AppState>,
    _user: AuthedUser,
    body: web::Json<ValidatePromoRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let redemption = state
        .promos
        .redeem(&body.code, body.amount.map(Money::from_cents))
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "code": redemption.code,
        "discount": redemption.discount,
        "discountAmount": redemption.discount_amount,
        "finalAmount": redemption.final_amount,
    })))
}
