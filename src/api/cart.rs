use actix_web::{web, HttpResponse};
use serde_json::json;
use uuid::Uuid;

use crate::services::AddItemRequest;

use super::auth::AuthedUser;
use super::error::ApiError;
use super::AppState;

// ============================================================================
// Cart Endpoints
// ============================================================================

pub async fn get_cart(
    state: web::Data<AppState>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let cart = state.carts.get(user.0.id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

pub async fn add_item(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, ApiError> {
    let cart = state.carts.add_item(user.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

pub async fn remove_item(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let cart = state.carts.remove_item(user.0.id, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

pub async fn increase_quantity(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let cart = state
        .carts
        .increase_quantity(user.0.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}

pub async fn decrease_quantity(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let cart = state
        .carts
        .decrease_quantity(user.0.id, path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "cart": cart })))
}
