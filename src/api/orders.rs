use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::services::CheckoutRequest;

use super::auth::AuthedUser;
use super::error::ApiError;
use super::AppState;

// ============================================================================
// Order Endpoints
// ============================================================================

pub async fn create_order(
    state: web::Data<AppState>,
    user: AuthedUser,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state.checkout.checkout(user.0.id, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({ "success": true, "order": order })))
}

pub async fn list_own_orders(
    state: web::Data<AppState>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let orders = state.lifecycle.list_own(&user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": orders })))
}

pub async fn list_all_orders(
    state: web::Data<AppState>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let orders = state.lifecycle.list_all(&user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": orders })))
}

pub async fn list_customers(
    state: web::Data<AppState>,
    user: AuthedUser,
) -> Result<HttpResponse, ApiError> {
    let customers = state.lifecycle.customers(&user.0).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "customers": customers })))
}

pub async fn get_order(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.lifecycle.get(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn delete_order(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    state.lifecycle.delete(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "message": "Order deleted" })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub tracking_id: Option<String>,
}

pub async fn update_status(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let order = state
        .lifecycle
        .update_status(&user.0, path.into_inner(), &body.status, body.tracking_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn get_tracking(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.lifecycle.get(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "trackingId": order.tracking_id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    pub tracking_id: String,
}

pub async fn set_tracking(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
    body: web::Json<TrackingRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .lifecycle
        .set_tracking(&user.0, path.into_inner(), body.into_inner().tracking_id)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn remove_tracking(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.lifecycle.remove_tracking(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn get_private_message(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    if !user.0.is_operator() {
        return Err(ApiError::Forbidden("Not allowed to access this order".into()));
    }
    let order = state.lifecycle.get(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "privateMessage": order.private_message })))
}

#[derive(Debug, Deserialize)]
pub struct PrivateMessageRequest {
    pub message: String,
}

pub async fn set_private_message(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
    body: web::Json<PrivateMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .lifecycle
        .set_private_message(&user.0, path.into_inner(), body.into_inner().message)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub subject: String,
    pub message: String,
}

pub async fn send_email(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
    body: web::Json<SendEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let order = state
        .lifecycle
        .send_email(&user.0, path.into_inner(), &body.subject, &body.message)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn get_last_email(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    if !user.0.is_operator() {
        return Err(ApiError::Forbidden("Not allowed to access this order".into()));
    }
    let order = state.lifecycle.get(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "lastEmailSent": order.last_email_sent })))
}

pub async fn clear_last_email(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.lifecycle.clear_email(&user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

pub async fn get_invoice(
    state: web::Data<AppState>,
    user: AuthedUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let bytes = state.lifecycle.invoice(&user.0, order_id).await?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"invoice-{order_id}.pdf\""),
        ))
        .body(bytes))
}
