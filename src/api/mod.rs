use std::sync::Arc;

use actix_web::{web, HttpResponse};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;

use crate::metrics::Metrics;
use crate::services::{CartService, CheckoutService, OrderLifecycle, PromoService};

pub mod auth;
pub mod cart;
pub mod error;
pub mod orders;
pub mod promo;

pub use error::ApiError;

// ============================================================================
// HTTP Surface
// ============================================================================
//
// Thin handlers over the services: deserialize, delegate, wrap the result in
// the `{ success, ... }` envelope. All business rules and authorization live
// one layer down.
//
// ============================================================================

pub struct AppState {
    pub checkout: CheckoutService,
    pub lifecycle: OrderLifecycle,
    pub carts: CartService,
    pub promos: PromoService,
    pub metrics: Arc<Metrics>,
    pub jwt_secret: String,
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/metrics", web::get().to(metrics_endpoint))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/orders")
                        // Literal segments before the {id} matcher.
                        .route("/create", web::post().to(orders::create_order))
                        .route("/all", web::get().to(orders::list_all_orders))
                        .route("/customers", web::get().to(orders::list_customers))
                        .route("", web::get().to(orders::list_own_orders))
                        .route("/{id}", web::get().to(orders::get_order))
                        .route("/{id}", web::put().to(orders::update_status))
                        .route("/{id}", web::delete().to(orders::delete_order))
                        .route("/{id}/tracking", web::get().to(orders::get_tracking))
                        .route("/{id}/tracking", web::put().to(orders::set_tracking))
                        .route("/{id}/tracking", web::delete().to(orders::remove_tracking))
                        .route("/{id}/message", web::get().to(orders::get_private_message))
                        .route("/{id}/message", web::put().to(orders::set_private_message))
                        .route("/{id}/send-email", web::post().to(orders::send_email))
                        .route("/{id}/email", web::get().to(orders::get_last_email))
                        .route("/{id}/email", web::delete().to(orders::clear_last_email))
                        .route("/{id}/invoice", web::get().to(orders::get_invoice)),
                )
                .service(
                    web::scope("/cart")
                        .route("", web::post().to(cart::add_item))
                        .route("", web::get().to(cart::get_cart))
                        .route("/{itemId}", web::delete().to(cart::remove_item))
                        .route("/{itemId}/increase", web::put().to(cart::increase_quantity))
                        .route("/{itemId}/decrease", web::put().to(cart::decrease_quantity)),
                )
                .service(
                    web::scope("/promo")
                        .route("", web::post().to(promo::create_promo))
                        .route("", web::get().to(promo::list_promos))
                        .route("/validate", web::post().to(promo::validate_promo))
                        .route("/{id}", web::delete().to(promo::delete_promo)),
                ),
        );
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn metrics_endpoint(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&state.metrics.registry().gather(), &mut buffer)
        .map_err(ApiError::internal)?;
    Ok(HttpResponse::Ok()
        .content_type(encoder.format_type().to_string())
        .body(buffer))
}
