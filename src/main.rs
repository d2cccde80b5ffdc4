use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod invoice;
mod metrics;
mod notify;
mod services;
mod store;
mod utils;

use api::AppState;
use invoice::PdfInvoiceRenderer;
use notify::{Notifier, SmtpMailer};
use services::{CartService, CheckoutService, OrderLifecycle, PromoService};
use store::{init_schema, PgCartStore, PgCatalog, PgOrderStore, PgPromoStore, PgUserDirectory};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with environment-based filtering.
    // Default to INFO level, can be overridden with RUST_LOG env var.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,stitchcart=debug")),
        )
        .init();

    let config = config::Config::load();

    // === 1. Storage ===
    tracing::info!(database_url = %config.database_url, "connecting to Postgres");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    init_schema(&pool).await?;

    let users = Arc::new(PgUserDirectory::new(pool.clone()));
    let catalog = Arc::new(PgCatalog::new(pool.clone()));
    let carts = Arc::new(PgCartStore::new(pool.clone()));
    let promos = Arc::new(PgPromoStore::new(pool.clone()));
    let orders = Arc::new(PgOrderStore::new(pool.clone()));

    // === 2. Metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);

    // === 3. Outbound email ===
    let mailer = Arc::new(SmtpMailer::new(&config.smtp)?);
    let notifier = Notifier::new(mailer, metrics.clone());

    // === 4. Services ===
    let state = web::Data::new(AppState {
        checkout: CheckoutService::new(
            users.clone(),
            catalog.clone(),
            carts.clone(),
            promos.clone(),
            orders.clone(),
            notifier.clone(),
            metrics.clone(),
        ),
        lifecycle: OrderLifecycle::new(
            orders.clone(),
            users.clone(),
            notifier,
            Arc::new(PdfInvoiceRenderer::new()),
        ),
        carts: CartService::new(catalog, carts),
        promos: PromoService::new(promos, metrics.clone()),
        metrics,
        jwt_secret: config.jwt_secret.clone(),
    });

    // === 5. HTTP server ===
    tracing::info!(host = %config.host, port = config.port, "starting HTTP server");
    HttpServer::new(move || App::new().app_data(state.clone()).configure(api::configure))
        .bind((config.host.as_str(), config.port))?
        .run()
        .await?;

    Ok(())
}
