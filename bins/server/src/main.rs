//! Tally API Server
//!
//! Main entry point for the Tally billing backend.

use std::sync::Arc;

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally_api::{AppState, create_router};
use tally_core::BillingService;
use tally_core::company::CompanyProfileCache;
use tally_core::document::{DocumentDispatcher, PdfRenderer};
use tally_core::stock::{ItemCatalog, StockPolicy};
use tally_db::DbStore;
use tally_db::migration::Migrator;
use tally_messaging::HttpDeliveryGateway;
use tally_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;

    let db = tally_db::connect(&config.database).await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;

    let store = Arc::new(DbStore::new(db));
    let policy = StockPolicy::from_config(&config.stock);
    let company = CompanyProfileCache::from_config(&config.company);

    let dispatcher = if config.delivery.enabled {
        let gateway = HttpDeliveryGateway::from_config(&config.delivery)?;
        info!(endpoint = ?config.delivery.endpoint, "Document delivery enabled");
        DocumentDispatcher::new(Arc::new(PdfRenderer), Arc::new(gateway), company, policy)
    } else {
        warn!("Document delivery disabled; records will be saved without sending");
        DocumentDispatcher::disabled(company, policy)
    };

    if let Some(name) = config.stock.universal_item_name.as_deref() {
        let item = ItemCatalog::new(Arc::clone(&store))
            .ensure_universal_item(name)
            .await?;
        info!(item = %item.name, "Universal packaging item ready");
    }

    let billing = BillingService::new(Arc::clone(&store), dispatcher, policy);
    let state = AppState::new(&store, billing);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
