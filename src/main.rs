use hotel_inventory_reservation::adapter::driven::{
    InMemoryReservationStore, MySqlInventoryRepository, MySqlReservationRepository,
    MySqlReservationStore, MySqlRoomTypeRepository, SystemClock,
};
use hotel_inventory_reservation::adapter::driver::rest_api::{create_router, AppState};
use hotel_inventory_reservation::adapter::{
    AppConfig, DatabaseConfig, DatabaseMigration, StorageBackend,
};
use hotel_inventory_reservation::application::service::{
    InventoryApplicationService, InventoryCounterInitializer, ReservationApplicationService,
};
use hotel_inventory_reservation::domain::counter::InventoryCounter;
use hotel_inventory_reservation::domain::port::{
    Clock, InventoryRepository, ReservationRepository, ReservationStore, RoomTypeRepository,
};

use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// 永続化アダプター一式
struct Backends {
    room_types: Arc<dyn RoomTypeRepository>,
    reservations: Arc<dyn ReservationRepository>,
    inventory: Arc<dyn InventoryRepository>,
    store: Arc<dyn ReservationStore>,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("HOTEL_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn connect_backends(config: &AppConfig) -> Result<Backends, Box<dyn std::error::Error>> {
    match config.storage_backend {
        StorageBackend::MySql => {
            let db_config = DatabaseConfig::from_env()?;
            tracing::info!(host = %db_config.host, port = db_config.port, "connecting to MySQL");

            // プール取得の待機もロック待機と同じ上限で打ち切る
            let pool = MySqlPoolOptions::new()
                .max_connections(db_config.max_connections)
                .acquire_timeout(config.lock_timeout)
                .connect(&db_config.connection_string())
                .await?;

            DatabaseMigration::new(pool.clone())
                .run(config.seed_sample_data)
                .await?;

            Ok(Backends {
                room_types: Arc::new(MySqlRoomTypeRepository::new(pool.clone())),
                reservations: Arc::new(MySqlReservationRepository::new(pool.clone())),
                inventory: Arc::new(MySqlInventoryRepository::new(pool.clone())),
                store: Arc::new(MySqlReservationStore::new(pool, config.lock_timeout)),
            })
        }
        StorageBackend::Memory => {
            let store = if config.seed_sample_data {
                InMemoryReservationStore::with_sample_data(
                    config.lock_timeout,
                    SystemClock.today(),
                )
            } else {
                InMemoryReservationStore::new(config.lock_timeout)
            };
            tracing::warn!("using in-memory storage; data is lost on shutdown");

            let store = Arc::new(store);
            Ok(Backends {
                room_types: store.clone(),
                reservations: store.clone(),
                inventory: store.clone(),
                store,
            })
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .envファイルから環境変数を読み込む
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = ?config.storage_backend,
        lock_timeout_ms = config.lock_timeout.as_millis() as u64,
        inventory_max_range_days = config.inventory_max_range_days,
        "configuration loaded"
    );

    let backends = connect_backends(&config).await?;

    // リクエストの受け付け前に在庫カウンターを構築する
    let counter = Arc::new(InventoryCounter::new());
    InventoryCounterInitializer::new(backends.inventory.clone(), counter.clone())
        .run()
        .await?;

    let app_state = AppState {
        reservation_service: Arc::new(ReservationApplicationService::new(
            backends.room_types.clone(),
            backends.reservations,
            backends.store,
            counter.clone(),
            Arc::new(SystemClock),
        )),
        inventory_service: Arc::new(InventoryApplicationService::new(
            backends.room_types,
            backends.inventory,
            counter,
            config.inventory_max_range_days,
        )),
    };

    let app = create_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state);

    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    tracing::info!(addr = %config.server_addr, "REST API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
