//!
//! ParkWise vehicle-parking reservation service.
//! Reads configuration from TOML file (~/.config/parkwise/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use parkwise::api::handlers::health;
use parkwise::auth::JwtConfig;
use parkwise::domain::{Clock, SystemClock};
use parkwise::infrastructure::database::migrator::Migrator;
use parkwise::support::shutdown::{listen_for_shutdown_signals, ShutdownSignal};
use parkwise::{create_api_router, default_config_path, init_database, AppConfig, DatabaseConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = std::env::var("PARKWISE_CONFIG")
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            // Initialize logging with configured level
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.logging.level)),
                )
                .init();
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new("info"))
                .init();
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting ParkWise reservation service...");
    health::mark_started();

    let db_config = DatabaseConfig {
        url: app_cfg.database.connection_url(),
    };
    info!("Database: {}", db_config.url);

    let jwt_config = JwtConfig {
        secret: app_cfg.security.jwt_secret.clone(),
        expiration_hours: app_cfg.security.jwt_expiration_hours,
        issuer: "parkwise".to_string(),
    };
    info!(
        "JWT configured with {}h token expiration",
        jwt_config.expiration_hours
    );

    // ── Database ───────────────────────────────────────────────
    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    // Create default admin user if no users exist
    create_default_admin(&db, &app_cfg).await;

    // ── HTTP server ────────────────────────────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let api_router = create_api_router(db.clone(), jwt_config, clock);

    let shutdown = ShutdownSignal::new();
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    let api_addr = format!("{}:{}", app_cfg.server.api_host, app_cfg.server.api_port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown.clone();
    axum::serve(listener, api_router)
        .with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        })
        .await?;

    // Perform final cleanup
    if let Err(e) = db.close().await {
        warn!("Error closing database connection: {}", e);
    } else {
        info!("Database connection closed");
    }

    info!("ParkWise shutdown complete");
    Ok(())
}

/// Create default admin user if no users exist
async fn create_default_admin(db: &sea_orm::DatabaseConnection, app_cfg: &AppConfig) {
    use chrono::Utc;
    use parkwise::auth::hash_password;
    use parkwise::infrastructure::database::entities::user;
    use sea_orm::{ActiveModelTrait, EntityTrait, NotSet, PaginatorTrait, Set};

    let users_count = user::Entity::find().count(db).await.unwrap_or(0);

    if users_count == 0 {
        info!("Creating default admin user...");

        let password_hash = match hash_password(&app_cfg.admin.password) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Failed to hash admin password: {}", e);
                return;
            }
        };

        let admin = user::ActiveModel {
            id: NotSet,
            username: Set(app_cfg.admin.username.clone()),
            email: Set(app_cfg.admin.email.clone()),
            password_hash: Set(password_hash),
            full_name: Set("Administrator".to_string()),
            phone: Set(String::new()),
            address: Set(String::new()),
            pin_code: Set(String::new()),
            is_admin: Set(true),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            last_login_at: Set(None),
        };

        match admin.insert(db).await {
            Ok(created) => info!(
                "Default admin '{}' created (id {}). Change the password after first login.",
                created.username, created.id
            ),
            Err(e) => error!("Failed to create default admin: {}", e),
        }
    }
}
