use actix_web::{web, HttpServer};
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use mfa_api::{create_app, middleware::TokenVerifier, telemetry, AppState};
use mfa_core::repositories::{IdentityStore, InMemoryIdentityStore, InMemorySessionStore, SessionStore};
use mfa_core::services::AccessGuard;
use mfa_infra::cache::{RedisClient, RedisSessionStore};
use mfa_infra::database::{DatabasePool, MySqlIdentityStore};
use mfa_infra::notification::create_dispatcher;
use mfa_shared::config::{AppConfig, StorageBackend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env();
    telemetry::init(&config.logging);

    config
        .mfa
        .validate()
        .map_err(anyhow::Error::msg)
        .context("Invalid MAIL2FA_* configuration")?;

    info!(
        environment = ?config.environment,
        enabled = config.mfa.enabled,
        "Starting Mail2FA API server"
    );
    if config.auth.jwt.is_using_default_secret() {
        warn!("JWT_SECRET is not set; using the built-in development secret");
    }

    let identities = build_identity_store(&config).await?;
    let sessions = build_session_store(&config).await?;
    let dispatcher = create_dispatcher(&config.mail, &config.mfa, config.environment)
        .context("Failed to configure mail delivery")?;

    let verifier = Arc::new(
        TokenVerifier::new(&config.auth.jwt).context("Invalid JWT configuration")?,
    );
    let guard = AccessGuard::new(identities, sessions, dispatcher, config.mfa.clone());
    let state = web::Data::new(AppState::new(guard, verifier, config.auth.session.clone()));

    let bind_address = config.server.bind_address();
    info!("Server will bind to: {}", bind_address);

    let mut server = HttpServer::new(move || create_app(state.clone()));
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await?;

    Ok(())
}

async fn build_identity_store(config: &AppConfig) -> anyhow::Result<Arc<dyn IdentityStore>> {
    match config.identity_backend {
        StorageBackend::Mysql => {
            let pool = DatabasePool::new(config.database.clone())
                .await
                .context("Failed to connect to MySQL")?;
            if config.database.run_migrations {
                pool.run_migrations().await.context("Failed to run migrations")?;
            }
            let store = MySqlIdentityStore::new(pool.get_pool().clone(), pool.users_table())?;
            info!(table = %pool.users_table(), "Using MySQL identity store");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory identity store; codes are lost on restart");
            Ok(Arc::new(InMemoryIdentityStore::new()))
        }
        StorageBackend::Redis => anyhow::bail!("Redis is not supported as an identity backend"),
    }
}

async fn build_session_store(config: &AppConfig) -> anyhow::Result<Arc<dyn SessionStore>> {
    match config.session_backend {
        StorageBackend::Redis => {
            let client = RedisClient::new(config.cache.clone())
                .await
                .context("Failed to connect to Redis")?;
            info!("Using Redis session store");
            Ok(Arc::new(RedisSessionStore::new(
                client,
                config.mfa.session_key.clone(),
                config.auth.session.timeout,
            )))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory session store; sessions are lost on restart");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
        StorageBackend::Mysql => anyhow::bail!("MySQL is not supported as a session backend"),
    }
}
