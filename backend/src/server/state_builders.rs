//! Startup wiring: stores, role bootstrap and the service pair behind
//! [`HttpState`].

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{info, warn};

use proofboard::domain::ports::EntityStores;
use proofboard::domain::{AccountService, Error, PostService, RolePolicy, resolve_role, seed_roles};
use proofboard::inbound::http::state::HttpState;
use proofboard::outbound::memory::in_memory_stores;
use proofboard::outbound::persistence::{
    DbPool, MigrationError, PoolConfig, PoolError, diesel_stores, run_migrations,
};
use proofboard::settings::{AppSettings, SettingsError};

/// Fatal errors raised while preparing the application state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// A setting failed validation.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// Pending migrations could not be applied.
    #[error(transparent)]
    Migration(#[from] MigrationError),
    /// The connection pool could not be built.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// Role seeding or resolution failed.
    #[error("role bootstrap failed: {0}")]
    Roles(#[from] Error),
}

async fn build_stores(settings: &AppSettings) -> Result<EntityStores, StartupError> {
    match settings.database_url.as_deref() {
        Some(url) => {
            run_migrations(url).await?;
            let pool = DbPool::new(
                PoolConfig::new(url).with_max_size(settings.db_max_connections()),
            )
            .await?;
            info!(max_connections = settings.db_max_connections(), "using PostgreSQL store");
            Ok(diesel_stores(pool))
        }
        None => {
            warn!("no database configured; records are held in memory only");
            Ok(in_memory_stores())
        }
    }
}

/// Build the handler state for the configured backend.
///
/// # Errors
///
/// Returns [`StartupError`] when settings are invalid, the database cannot be
/// prepared, or the guest and admin roles cannot be resolved.
pub async fn build_http_state(settings: &AppSettings) -> Result<HttpState, StartupError> {
    let guest = settings.guest_role()?;
    let admin = settings.admin_role()?;
    let stores = build_stores(settings).await?;

    if settings.seed_roles {
        seed_roles(stores.roles.as_ref(), &[guest.clone(), admin.clone()]).await?;
    }
    let guest_role = resolve_role(stores.roles.as_ref(), &guest).await?;
    resolve_role(stores.roles.as_ref(), &admin).await?;

    let policy = RolePolicy::new(guest, admin);
    let accounts = AccountService::new(
        stores.clone(),
        policy.clone(),
        guest_role,
        Arc::new(DefaultClock),
    );
    let posts = PostService::new(stores, policy, Arc::new(DefaultClock));
    Ok(HttpState::from_services(Arc::new(accounts), Arc::new(posts)))
}
