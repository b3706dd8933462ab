//! Backend entry point: loads settings, wires stores and services, and serves
//! the REST API with OpenAPI docs in debug builds.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use color_eyre::eyre::eyre;
use color_eyre::eyre::{Context, Result};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use proofboard::inbound::http::health::HealthState;
use proofboard::inbound::http::session_config::{BuildMode, session_settings_from_env};
use proofboard::settings::AppSettings;
use server::{ServerConfig, build_http_state, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("failed to load settings")?;
    let session = session_settings_from_env(
        &mockable::DefaultEnv::new(),
        BuildMode::from_debug_assertions(),
    )
        .wrap_err("invalid session configuration")?;
    let bind_addr = settings.bind_addr()?;
    let http_state = build_http_state(&settings)
        .await
        .wrap_err("failed to prepare application state")?;

    let config = ServerConfig::new(session, bind_addr);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(Some(
        server::prometheus().map_err(|err| eyre!("configure Prometheus metrics: {err}"))?,
    ));

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, http_state, config)?;
    info!(%bind_addr, "proofboard listening");
    server.await?;
    Ok(())
}
