//! `ecobin` entry-point: mounts a dashboard session against PostgreSQL and
//! logs the header it would render until interrupted.

use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use ecobin::config::DashboardSettings;
use ecobin::domain::{BalanceBus, DashboardSession};
use ecobin::outbound::persistence::{DbPool, dashboard_ports, run_pending_migrations};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        DashboardSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let identity = settings.identity().wrap_err("invalid identity settings")?;

    if settings.run_migrations {
        run_pending_migrations(settings.database_url())
            .await
            .wrap_err("failed to migrate database")?;
    }
    let pool = DbPool::new(settings.pool_config())
        .await
        .wrap_err("failed to connect to database")?;

    let bus = BalanceBus::new();
    let session = DashboardSession::mount(dashboard_ports(&pool), &bus, settings.session_config());
    session.identity_changed(identity).await;

    let mut report = tokio::time::interval(settings.report_interval());
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = report.tick() => report_header(&session),
            signal = &mut shutdown => {
                if let Err(error) = signal {
                    warn!(error = %error, "failed to listen for shutdown signal");
                }
                break;
            }
        }
    }

    info!("shutting down");
    session.unmount().await;
    Ok(())
}

fn report_header(session: &DashboardSession) {
    match serde_json::to_string(&session.header_view()) {
        Ok(header) => info!(header = %header, "dashboard header"),
        Err(error) => warn!(error = %error, "failed to serialise dashboard header"),
    }
}
