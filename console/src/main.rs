//! Headless console run.
//!
//! Loads every region against the configured data service, prints a summary
//! and exits. Useful for checking credentials and connectivity.

use admin_console::region::{RegionId, RegionStatus};
use admin_console::service::HttpDataService;
use admin_console::types::Role;
use admin_console::{
    ConsoleAction, ConsoleConfig, ConsoleEnvironment, ConsoleReducer, ConsoleState,
    PermissionResolver, StaticPermissions,
};
use admin_console_runtime::Store;
use anyhow::Context;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const LOAD_TIMEOUT: Duration = Duration::from_secs(60);
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

fn permissions() -> anyhow::Result<StaticPermissions> {
    let id = std::env::var("ADMIN_CALLER_ID").unwrap_or_else(|_| "local".into());
    let role = match std::env::var("ADMIN_CALLER_ROLE") {
        Ok(raw) => raw
            .parse::<Role>()
            .with_context(|| format!("ADMIN_CALLER_ROLE={raw}"))?,
        Err(_) => Role::Admin,
    };
    Ok(StaticPermissions::new(id, role))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,admin_console=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ConsoleConfig::from_env();
    let caller = permissions()?.caller();
    tracing::info!(base_url = %config.api.base_url, caller = %caller.id, role = %caller.role, "Starting console");

    let service = HttpDataService::new(&config.api).context("building the HTTP client")?;
    let env = ConsoleEnvironment::with_system_clock(service);
    let store = Store::new(
        ConsoleState::with_config(caller, &config),
        ConsoleReducer::new(),
        env,
    );

    let mut actions = store.subscribe_actions();
    store.send(ConsoleAction::Load).await?;

    let mut pending: Vec<RegionId> = RegionId::ALL.to_vec();
    let waited = tokio::time::timeout(LOAD_TIMEOUT, async {
        while !pending.is_empty() {
            match actions.recv().await {
                Ok(action) => pending.retain(|region| !action.is_load_of(*region)),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Action stream lagged");
                    if store.state(ConsoleState::is_settled).await {
                        break;
                    }
                },
                Err(RecvError::Closed) => break,
            }
        }
    })
    .await;
    if waited.is_err() {
        tracing::warn!(?pending, "Gave up waiting for the initial load");
    }

    let summary = store
        .state(|s| {
            RegionId::ALL
                .into_iter()
                .map(|region| {
                    let detail = match s.status(region) {
                        RegionStatus::Ready => match region {
                            RegionId::Users => format!("{} users", s.users.items().len()),
                            RegionId::Products => format!("{} products", s.products.items().len()),
                            RegionId::Orders => format!("{} orders", s.orders.items().len()),
                            RegionId::Security => format!(
                                "{} alerts, {} blocked addresses",
                                s.security.alerts.items().len(),
                                s.security.blocked_ips().len()
                            ),
                        },
                        RegionStatus::Error => s
                            .region_error(region)
                            .map_or_else(|| "failed".to_string(), |e| format!("failed: {e}")),
                        other => format!("{other:?}"),
                    };
                    format!("{region:>10}: {detail}")
                })
                .collect::<Vec<_>>()
        })
        .await;

    for line in summary {
        println!("{line}");
    }

    // The auto refresh chain keeps a delay pending; it is abandoned here.
    if let Err(error) = store.shutdown(SHUTDOWN_TIMEOUT).await {
        tracing::debug!(%error, "Shutdown left effects running");
    }

    Ok(())
}
