use order_engine::orders::SyncNotification;
use order_engine::utils::logger::{APP_LOG_RETENTION_DAYS, cleanup_old_logs};
use order_engine::{Config, EngineState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment, config, logging
    dotenv::dotenv().ok();
    let config = Config::from_env();
    config.ensure_work_dir_structure()?;
    init_logger_with_file(&config.log_level, config.log_json, Some(&config.logs_dir()))?;
    if let Err(e) = cleanup_old_logs(&config.logs_dir(), APP_LOG_RETENTION_DAYS) {
        tracing::warn!(error = %e, "Initial log cleanup failed");
    }

    tracing::info!(
        environment = %config.environment,
        work_dir = %config.work_dir,
        policy = %config.transition_policy,
        "Order engine starting"
    );

    // 2. Services
    let state = EngineState::initialize(&config)?;

    match state.checkout.flush_offline_orders().await {
        Ok(report) if !report.pushed.is_empty() => {
            tracing::info!(pushed = report.pushed.len(), "Pushed orders saved while offline");
        }
        Ok(_) => {}
        Err(e) => tracing::warn!(error = %e, "Could not flush offline orders"),
    }

    // 3. Admin live view
    let mut listener = state.live_sync.listen();
    state.start_live_sync().await?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown requested");
                break;
            }
            notification = listener.recv() => match notification {
                Some(SyncNotification::OrdersUpdated { changes, stats, .. }) => {
                    tracing::info!(
                        changes = changes.len(),
                        orders = stats.total_orders,
                        pending = stats.pending,
                        sales = stats.total_sales,
                        sales_today = stats.sales_today,
                        "Admin view updated"
                    );
                }
                Some(SyncNotification::Error { message, .. }) => {
                    tracing::error!(error = %message, "Live view lost its feed");
                }
                None => break,
            }
        }
    }

    state.live_sync.stop();
    tracing::info!("Order engine stopped");
    Ok(())
}
