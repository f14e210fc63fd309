use std::time::Duration;

use log::*;
use settlement_engine::{events::EventProducers, ReconciliationApi, SettlementConfig, SqliteDatabase};
use tokio::task::JoinHandle;

use crate::paystack::PaystackClient;

/// Starts the reconciliation worker. Every `interval`, pending payments older than `stale_age` are verified with the
/// gateway (or voided, for wallet attempts) and brought to a final state where possible.
///
/// Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_reconciliation_worker(
    db: SqliteDatabase,
    gateway: PaystackClient,
    config: SettlementConfig,
    producers: EventProducers,
    interval: Duration,
    stale_age: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        let api = ReconciliationApi::new(db, gateway, config, producers);
        info!("🕰️ Stale payment reconciliation worker started");
        loop {
            timer.tick().await;
            debug!("🕰️ Running stale payment reconciliation job");
            match api.reconcile_stale_payments(stale_age).await {
                Ok(summary) if summary.total() == 0 => trace!("🕰️ No stale payments found"),
                Ok(summary) => {
                    info!(
                        "🕰️ Reconciled {} stale payments. {} succeeded, {} failed, {} still pending, {} refunded, {} errors",
                        summary.total(),
                        summary.succeeded,
                        summary.failed,
                        summary.still_pending,
                        summary.refunded,
                        summary.errors
                    );
                },
                Err(e) => {
                    error!("🕰️ Error running stale payment reconciliation job: {e}");
                },
            }
        }
    })
}
