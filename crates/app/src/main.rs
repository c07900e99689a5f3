use anyhow::Context;

use bodega_infra::{
    BodegaConfig, ProductRepository, ReconcileReport, ReconcileWatcher, SalesReconciler, SharedStore, open_store,
};

fn main() -> anyhow::Result<()> {
    bodega_observability::init();

    let config = BodegaConfig::from_env().context("invalid configuration")?;
    tracing::info!(store = ?config.store, watch = config.watch, "starting bodega");

    let store = open_store(&config.store).context("failed to open store")?;
    let report = reconcile_once(&store, &config)?;
    log_report(&report);

    if config.watch {
        let reconciler = SalesReconciler::new(store.clone(), &config.keys);
        let handle = ReconcileWatcher::spawn_with_observer(reconciler, &store, |result| match result {
            Ok(report) => log_report(report),
            Err(err) => tracing::error!(error = %err, "reconciliation failed"),
        })
        .context("failed to start the sales watcher")?;

        tracing::info!(key = %config.keys.sales, "watching the sales log");
        handle.join();
    }

    Ok(())
}

/// Seed the catalog on first use, then fold in any pending sales.
fn reconcile_once(store: &SharedStore, config: &BodegaConfig) -> anyhow::Result<ReconcileReport> {
    let products = ProductRepository::new(store.clone(), config.keys.products.clone());
    if products.ensure_seeded().context("failed to seed the product list")? {
        tracing::info!(key = %config.keys.products, "seeded default product list");
    }

    SalesReconciler::new(store.clone(), &config.keys)
        .reconcile()
        .context("reconciliation failed")
}

fn log_report(report: &ReconcileReport) {
    for notice in report.notices() {
        tracing::info!(product_id = %notice.product_id, "{notice}");
    }
    for adjustment in report.oversold() {
        tracing::warn!(
            product_id = %adjustment.product_id,
            oversold = adjustment.oversold,
            "more units sold than were on hand"
        );
    }
    match serde_json::to_string(report) {
        Ok(summary) => tracing::info!(%summary, "reconciliation finished"),
        Err(err) => tracing::warn!(error = %err, "could not encode reconciliation summary"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodega_infra::{KeyValueStore, ReconcileOutcome, StorageKeys, StoreBackend};

    fn memory_config() -> BodegaConfig {
        BodegaConfig {
            store: StoreBackend::Memory,
            keys: StorageKeys::default(),
            watch: false,
        }
    }

    #[test]
    fn first_start_seeds_and_applies_pending_sales() {
        let config = memory_config();
        let store = open_store(&config.store).unwrap();
        store
            .set(&config.keys.sales, r#"[{"items":[{"id":"P-001","cantidad":20}]}]"#)
            .unwrap();

        let report = reconcile_once(&store, &config).unwrap();

        assert_eq!(report.outcome, ReconcileOutcome::Applied { records: 1 });
        assert_eq!(report.adjustments[0].current, 480);
        assert_eq!(store.get(&config.keys.cursor).unwrap().as_deref(), Some("1"));

        let again = reconcile_once(&store, &config).unwrap();
        assert_eq!(again.outcome, ReconcileOutcome::UpToDate);
    }
}
