// src/monitor.rs
//! Periodic scan scheduler for all tracked domains

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::MonitoringConfig;
use crate::notifier::NotificationSink;
use crate::scanner::Enumerator;
use crate::store::Store;

/// Runs scan-and-notify cycles over every tracked domain at a fixed interval,
/// fanning out across a bounded worker pool.
pub struct Monitor {
    store: Arc<dyn Store>,
    scanner: Arc<dyn Enumerator>,
    notifier: Option<Arc<dyn NotificationSink>>,
    interval: Duration,
    workers: usize,
}

impl Monitor {
    pub fn new(
        store: Arc<dyn Store>,
        scanner: Arc<dyn Enumerator>,
        notifier: Option<Arc<dyn NotificationSink>>,
        cfg: &MonitoringConfig,
    ) -> Self {
        Self {
            store,
            scanner,
            notifier,
            interval: Duration::from_secs(cfg.interval_hours * 3600),
            workers: cfg.workers.max(1),
        }
    }

    /// Run the monitor (blocks until shutdown signal received).
    /// Performs one cycle immediately, then one per interval. Cycles are
    /// awaited in turn, so they never overlap.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        info!(
            "Monitor starting (interval: {} hours, {} workers)",
            self.interval.as_secs() / 3600,
            self.workers
        );

        self.run_cycle().await;

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {
                    self.run_cycle().await;
                }

                _ = shutdown_rx.changed() => {
                    info!("Monitor shutting down");
                    break;
                }
            }
        }
    }

    /// One pass over all tracked domains.
    pub async fn run_cycle(&self) {
        let domains = match self.store.list_targets().await {
            Ok(domains) => domains,
            Err(e) => {
                error!("Failed to fetch monitoring list, skipping cycle: {:#}", e);
                return;
            }
        };

        if domains.is_empty() {
            info!("No domains to monitor");
            return;
        }

        info!("Starting monitoring cycle for {} domains", domains.len());

        futures_util::stream::iter(domains)
            .for_each_concurrent(self.workers, |domain| async move {
                self.scan_and_notify(&domain).await;
            })
            .await;

        info!("Monitoring cycle complete");
    }

    /// Scan one domain, persist the diff, notify on anything new.
    /// Failures here are isolated to this domain's task.
    async fn scan_and_notify(&self, domain: &str) {
        info!("Monitoring {}", domain);

        let subdomains = match self.scanner.enumerate(domain).await {
            Ok(subdomains) => subdomains,
            Err(e) => {
                error!("Scan failed for {}: {:#}", domain, e);
                return;
            }
        };

        let new_subdomains = match self.store.save_subdomains(domain, &subdomains).await {
            Ok(new_subdomains) => new_subdomains,
            Err(e) => {
                error!("Failed to save subdomains for {}: {:#}", domain, e);
                return;
            }
        };

        if new_subdomains.is_empty() {
            info!("No new subdomains found for {}", domain);
            return;
        }

        info!(
            "{} new subdomains found for {}",
            new_subdomains.len(),
            domain
        );

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.notify(domain, &new_subdomains).await {
                warn!("Notification delivery failed for {}: {:#}", domain, e);
            }
        }
    }
}
