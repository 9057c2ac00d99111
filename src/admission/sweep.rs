//! Background sweep of expired window records.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::broadcast;
use tokio::time;

use crate::admission::filter::AdmissionSettings;
use crate::admission::registry::WindowRegistry;
use crate::observability::metrics;

/// Periodic garbage collector for the window registry.
///
/// Ticks once per window duration and drops every record whose window
/// has expired, so a stale identity is gone within one extra window of
/// its expiry. Runs independently of request handling; each removal
/// takes the same per-shard lock as the admission check.
pub struct Sweeper {
    registry: Arc<WindowRegistry>,
    settings: Arc<ArcSwap<AdmissionSettings>>,
}

impl Sweeper {
    pub fn new(registry: Arc<WindowRegistry>, settings: Arc<ArcSwap<AdmissionSettings>>) -> Self {
        Self { registry, settings }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            window_ms = self.settings.load().window.as_millis() as u64,
            "Registry sweeper starting"
        );

        loop {
            // Re-read the window each cycle so a config reload shortens
            // or lengthens the next sweep, not just future ones.
            let window = self.settings.load().window;

            tokio::select! {
                _ = time::sleep(window) => {
                    let removed = self.registry.sweep();
                    let remaining = self.registry.len();
                    if removed > 0 {
                        tracing::debug!(removed, remaining, "Swept expired client windows");
                    }
                    metrics::record_sweep(removed, remaining);
                }
                _ = shutdown.recv() => {
                    tracing::info!("Sweeper received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
