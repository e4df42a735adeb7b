use std::sync::{Arc, Mutex};

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use appointment_cell::services::events::{LedgerChange, LedgerObserver};

use crate::services::aggregator::AnalyticsService;

/// At most one refresh waits in the queue; later requests fold into it.
const QUEUE_CAPACITY: usize = 1;

/// Background task that recomputes analytics after ledger changes.
pub struct AnalyticsRefresher {
    sender: Mutex<Option<mpsc::Sender<LedgerChange>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl AnalyticsRefresher {
    /// Spawn the worker on the current runtime.
    pub fn start(service: AnalyticsService) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let worker = tokio::spawn(worker_loop(service, receiver));

        info!("Analytics refresher started");
        Arc::new(Self {
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Queue a refresh. Never blocks and never fails the caller.
    pub fn request_refresh(&self, change: LedgerChange) {
        let guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let Some(sender) = guard.as_ref() else {
            debug!("Refresher stopped, ignoring {} change", change.as_str());
            return;
        };

        match sender.try_send(change) {
            Ok(()) => debug!("Analytics refresh queued after {}", change.as_str()),
            Err(TrySendError::Full(_)) => {
                debug!("Analytics refresh already pending, coalescing {}", change.as_str())
            }
            Err(TrySendError::Closed(_)) => warn!("Analytics refresher is not running"),
        }
    }

    /// Stop accepting requests, let the worker finish what is queued and
    /// wait for it to exit.
    pub async fn shutdown(&self) {
        let sender = match self.sender.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        drop(sender);

        let worker = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                error!("Analytics refresher task failed: {}", e);
            }
            info!("Analytics refresher stopped");
        }
    }
}

impl LedgerObserver for AnalyticsRefresher {
    fn ledger_changed(&self, change: LedgerChange) {
        self.request_refresh(change);
    }
}

async fn worker_loop(service: AnalyticsService, mut receiver: mpsc::Receiver<LedgerChange>) {
    while let Some(change) = receiver.recv().await {
        debug!("Refreshing analytics after {}", change.as_str());
        if let Err(e) = service.recompute().await {
            error!("Failed to refresh analytics after {}: {}", change.as_str(), e);
        }
    }
    debug!("Analytics refresher queue closed");
}
