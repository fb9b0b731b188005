//! Background dispatch of single-record synchronization.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock, mpsc};
use tracing::{debug, error, info, warn};

use super::error::{SyncError, SyncResult};
use super::job::{SyncJob, SyncOutcome};
use crate::core::config::SyncConfig;

/// Last known state of a record's synchronization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncStatus {
    Queued { since: DateTime<Utc> },
    Running { since: DateTime<Utc> },
    Completed { at: DateTime<Utc>, outcome: SyncOutcome },
    Failed { at: DateTime<Utc>, error: String },
}

impl SyncStatus {
    /// When the last run ended; `None` while a run is queued or running.
    pub fn settled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Completed { at, .. } | Self::Failed { at, .. } => Some(*at),
            Self::Queued { .. } | Self::Running { .. } => None,
        }
    }
}

struct Tracked {
    status: SyncStatus,
    /// Accepted requests not yet picked up by a worker.
    pending: usize,
}

/// Per-record statuses.
///
/// Records with queued or running work are always kept. Past `capacity`,
/// the records that settled longest ago are dropped.
struct StatusTable {
    entries: HashMap<String, Tracked>,
    capacity: usize,
}

impl StatusTable {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            capacity,
        }
    }

    fn get(&self, record_id: &str) -> Option<SyncStatus> {
        self.entries.get(record_id).map(|t| t.status.clone())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    /// A request for `record_id` entered the queue.
    fn accepted(&mut self, record_id: &str) {
        let now = Utc::now();
        let entry = self
            .entries
            .entry(record_id.to_string())
            .or_insert_with(|| Tracked {
                status: SyncStatus::Queued { since: now },
                pending: 0,
            });
        entry.pending += 1;
        // A running sync keeps reporting `running` until it ends.
        if entry.status.settled_at().is_some() {
            entry.status = SyncStatus::Queued { since: now };
        }
        self.evict();
    }

    /// A request for `record_id` could not be queued.
    fn rejected(&mut self, record_id: &str, error: String) {
        if let Some(entry) = self.entries.get_mut(record_id) {
            entry.pending = entry.pending.saturating_sub(1);
            if entry.pending == 0 && !matches!(entry.status, SyncStatus::Running { .. }) {
                entry.status = SyncStatus::Failed {
                    at: Utc::now(),
                    error,
                };
            }
        }
        self.evict();
    }

    fn started(&mut self, record_id: &str) {
        let now = Utc::now();
        let entry = self
            .entries
            .entry(record_id.to_string())
            .or_insert_with(|| Tracked {
                status: SyncStatus::Running { since: now },
                pending: 1,
            });
        entry.pending = entry.pending.saturating_sub(1);
        entry.status = SyncStatus::Running { since: now };
    }

    /// Record the end of a run, unless another run for the record is waiting.
    fn finished(&mut self, record_id: &str, status: SyncStatus) {
        let entry = self
            .entries
            .entry(record_id.to_string())
            .or_insert_with(|| Tracked {
                status: status.clone(),
                pending: 0,
            });
        entry.status = if entry.pending > 0 {
            SyncStatus::Queued { since: Utc::now() }
        } else {
            status
        };
        self.evict();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|(_, t)| t.pending == 0)
                .filter_map(|(id, t)| t.status.settled_at().map(|at| (at, id)))
                .min()
                .map(|(_, id)| id.clone());
            match oldest {
                Some(id) => {
                    self.entries.remove(&id);
                }
                None => break,
            }
        }
    }
}

type SharedStatuses = Arc<RwLock<StatusTable>>;

/// Bounded queue of record ids drained by a fixed pool of workers.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct SyncQueue {
    sender: mpsc::Sender<String>,
    statuses: SharedStatuses,
}

impl SyncQueue {
    /// Spawn the worker pool on the current tokio runtime.
    pub fn start(job: Arc<SyncJob>, config: &SyncConfig) -> Self {
        let workers = config.workers.max(1);
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let receiver = Arc::new(Mutex::new(receiver));
        let statuses = Arc::new(RwLock::new(StatusTable::new(config.status_capacity.max(1))));

        for worker in 0..workers {
            tokio::spawn(run_worker(
                worker,
                job.clone(),
                receiver.clone(),
                statuses.clone(),
            ));
        }
        info!(
            "Sync queue started ({} workers, capacity {})",
            workers, config.queue_capacity
        );

        Self { sender, statuses }
    }

    /// Queue a sync for `record_id` without waiting for it to run.
    pub async fn enqueue(&self, record_id: &str) -> SyncResult<()> {
        // Recorded before sending so a fast worker's status is never overwritten.
        self.statuses.write().await.accepted(record_id);

        let err = match self.sender.try_send(record_id.to_string()) {
            Ok(()) => {
                debug!("Queued sync for {}", record_id);
                return Ok(());
            }
            Err(mpsc::error::TrySendError::Full(_)) => SyncError::QueueFull(record_id.to_string()),
            Err(mpsc::error::TrySendError::Closed(_)) => SyncError::QueueClosed,
        };

        warn!("Could not queue sync for {}: {}", record_id, err);
        self.statuses
            .write()
            .await
            .rejected(record_id, err.to_string());
        Err(err)
    }

    /// Last known status for `record_id`, if it is still tracked.
    pub async fn status(&self, record_id: &str) -> Option<SyncStatus> {
        self.statuses.read().await.get(record_id)
    }

    /// Number of records with a status.
    pub async fn tracked(&self) -> usize {
        self.statuses.read().await.len()
    }
}

async fn run_worker(
    worker: usize,
    job: Arc<SyncJob>,
    receiver: Arc<Mutex<mpsc::Receiver<String>>>,
    statuses: SharedStatuses,
) {
    loop {
        let next = receiver.lock().await.recv().await;
        let Some(record_id) = next else {
            debug!("Sync worker {} stopping", worker);
            break;
        };

        statuses.write().await.started(&record_id);

        let status = match job.sync_record(&record_id).await {
            Ok(outcome) => {
                debug!("Worker {} finished {}: {:?}", worker, record_id, outcome);
                SyncStatus::Completed {
                    at: Utc::now(),
                    outcome,
                }
            }
            Err(e) => {
                error!("Sync of {} failed: {}", record_id, e);
                SyncStatus::Failed {
                    at: Utc::now(),
                    error: e.to_string(),
                }
            }
        };

        statuses.write().await.finished(&record_id, status);
    }
}
