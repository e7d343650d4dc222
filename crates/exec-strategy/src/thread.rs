use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::{debug, instrument, warn};
use uiact_core_types::{ActionRequest, ExecMode};

use crate::errors::ExecError;
use crate::model::{DriverReport, ExecCtx};
use crate::ports::{BlockingDriver, DriverFault};
use crate::ExecutionStrategy;

struct Job {
    request: ActionRequest,
    reply: oneshot::Sender<Result<DriverReport, DriverFault>>,
}

struct Worker {
    tx: Sender<Job>,
    generation: u64,
}

/// Runs the blocking driver call on a dedicated worker thread that persists
/// across calls (driver affinity lives with the thread). On deadline expiry
/// the caller's await returns and the worker is abandoned: the thread is not
/// stopped, so whatever it holds must be treated as possibly still busy. The
/// next call gets a fresh worker.
pub struct ThreadIsolatedStrategy {
    driver: Arc<dyn BlockingDriver>,
    slot: Mutex<Option<Worker>>,
    spawned: AtomicU64,
}

impl ThreadIsolatedStrategy {
    pub fn new(driver: Arc<dyn BlockingDriver>) -> Self {
        Self {
            driver,
            slot: Mutex::new(None),
            spawned: AtomicU64::new(0),
        }
    }

    /// How many workers have been spawned so far. A bump between calls means
    /// the previous worker was abandoned.
    pub fn workers_spawned(&self) -> u64 {
        self.spawned.load(Ordering::SeqCst)
    }

    fn ensure_worker(&self) -> Result<(Sender<Job>, u64), ExecError> {
        let mut slot = self.slot.lock();
        if let Some(worker) = slot.as_ref() {
            return Ok((worker.tx.clone(), worker.generation));
        }
        let generation = self.spawned.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::channel::<Job>();
        let driver = Arc::clone(&self.driver);
        thread::Builder::new()
            .name(format!("driver-worker-{generation}"))
            .spawn(move || {
                while let Ok(job) = rx.recv() {
                    let result = driver.perform(&job.request);
                    if job.reply.send(result).is_err() {
                        // caller stopped waiting; drain remaining jobs anyway
                        debug!("reply receiver dropped before worker finished");
                    }
                }
            })
            .map_err(ExecError::Spawn)?;
        *slot = Some(Worker {
            tx: tx.clone(),
            generation,
        });
        Ok((tx, generation))
    }

    fn abandon(&self, generation: u64) {
        let mut slot = self.slot.lock();
        if slot
            .as_ref()
            .map(|worker| worker.generation == generation)
            .unwrap_or(false)
        {
            *slot = None;
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ThreadIsolatedStrategy {
    fn mode(&self) -> ExecMode {
        ExecMode::Thread
    }

    #[instrument(skip_all, fields(action = %ctx.action_id.0, driver = self.driver.name()))]
    async fn execute(
        &self,
        ctx: &ExecCtx,
        request: &ActionRequest,
    ) -> Result<DriverReport, ExecError> {
        let (tx, generation) = self.ensure_worker()?;
        let (reply_tx, reply_rx) = oneshot::channel();
        tx.send(Job {
            request: request.clone(),
            reply: reply_tx,
        })
        .map_err(|_| {
            self.abandon(generation);
            ExecError::WorkerGone
        })?;

        match tokio::time::timeout(ctx.timeout, reply_rx).await {
            Ok(Ok(result)) => Ok(result?),
            Ok(Err(_)) => {
                // worker panicked or exited without replying
                self.abandon(generation);
                Err(ExecError::WorkerGone)
            }
            Err(_) => {
                warn!(generation, "deadline expired; abandoning worker thread");
                self.abandon(generation);
                Err(ExecError::Timeout { waited: ctx.timeout })
            }
        }
    }
}
