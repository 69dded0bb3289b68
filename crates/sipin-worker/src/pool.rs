//! Bounded pool of blocking SIP creation runs
//!
//! Runs execute on tokio's blocking threads so the caller's task stays
//! responsive. At most `max_in_flight` runs are active; `submit` waits for a
//! free slot. `drain` closes the pool and joins every run still in flight.

use crate::error::{Result, WorkerError};
use sipin_core::{handle_run, PackageAssembler, RunReport, WatchfolderDescriptor};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error};

/// A finished run with the token of the message it came from
#[derive(Debug)]
pub struct Completed<T> {
    pub token: T,
    pub report: RunReport,
}

pub struct WorkerPool<T> {
    assembler: Arc<PackageAssembler>,
    host: Arc<str>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<Completed<T>>,
    accepting: bool,
}

impl<T: Send + 'static> WorkerPool<T> {
    pub fn new(assembler: Arc<PackageAssembler>, host: impl Into<Arc<str>>, max_in_flight: usize) -> Self {
        Self {
            assembler,
            host: host.into(),
            permits: Arc::new(Semaphore::new(max_in_flight.max(1))),
            tasks: JoinSet::new(),
            accepting: true,
        }
    }

    /// Start a run, waiting for a free slot first
    pub async fn submit(&mut self, token: T, descriptor: WatchfolderDescriptor) -> Result<()> {
        if !self.accepting {
            return Err(WorkerError::PoolClosed);
        }
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| WorkerError::PoolClosed)?;

        let assembler = Arc::clone(&self.assembler);
        let host = Arc::clone(&self.host);
        debug!(essence = %descriptor.essence.display(), in_flight = self.tasks.len() + 1, "Run submitted");
        self.tasks.spawn_blocking(move || {
            let _permit = permit;
            let report = handle_run(&descriptor, &assembler, &host);
            Completed { token, report }
        });
        Ok(())
    }

    /// A finished run, if one is ready
    pub fn try_next(&mut self) -> Option<Completed<T>> {
        while let Some(joined) = self.tasks.try_join_next() {
            match joined {
                Ok(completed) => return Some(completed),
                Err(e) => error!(error = %e, "SIP creation run aborted"),
            }
        }
        None
    }

    /// Wait for the next finished run
    pub async fn next(&mut self) -> Option<Completed<T>> {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok(completed) => return Some(completed),
                Err(e) => error!(error = %e, "SIP creation run aborted"),
            }
        }
        None
    }

    /// Stop accepting runs
    pub fn close(&mut self) {
        self.accepting = false;
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Close the pool and join every run still in flight
    pub async fn drain(&mut self) -> Vec<Completed<T>> {
        self.close();
        let mut completed = Vec::with_capacity(self.tasks.len());
        while let Some(done) = self.next().await {
            completed.push(done);
        }
        completed
    }
}
