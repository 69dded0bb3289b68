//! `create` and `drain` command implementations

use crate::delivery::{apply_intents, Delivery, FileDelivery};
use crate::error::{Result, WorkerError};
use crate::message::decode;
use crate::pool::{Completed, WorkerPool};
use crate::publisher::EventPublisher;
use sipin_core::PackageAssembler;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Totals of a processed batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub failed: usize,
    pub requeued: usize,
    pub invalid: usize,
    /// Messages that could not be read, e.g. taken by another drainer
    pub skipped: usize,
}

impl Summary {
    fn record(&mut self, completed: &Completed<PathBuf>) {
        if completed.report.is_success() {
            self.created += 1;
        } else if completed
            .report
            .outcome
            .as_ref()
            .is_err_and(|f| f.error.is_retryable())
        {
            self.requeued += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Read and decode a message file; undecodable messages are rejected
fn read_message(
    path: &Path,
    delivery: &FileDelivery,
) -> Result<Option<sipin_core::WatchfolderDescriptor>> {
    let body = std::fs::read(path)?;
    match decode(&body) {
        Ok(descriptor) => Ok(Some(descriptor)),
        Err(e @ WorkerError::InvalidMessage(_)) => {
            error!(message = %path.display(), error = %e, "Rejecting message");
            delivery.nack(&path.to_path_buf(), false)?;
            Ok(None)
        },
        Err(e) => Err(e),
    }
}

fn settle(
    completed: &Completed<PathBuf>,
    delivery: &FileDelivery,
    publisher: &dyn EventPublisher,
    summary: &mut Summary,
) {
    summary.record(completed);
    if let Err(e) = apply_intents(&completed.report, &completed.token, delivery, publisher) {
        error!(message = %completed.token.display(), error = %e, "Failed to settle message");
    }
}

/// Process a single message file
pub async fn create(
    message: &Path,
    assembler: Arc<PackageAssembler>,
    host: &str,
    publisher: &dyn EventPublisher,
) -> Result<Summary> {
    let inbox = message.parent().unwrap_or_else(|| Path::new("."));
    Ok(process(
        vec![message.to_path_buf()],
        &FileDelivery::new(inbox),
        assembler,
        host,
        1,
        publisher,
    )
    .await)
}

/// Process every message in an inbox through the pool
pub async fn drain(
    inbox: &Path,
    assembler: Arc<PackageAssembler>,
    host: &str,
    max_in_flight: usize,
    publisher: &dyn EventPublisher,
) -> Result<Summary> {
    let delivery = FileDelivery::new(inbox);
    let messages = delivery.pending()?;
    info!(inbox = %inbox.display(), count = messages.len(), "Draining inbox");
    Ok(process(messages, &delivery, assembler, host, max_in_flight, publisher).await)
}

/// Run the given message files through the pool.
///
/// A message that cannot be read is skipped; every submitted run is joined
/// and settled before this returns.
pub async fn process(
    messages: Vec<PathBuf>,
    delivery: &FileDelivery,
    assembler: Arc<PackageAssembler>,
    host: &str,
    max_in_flight: usize,
    publisher: &dyn EventPublisher,
) -> Summary {
    let mut pool = WorkerPool::new(assembler, host, max_in_flight);
    let mut summary = Summary::default();

    for message in messages {
        let descriptor = match read_message(&message, delivery) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => {
                summary.invalid += 1;
                continue;
            },
            Err(e) => {
                warn!(message = %message.display(), error = %e, "Skipping unreadable message");
                summary.skipped += 1;
                continue;
            },
        };
        if let Err(e) = pool.submit(message.clone(), descriptor).await {
            error!(message = %message.display(), error = %e, "Pool refused message, stopping intake");
            summary.skipped += 1;
            break;
        }
        while let Some(completed) = pool.try_next() {
            settle(&completed, delivery, publisher, &mut summary);
        }
    }

    for completed in pool.drain().await {
        settle(&completed, delivery, publisher, &mut summary);
    }
    info!(
        created = summary.created,
        failed = summary.failed,
        requeued = summary.requeued,
        invalid = summary.invalid,
        skipped = summary.skipped,
        "Inbox processed"
    );
    summary
}
