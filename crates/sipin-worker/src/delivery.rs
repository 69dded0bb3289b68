//! Message acknowledgement and intent dispatch

use crate::error::{Result, WorkerError};
use crate::publisher::EventPublisher;
use sipin_core::{Intent, RunReport};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DONE_DIR: &str = "done";
pub const REJECTED_DIR: &str = "rejected";

/// Transport seam: settle one message
pub trait Delivery: Send + Sync {
    type Token: Send + 'static;

    fn ack(&self, token: &Self::Token) -> Result<()>;
    fn nack(&self, token: &Self::Token, requeue: bool) -> Result<()>;
}

/// Inbox of JSON message files.
///
/// Acked messages move to `done/`, rejected ones to `rejected/`. A requeued
/// message stays in the inbox.
#[derive(Debug, Clone)]
pub struct FileDelivery {
    inbox: PathBuf,
}

impl FileDelivery {
    pub fn new(inbox: impl Into<PathBuf>) -> Self {
        Self {
            inbox: inbox.into(),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    /// Message files in the inbox, sorted by name
    pub fn pending(&self) -> Result<Vec<PathBuf>> {
        let mut messages = Vec::new();
        for entry in std::fs::read_dir(&self.inbox).map_err(|e| self.error(&self.inbox, e))? {
            let path = entry.map_err(|e| self.error(&self.inbox, e))?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                messages.push(path);
            }
        }
        messages.sort();
        Ok(messages)
    }

    fn settle(&self, message: &Path, dir_name: &str) -> Result<()> {
        let dir = self.inbox.join(dir_name);
        std::fs::create_dir_all(&dir).map_err(|e| self.error(&dir, e))?;
        let name = message.file_name().ok_or_else(|| WorkerError::Delivery {
            path: message.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no file name"),
        })?;
        std::fs::rename(message, dir.join(name)).map_err(|e| self.error(message, e))
    }

    fn error(&self, path: &Path, source: std::io::Error) -> WorkerError {
        WorkerError::Delivery {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl Delivery for FileDelivery {
    type Token = PathBuf;

    fn ack(&self, message: &PathBuf) -> Result<()> {
        self.settle(message, DONE_DIR)
    }

    fn nack(&self, message: &PathBuf, requeue: bool) -> Result<()> {
        if requeue {
            info!(message = %message.display(), "Message left in inbox for redelivery");
            return Ok(());
        }
        self.settle(message, REJECTED_DIR)
    }
}

/// Apply the intents of a finished run, in order.
///
/// A failed publish still settles the message: the run outcome is final.
pub fn apply_intents<D: Delivery>(
    report: &RunReport,
    token: &D::Token,
    delivery: &D,
    publisher: &dyn EventPublisher,
) -> Result<()> {
    for intent in &report.intents {
        match intent {
            Intent::Publish(event) => {
                if let Err(e) = publisher.publish(event) {
                    warn!(error = %e, subject = %event.attributes.subject, "Event not published");
                }
            },
            Intent::Ack => delivery.ack(token)?,
            Intent::Nack { requeue } => delivery.nack(token, *requeue)?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipin_core::{AssemblyFailure, FailureContext, SipError, Stage};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl EventPublisher for Recorder {
        fn publish(&self, event: &sipin_core::SipEvent) -> Result<()> {
            self.0.lock().unwrap().push(event.attributes.subject.clone());
            Ok(())
        }
    }

    fn message(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, "{}").unwrap();
        path
    }

    #[test]
    fn test_pending_lists_json_only() {
        let dir = TempDir::new().unwrap();
        message(&dir, "b.json");
        message(&dir, "a.json");
        message(&dir, "notes.txt");
        std::fs::create_dir(dir.path().join(DONE_DIR)).unwrap();

        let pending = FileDelivery::new(dir.path()).pending().unwrap();
        assert_eq!(
            pending,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[test]
    fn test_ack_and_nack_move_messages() {
        let dir = TempDir::new().unwrap();
        let delivery = FileDelivery::new(dir.path());
        let acked = message(&dir, "a.json");
        let rejected = message(&dir, "b.json");
        let requeued = message(&dir, "c.json");

        delivery.ack(&acked).unwrap();
        delivery.nack(&rejected, false).unwrap();
        delivery.nack(&requeued, true).unwrap();

        assert!(dir.path().join("done/a.json").is_file());
        assert!(dir.path().join("rejected/b.json").is_file());
        assert!(requeued.is_file());
        assert_eq!(delivery.pending().unwrap(), vec![requeued]);
    }

    #[test]
    fn test_apply_intents_publishes_then_rejects() {
        let dir = TempDir::new().unwrap();
        let delivery = FileDelivery::new(dir.path());
        let token = message(&dir, "a.json");
        let descriptor = sipin_core::WatchfolderDescriptor {
            cp_name: "CP".into(),
            flow_id: "OR-abc".into(),
            essence: PathBuf::from("/in/video.mxf"),
            sidecar: PathBuf::from("/in/video.xml"),
            collaterals: vec![],
        };
        let failure = AssemblyFailure {
            stage: Stage::PathsValidated,
            error: SipError::MissingMandatoryField { field: "md5".into() },
            context: FailureContext::default(),
        };
        let report = RunReport {
            intents: sipin_core::run::failure_intents(&descriptor, &failure, "host"),
            outcome: Err(failure),
        };
        let recorder = Recorder::default();

        apply_intents(&report, &token, &delivery, &recorder).unwrap();

        assert_eq!(*recorder.0.lock().unwrap(), vec!["video".to_string()]);
        assert!(dir.path().join("rejected/a.json").is_file());
    }
}
