//! Event publishing

use crate::error::{Result, WorkerError};
use crate::config::STDOUT_OUTPUT;
use sipin_core::SipEvent;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Event bus seam
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &SipEvent) -> Result<()>;
}

/// Writes each event as one JSON line
pub struct JsonLinesPublisher {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesPublisher {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Append to `path`, creating it when needed
    pub fn append_to(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// `-` for stdout, anything else is a file path
    pub fn from_output(output: &str) -> Result<Self> {
        if output == STDOUT_OUTPUT {
            Ok(Self::stdout())
        } else {
            Self::append_to(Path::new(output))
        }
    }
}

impl EventPublisher for JsonLinesPublisher {
    fn publish(&self, event: &SipEvent) -> Result<()> {
        let mut line = serde_json::to_vec(event)?;
        line.push(b'\n');
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| WorkerError::Publish("event writer poisoned".to_string()))?;
        writer.write_all(&line)?;
        writer.flush()?;
        tracing::info!(
            subject = %event.attributes.subject,
            outcome = event.outcome().as_str(),
            "Event published"
        );
        Ok(())
    }
}
