//! One SIP creation run and the side effects it asks for
//!
//! [`handle_run`] never publishes or acknowledges anything itself. It returns
//! [`Intent`]s in the order the transport should apply them.

use crate::error::{ErrorKind, SipError};
use crate::event::SipEvent;
use crate::pipeline::{AssembledPackage, AssemblyFailure, PackageAssembler, WatchfolderDescriptor};
use tracing::{info, warn};

/// A side effect for the transport to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Publish(Box<SipEvent>),
    Ack,
    Nack { requeue: bool },
}

/// Result of one run
#[derive(Debug)]
pub struct RunReport {
    pub outcome: Result<AssembledPackage, AssemblyFailure>,
    pub intents: Vec<Intent>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.outcome.as_ref().err().map(|f| f.error.kind())
    }

    /// The event to publish, if any
    pub fn event(&self) -> Option<&SipEvent> {
        self.intents.iter().find_map(|intent| match intent {
            Intent::Publish(event) => Some(event.as_ref()),
            _ => None,
        })
    }
}

/// Intents for a failed run.
///
/// Input and lookup failures produce no event: nothing was built to report
/// on. Lookup failures are redelivered.
pub fn failure_intents(
    descriptor: &WatchfolderDescriptor,
    failure: &AssemblyFailure,
    host: &str,
) -> Vec<Intent> {
    match &failure.error {
        SipError::InputMissing(_) => vec![Intent::Nack { requeue: false }],
        SipError::LookupUnavailable(_) => vec![Intent::Nack { requeue: true }],
        SipError::MalformedSidecar { .. }
        | SipError::MissingMandatoryField { .. }
        | SipError::ChecksumMismatch { .. }
        | SipError::Filesystem { .. }
        | SipError::InvalidDocument(_) => vec![
            Intent::Publish(Box::new(SipEvent::failure(descriptor, failure, host))),
            Intent::Nack { requeue: false },
        ],
    }
}

/// Run the assembler for one delivery
pub fn handle_run(
    descriptor: &WatchfolderDescriptor,
    assembler: &PackageAssembler,
    host: &str,
) -> RunReport {
    match assembler.assemble(descriptor) {
        Ok(package) => {
            info!(
                essence = %descriptor.essence.display(),
                path = %package.archive_path.display(),
                "SIP created"
            );
            let event = SipEvent::success(descriptor, &package, host);
            RunReport {
                outcome: Ok(package),
                intents: vec![Intent::Publish(Box::new(event)), Intent::Ack],
            }
        },
        Err(failure) => {
            if let Some(dir) = &failure.context.working_dir {
                warn!(
                    essence = %descriptor.essence.display(),
                    path = %dir.display(),
                    "Working directory left behind"
                );
            }
            let intents = failure_intents(descriptor, &failure, host);
            RunReport {
                outcome: Err(failure),
                intents,
            }
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::event::EventOutcome;
    use crate::pipeline::{FailureContext, Stage};
    use std::path::PathBuf;

    fn descriptor() -> WatchfolderDescriptor {
        WatchfolderDescriptor {
            cp_name: "CP".into(),
            flow_id: "OR-abc".into(),
            essence: PathBuf::from("/in/video.mxf"),
            sidecar: PathBuf::from("/in/video.xml"),
            collaterals: vec![],
        }
    }

    fn failure(error: SipError) -> AssemblyFailure {
        AssemblyFailure {
            stage: Stage::Received,
            error,
            context: FailureContext::default(),
        }
    }

    #[test]
    fn test_input_missing_is_rejected_silently() {
        let intents = failure_intents(
            &descriptor(),
            &failure(SipError::InputMissing(PathBuf::from("/in/video.mxf"))),
            "host",
        );
        assert_eq!(intents, vec![Intent::Nack { requeue: false }]);
    }

    #[test]
    fn test_lookup_unavailable_is_requeued() {
        let intents = failure_intents(
            &descriptor(),
            &failure(SipError::LookupUnavailable("timeout".into())),
            "host",
        );
        assert_eq!(intents, vec![Intent::Nack { requeue: true }]);
    }

    #[test]
    fn test_fatal_failures_publish_then_reject() {
        let errors = vec![
            SipError::MalformedSidecar {
                path: PathBuf::from("/in/video.xml"),
                message: "bad".into(),
            },
            SipError::MissingMandatoryField { field: "md5".into() },
            SipError::ChecksumMismatch {
                path: PathBuf::from("/in/video.bag.zip"),
                expected: "a".into(),
                actual: "b".into(),
            },
            SipError::filesystem("/in", std::io::Error::other("disk full")),
            SipError::InvalidDocument("broken".into()),
        ];
        for error in errors {
            let intents = failure_intents(&descriptor(), &failure(error), "host");
            assert_eq!(intents.len(), 2);
            match &intents[0] {
                Intent::Publish(event) => assert_eq!(event.outcome(), EventOutcome::Fail),
                other => panic!("expected publish, got {:?}", other),
            }
            assert_eq!(intents[1], Intent::Nack { requeue: false });
        }
    }
}
