//! Outcome event emitted once per run
//!
//! A CloudEvents-style record: routing attributes plus a data payload
//! describing the essence and, when one was produced, the package.

use crate::error::SipError;
use crate::layout::file_name_of;
use crate::pipeline::{AssembledPackage, AssemblyFailure, WatchfolderDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const EVENT_TYPE: &str = "be.meemoo.sipin.sip.create";
pub const EVENT_SOURCE: &str = "sipin-sip-creator";

/// Event message when the manifest disagrees with the sidecar
pub const CHECKSUM_MISMATCH_MESSAGE: &str = "Supplied MD5 differs from the calculated MD5.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventOutcome {
    Success,
    Fail,
}

impl EventOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            EventOutcome::Success => "success",
            EventOutcome::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttributes {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: String,
    /// Essence file stem
    pub subject: String,
    pub outcome: EventOutcome,
    pub time: DateTime<Utc>,
    pub id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub host: String,
    pub essence_filename: String,
    /// The flow identifier
    pub cp_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub essence_filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash_essence_sidecar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bag_filesize: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_hash_essence_manifest: Option<String>,
    pub outcome: EventOutcome,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SipEvent {
    pub attributes: EventAttributes,
    pub data: EventData,
}

impl SipEvent {
    fn new(descriptor: &WatchfolderDescriptor, host: &str, outcome: EventOutcome, message: String) -> Self {
        let essence = &descriptor.essence;
        let subject = essence
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let essence_filename = file_name_of(essence)
            .unwrap_or_else(|_| essence.to_string_lossy().into_owned());

        Self {
            attributes: EventAttributes {
                event_type: EVENT_TYPE.to_string(),
                source: EVENT_SOURCE.to_string(),
                subject,
                outcome,
                time: Utc::now(),
                id: Uuid::new_v4(),
            },
            data: EventData {
                host: host.to_string(),
                essence_filename,
                cp_id: descriptor.flow_id.clone(),
                essence_filesize: None,
                batch_id: None,
                local_id: None,
                md5_hash_essence_sidecar: None,
                path: None,
                bag_filesize: None,
                md5_hash_essence_manifest: None,
                outcome,
                message,
            },
        }
    }

    /// Event for a published package
    pub fn success(descriptor: &WatchfolderDescriptor, package: &AssembledPackage, host: &str) -> Self {
        let path = package.archive_path.display().to_string();
        let mut event = Self::new(
            descriptor,
            host,
            EventOutcome::Success,
            format!("SIP created: '{}'", path),
        );
        let data = &mut event.data;
        data.essence_filesize = Some(package.essence_size);
        data.batch_id = package.sidecar.batch_id.clone();
        data.local_id = package.sidecar.local_id.clone();
        data.md5_hash_essence_sidecar = Some(package.sidecar.md5.clone());
        data.path = Some(path);
        data.bag_filesize = Some(package.archive_size);
        data.md5_hash_essence_manifest = Some(package.essence_manifest_md5.clone());
        event
    }

    /// Event for a failed run, carrying whatever the run computed
    pub fn failure(descriptor: &WatchfolderDescriptor, failure: &AssemblyFailure, host: &str) -> Self {
        let message = match &failure.error {
            SipError::ChecksumMismatch { .. } => CHECKSUM_MISMATCH_MESSAGE.to_string(),
            other => other.to_string(),
        };
        let mut event = Self::new(descriptor, host, EventOutcome::Fail, message);

        let context = &failure.context;
        let data = &mut event.data;
        data.essence_filesize = context.essence_size;
        if let Some(sidecar) = &context.sidecar {
            data.batch_id = sidecar.batch_id.clone();
            data.local_id = sidecar.local_id.clone();
            data.md5_hash_essence_sidecar = Some(sidecar.md5.clone());
        }
        data.path = context
            .archive_path
            .as_ref()
            .map(|p| p.display().to_string());
        data.bag_filesize = context.archive_size;
        data.md5_hash_essence_manifest = context.manifest_md5.clone();
        event
    }

    pub fn outcome(&self) -> EventOutcome {
        self.attributes.outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::pipeline::{FailureContext, Stage};
    use crate::sidecar::Sidecar;
    use std::path::{Path, PathBuf};

    fn descriptor() -> WatchfolderDescriptor {
        WatchfolderDescriptor {
            cp_name: "CP".into(),
            flow_id: "OR-abc".into(),
            essence: PathBuf::from("/in/video.mxf"),
            sidecar: PathBuf::from("/in/video.xml"),
            collaterals: vec![],
        }
    }

    #[test]
    fn test_failure_event_without_sidecar() {
        let failure = AssemblyFailure {
            stage: Stage::PathsValidated,
            error: SipError::MissingMandatoryField { field: "md5".into() },
            context: FailureContext {
                essence_size: Some(42),
                ..Default::default()
            },
        };
        let event = SipEvent::failure(&descriptor(), &failure, "worker-1");

        assert_eq!(event.outcome(), EventOutcome::Fail);
        assert_eq!(event.attributes.subject, "video");
        assert_eq!(event.attributes.event_type, EVENT_TYPE);
        assert_eq!(
            event.data.message,
            "Sidecar not valid. Missing mandatory key: 'md5'"
        );

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["attributes"]["type"], EVENT_TYPE);
        assert_eq!(json["attributes"]["outcome"], "fail");
        assert_eq!(json["data"]["essence_filename"], "video.mxf");
        assert_eq!(json["data"]["cp_id"], "OR-abc");
        assert_eq!(json["data"]["essence_filesize"], 42);
        assert!(json["data"].get("md5_hash_essence_manifest").is_none());
        assert!(json["data"].get("path").is_none());
    }

    #[test]
    fn test_mismatch_event_carries_both_digests() {
        let sidecar = Sidecar::from_xml(
            "<VIAA><md5>AAAA</md5><batch_id>B1</batch_id></VIAA>",
            Path::new("video.xml"),
        )
        .unwrap();
        let failure = AssemblyFailure {
            stage: Stage::Archived,
            error: SipError::ChecksumMismatch {
                path: PathBuf::from("/in/video.bag.zip"),
                expected: "aaaa".into(),
                actual: "bbbb".into(),
            },
            context: FailureContext {
                sidecar: Some(sidecar),
                archive_path: Some(PathBuf::from("/in/video.bag.zip")),
                archive_size: Some(1024),
                manifest_md5: Some("bbbb".into()),
                essence_size: Some(11),
                ..Default::default()
            },
        };
        let event = SipEvent::failure(&descriptor(), &failure, "worker-1");

        assert_eq!(event.data.message, CHECKSUM_MISMATCH_MESSAGE);
        assert_eq!(event.data.md5_hash_essence_sidecar.as_deref(), Some("AAAA"));
        assert_eq!(event.data.md5_hash_essence_manifest.as_deref(), Some("bbbb"));
        assert_eq!(event.data.batch_id.as_deref(), Some("B1"));
        assert_eq!(event.data.path.as_deref(), Some("/in/video.bag.zip"));
        assert_eq!(event.data.bag_filesize, Some(1024));
    }
}
