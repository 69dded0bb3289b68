//! Watchfolder message decoding
//!
//! ```json
//! {
//!   "cp_name": "Testomroep",
//!   "flow_id": "OR-abc123",
//!   "sip_package": [
//!     { "file_name": "video.mxf", "file_path": "/watch", "file_type": "essence" },
//!     { "file_name": "video.xml", "file_path": "/watch", "file_type": "sidecar" }
//!   ]
//! }
//! ```

use crate::error::{Result, WorkerError};
use serde::Deserialize;
use sipin_core::WatchfolderDescriptor;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Essence,
    Sidecar,
    Collateral,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SipItem {
    pub file_name: String,
    pub file_path: String,
    pub file_type: FileType,
}

impl SipItem {
    pub fn path(&self) -> PathBuf {
        Path::new(&self.file_path).join(&self.file_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct WatchfolderMessage {
    cp_name: String,
    flow_id: String,
    sip_package: Vec<SipItem>,
}

/// Decode a message body into a delivery descriptor
pub fn decode(body: &[u8]) -> Result<WatchfolderDescriptor> {
    let message: WatchfolderMessage = serde_json::from_slice(body)
        .map_err(|e| WorkerError::InvalidMessage(format!("Message is not valid: '{}'", e)))?;

    let mut essence = None;
    let mut sidecar = None;
    let mut collaterals = Vec::new();
    for item in &message.sip_package {
        let slot = match item.file_type {
            FileType::Collateral => {
                collaterals.push(item.path());
                continue;
            },
            FileType::Essence => &mut essence,
            FileType::Sidecar => &mut sidecar,
        };
        if slot.replace(item.path()).is_some() {
            return Err(WorkerError::InvalidMessage(format!(
                "More than one {:?} file in sip_package",
                item.file_type
            )));
        }
    }

    let essence = essence.ok_or_else(|| missing("essence"))?;
    let sidecar = sidecar.ok_or_else(|| missing("sidecar"))?;
    Ok(WatchfolderDescriptor {
        cp_name: message.cp_name,
        flow_id: message.flow_id,
        essence,
        sidecar,
        collaterals,
    })
}

fn missing(file_type: &str) -> WorkerError {
    WorkerError::InvalidMessage(format!("No {} file in sip_package", file_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(name: &str, file_type: &str) -> serde_json::Value {
        json!({ "file_name": name, "file_path": "/watch/in", "file_type": file_type })
    }

    fn body(items: Vec<serde_json::Value>) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "cp_name": "Testomroep",
            "flow_id": "OR-abc123",
            "sip_package": items,
        }))
        .unwrap()
    }

    #[test]
    fn test_decode_full_message() {
        let descriptor = decode(&body(vec![
            item("video.srt", "collateral"),
            item("video.mxf", "essence"),
            item("video.xml", "sidecar"),
            item("video.vtt", "collateral"),
        ]))
        .unwrap();

        assert_eq!(descriptor.cp_name, "Testomroep");
        assert_eq!(descriptor.flow_id, "OR-abc123");
        assert_eq!(descriptor.essence, PathBuf::from("/watch/in/video.mxf"));
        assert_eq!(descriptor.sidecar, PathBuf::from("/watch/in/video.xml"));
        assert_eq!(
            descriptor.collaterals,
            vec![
                PathBuf::from("/watch/in/video.srt"),
                PathBuf::from("/watch/in/video.vtt")
            ]
        );
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(matches!(
            decode(b"{not json").unwrap_err(),
            WorkerError::InvalidMessage(_)
        ));
    }

    #[test]
    fn test_decode_rejects_missing_key() {
        let body = serde_json::to_vec(&json!({ "cp_name": "x", "sip_package": [] })).unwrap();
        let err = decode(&body).unwrap_err();
        assert!(err.to_string().contains("flow_id"));
    }

    #[test]
    fn test_decode_rejects_missing_sidecar() {
        let err = decode(&body(vec![item("video.mxf", "essence")])).unwrap_err();
        assert!(err.to_string().contains("sidecar"));
    }

    #[test]
    fn test_decode_rejects_duplicate_essence() {
        let err = decode(&body(vec![
            item("a.mxf", "essence"),
            item("b.mxf", "essence"),
            item("a.xml", "sidecar"),
        ]))
        .unwrap_err();
        assert!(matches!(err, WorkerError::InvalidMessage(_)));
    }

    #[test]
    fn test_decode_rejects_unknown_file_type() {
        assert!(decode(&body(vec![item("a.mxf", "thumbnail")])).is_err());
    }
}
