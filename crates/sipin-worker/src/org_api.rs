//! Organization lookup over the organizations GraphQL API
//!
//! Uses the blocking client: lookups run inside assembly runs, which are
//! already on blocking threads. Construct and drop the client outside of
//! async contexts.

use crate::config::OrgApiSettings;
use crate::error::{Result, WorkerError};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use sipin_core::{OrganizationLookup, SipError};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<OrganizationsData>,
}

#[derive(Debug, Deserialize)]
struct OrganizationsData {
    #[serde(default)]
    organizations: Vec<Organization>,
}

#[derive(Debug, Deserialize)]
struct Organization {
    label: String,
}

/// GraphQL query for the label of one organization
pub fn label_query(flow_id: &str) -> String {
    format!(
        "{{ organizations(id:\"{}\") {{ label }} }}",
        flow_id.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// Lookup client. Keeps no cache; safe to share between runs.
#[derive(Debug, Clone)]
pub struct OrgApiClient {
    client: Client,
    url: String,
}

impl OrgApiClient {
    pub fn new(settings: &OrgApiSettings) -> Result<Self> {
        let mut builder = Client::builder();
        if settings.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(settings.timeout_secs));
        }
        let client = builder
            .build()
            .map_err(|e| WorkerError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: settings.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl OrganizationLookup for OrgApiClient {
    fn label_for(&self, flow_id: &str) -> sipin_core::Result<String> {
        debug!(flow_id, url = %self.url, "Looking up organization label");
        let unavailable = |e: reqwest::Error| {
            SipError::LookupUnavailable(format!("Could not reach '{}': {}", self.url, e))
        };

        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "query": label_query(flow_id) }))
            .send()
            .map_err(unavailable)?
            .error_for_status()
            .map_err(unavailable)?;
        let body: GraphqlResponse = response.json().map_err(unavailable)?;

        body.data
            .and_then(|data| data.organizations.into_iter().next())
            .map(|org| org.label)
            .ok_or_else(|| {
                SipError::LookupUnavailable(format!(
                    "Could not fetch the label for CP ID '{}'",
                    flow_id
                ))
            })
    }
}
