//! Schemas for documents fetched from peer services.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::config::validation::check_route;
use crate::config::RouteMapping;

/// A document shape the resolver can fetch.
///
/// `Default` is the empty document returned when fetching is soft-failed.
pub trait RemoteDocument: DeserializeOwned + Default + Send {
    /// Semantic checks beyond deserialization. A failure counts as a
    /// malformed response from that instance.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Full remote configuration: tags plus proxy routes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteConfigDocument {
    pub tags: Vec<String>,
    pub proxies: BTreeMap<String, RouteMapping>,
}

impl RemoteDocument for RemoteConfigDocument {
    fn validate(&self) -> Result<(), String> {
        for (name, mapping) in &self.proxies {
            check_route(mapping).map_err(|reason| format!("proxy '{}': {}", name, reason))?;
        }
        Ok(())
    }
}

/// Tags-only remote document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteTagsDocument {
    pub tags: Vec<String>,
}

impl RemoteDocument for RemoteTagsDocument {}

/// Deserialize and validate a fetched body.
pub fn parse_document<T: RemoteDocument>(body: &[u8]) -> Result<T, String> {
    let doc: T = serde_yaml::from_slice(body).map_err(|e| e.to_string())?;
    doc.validate()?;
    Ok(doc)
}
