//! Discovery-backed remote document resolution.
//!
//! # Responsibilities
//! - Look up the instances of the origin service
//! - Fetch the resource from each instance in turn until one parses
//! - Apply the origin's fatal policy when nothing usable was found
//!
//! # Design Decisions
//! - Instances are tried in the order discovery returned them
//! - Per-instance failures are always soft; only the overall outcome is
//!   governed by `OriginPolicy::fatal`
//! - Bodies are read to end of stream regardless of Content-Length
//! - Sequential attempts, client default timeouts, no backoff

use std::sync::Arc;
use thiserror::Error;

use crate::config::OriginPolicy;
use crate::discovery::{Discovery, DiscoveryError, ServiceInstance};
use crate::remote::document::{parse_document, RemoteDocument};

/// Fatal resolution outcomes. Only produced when the origin is fatal.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("unable to look up service [{service}]: {source}")]
    Lookup {
        service: String,
        #[source]
        source: DiscoveryError,
    },

    #[error("no service [{service}] available")]
    NoInstances { service: String },

    #[error("no usable document from [{service}] after {attempts} instance(s)")]
    Exhausted { service: String, attempts: usize },
}

/// Why a single instance was skipped.
#[derive(Debug, Error)]
enum AttemptError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Fetches documents from the instances of a discovered service.
#[derive(Clone)]
pub struct RemoteConfigResolver {
    discovery: Arc<dyn Discovery>,
    client: reqwest::Client,
}

impl RemoteConfigResolver {
    pub fn new(discovery: Arc<dyn Discovery>) -> Self {
        Self {
            discovery,
            client: reqwest::Client::new(),
        }
    }

    /// Resolve a document of type `T` according to `origin`.
    ///
    /// Returns `T::default()` when the origin is disabled, or when nothing
    /// could be fetched and the origin is not fatal.
    pub async fn resolve<T: RemoteDocument>(
        &self,
        origin: &OriginPolicy,
    ) -> Result<T, ResolutionError> {
        if !origin.enabled {
            tracing::debug!(service = %origin.service_name, "Origin disabled, skipping");
            return Ok(T::default());
        }

        tracing::info!(
            service = %origin.service_name,
            path = %origin.path,
            "Resolving remote document"
        );

        let instances = match self.discovery.lookup(&origin.service_name).await {
            Ok(instances) if instances.is_empty() => {
                return Self::give_up(
                    origin,
                    ResolutionError::NoInstances {
                        service: origin.service_name.clone(),
                    },
                );
            }
            Ok(instances) => instances,
            Err(source) => {
                return Self::give_up(
                    origin,
                    ResolutionError::Lookup {
                        service: origin.service_name.clone(),
                        source,
                    },
                );
            }
        };

        let attempts = instances.len();
        for instance in &instances {
            let url = document_url(instance, &origin.path);
            tracing::debug!(url = %url, "Fetching remote document");

            match self.fetch::<T>(&url).await {
                Ok(doc) => {
                    tracing::info!(url = %url, "Remote document loaded");
                    return Ok(doc);
                }
                Err(e) => {
                    tracing::warn!(
                        instance = %instance.authority(),
                        error = %e,
                        "Instance failed, trying next"
                    );
                }
            }
        }

        Self::give_up(
            origin,
            ResolutionError::Exhausted {
                service: origin.service_name.clone(),
                attempts,
            },
        )
    }

    async fn fetch<T: RemoteDocument>(&self, url: &str) -> Result<T, AttemptError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.bytes().await?;
        parse_document(&body).map_err(AttemptError::Malformed)
    }

    fn give_up<T: RemoteDocument>(
        origin: &OriginPolicy,
        error: ResolutionError,
    ) -> Result<T, ResolutionError> {
        if origin.fatal {
            Err(error)
        } else {
            tracing::warn!(error = %error, "Continuing with an empty document");
            Ok(T::default())
        }
    }
}

/// `http://{address}:{port}/{path}` without doubling the leading slash.
pub fn document_url(instance: &ServiceInstance, path: &str) -> String {
    format!(
        "http://{}/{}",
        instance.authority(),
        path.trim_start_matches('/')
    )
}
