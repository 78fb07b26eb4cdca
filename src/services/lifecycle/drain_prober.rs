#[cfg(test)]
mod tests;

use crate::services::base::cluster_client::{ClusterClient, DynamicClusterClient};
use crate::services::base::cluster_error::ClusterError;
use crate::services::lifecycle::discovery_cache::DiscoveryCache;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Kinds that never count as namespace content.
pub const IGNORED_RESOURCES: &[&str] = &["bindings"];

/// Pods still present in a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PodCensus {
    pub remaining: usize,
    /// Pods nobody has requested deletion for yet
    pub missing_deletion_timestamp: usize,
}

/// What was left in a namespace after its deletion deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainResult {
    pub content_remains: bool,
    pub pods: PodCensus,
}

/// Checks kind by kind whether a namespace still holds objects.
#[derive(Clone)]
pub struct DrainProber {
    dynamic_client: Option<Arc<dyn DynamicClusterClient>>,
    discovery: DiscoveryCache,
}

impl DrainProber {
    pub fn new(discovery: DiscoveryCache, dynamic_client: Option<Arc<dyn DynamicClusterClient>>) -> Self {
        DrainProber {
            dynamic_client,
            discovery,
        }
    }

    /// Returns `false` without asking the server when no dynamic client is configured.
    pub async fn has_remaining_content(&self, namespace: &str, timeout: Duration) -> Result<bool, ClusterError> {
        let remaining = self.remaining_content(namespace, timeout).await?;
        Ok(!remaining.is_empty())
    }

    /// Object names per kind that are still present. Every kind is inspected so that all
    /// stragglers end up in the log, not just the first one found.
    pub async fn remaining_content(
        &self,
        namespace: &str,
        timeout: Duration,
    ) -> Result<BTreeMap<String, Vec<String>>, ClusterError> {
        let Some(dynamic_client) = &self.dynamic_client else {
            debug!("No dynamic client configured, skipping content check of {}", namespace);
            return Ok(BTreeMap::new());
        };

        let resources = self.discovery.preferred_namespaced_resources(timeout).await?;
        let mut remaining = BTreeMap::new();
        for kind in resources {
            if IGNORED_RESOURCES.contains(&kind.resource.as_str()) {
                debug!("Namespace {}: skipping ignored resource {}", namespace, kind);
                continue;
            }
            match dynamic_client.list_objects(&kind, namespace).await {
                Ok(names) if names.is_empty() => {}
                Ok(names) => {
                    info!("Namespace {}: {} {} remaining: {:?}", namespace, names.len(), kind, names);
                    remaining.insert(kind.to_string(), names);
                }
                Err(e) if e.is_skippable_for_listing() => {
                    warn!("Namespace {}: unable to list {}, skipping: {}", namespace, kind, e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(remaining)
    }
}

/// Counts pods in `namespace` and how many of them lack a deletion timestamp.
pub async fn count_remaining_pods(client: &dyn ClusterClient, namespace: &str) -> Result<PodCensus, ClusterError> {
    let pods = client.list_pods(namespace).await?;
    let missing_deletion_timestamp = pods
        .iter()
        .filter(|pod| pod.metadata.deletion_timestamp.is_none())
        .count();
    let census = PodCensus {
        remaining: pods.len(),
        missing_deletion_timestamp,
    };
    info!(
        "Namespace {}: {} pods remaining, {} missing deletion timestamp",
        namespace, census.remaining, census.missing_deletion_timestamp
    );
    Ok(census)
}
