pub mod deletion_error;

#[cfg(test)]
mod tests;

use crate::services::base::cluster_client::ClusterClient;
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::polling::{Attempt, PollError, poll_until};
use crate::services::lifecycle::drain_prober::{DrainProber, DrainResult, PodCensus, count_remaining_pods};
use crate::services::lifecycle::namespace_destroyer::deletion_error::NamespaceDeletionError;
use crate::services::lifecycle::{DISCOVERY_TIMEOUT, POLL_INTERVAL};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Deletes namespaces and explains why a deletion did not finish in time.
#[derive(Clone)]
pub struct NamespaceDestroyer {
    client: Arc<dyn ClusterClient>,
    prober: DrainProber,
    interval: Duration,
}

impl NamespaceDestroyer {
    pub fn new(client: Arc<dyn ClusterClient>, prober: DrainProber) -> Self {
        NamespaceDestroyer {
            client,
            prober,
            interval: POLL_INTERVAL,
        }
    }

    /// Requests deletion of `name` and waits up to `timeout` for the namespace object to disappear.
    ///
    /// A namespace that is already gone counts as deleted.
    pub async fn delete_namespace(&self, name: &str, timeout: Duration) -> Result<(), NamespaceDeletionError> {
        info!("Deleting namespace {}", name);
        if let Err(e) = self.client.delete_namespace(name).await {
            if e.is_not_found() {
                info!("Namespace {} was already deleted", name);
                return Ok(());
            }
            return Err(NamespaceDeletionError::Delete {
                namespace: name.to_string(),
                source: e,
            });
        }

        let removed: Result<(), PollError<ClusterError>> = poll_until(self.interval, timeout, || async move {
            match self.client.get_namespace(name).await {
                Ok(_) => Attempt::NotYet,
                Err(e) if e.is_not_found() => Attempt::Done(()),
                Err(e) => {
                    warn!("Error while waiting for namespace {} to be terminated: {}", name, e);
                    Attempt::NotYet
                }
            }
        })
        .await;

        let diagnosis = self.diagnose(name).await;
        match removed {
            Ok(()) => {
                if let Err(e) = diagnosis {
                    debug!("Content check of deleted namespace {} failed: {}", name, e);
                }
                info!("Namespace {} deleted", name);
                Ok(())
            }
            Err(_) => {
                let error = classify(name, timeout, diagnosis);
                warn!("{} (suspected: {})", error, error.suspected_component());
                Err(error)
            }
        }
    }

    async fn diagnose(&self, name: &str) -> Result<DrainResult, ClusterError> {
        let content_remains = self.prober.has_remaining_content(name, DISCOVERY_TIMEOUT).await?;
        let pods = if content_remains {
            count_remaining_pods(self.client.as_ref(), name).await?
        } else {
            PodCensus::default()
        };
        Ok(DrainResult { content_remains, pods })
    }
}

/// Maps what was left in a namespace after its deadline to the subsystem most likely stuck.
pub fn classify(
    namespace: &str,
    timeout: Duration,
    diagnosis: Result<DrainResult, ClusterError>,
) -> NamespaceDeletionError {
    let namespace = namespace.to_string();
    let diagnosis = match diagnosis {
        Ok(diagnosis) => diagnosis,
        Err(source) => {
            return NamespaceDeletionError::DiagnosisFailed {
                namespace,
                timeout,
                source,
            };
        }
    };

    match diagnosis {
        DrainResult {
            content_remains: false,
            ..
        } => NamespaceDeletionError::EmptyButNotRemoved { namespace, timeout },
        DrainResult {
            pods: PodCensus { remaining: 0, .. },
            ..
        } => NamespaceDeletionError::ContentRemains { namespace, timeout },
        DrainResult {
            pods:
                PodCensus {
                    remaining,
                    missing_deletion_timestamp: 0,
                },
            ..
        } => NamespaceDeletionError::PodsNotTerminated {
            namespace,
            timeout,
            remaining_pods: remaining,
        },
        DrainResult {
            pods:
                PodCensus {
                    remaining,
                    missing_deletion_timestamp,
                },
            ..
        } => NamespaceDeletionError::PodsNotMarkedForDeletion {
            namespace,
            timeout,
            remaining_pods: remaining,
            missing_deletion_timestamp,
        },
    }
}
