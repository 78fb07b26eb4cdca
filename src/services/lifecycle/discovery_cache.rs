
use crate::services::base::cluster_client::ClusterClient;
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::polling::{Attempt, PollError, poll_until};
use crate::services::base::resource_kind::ResourceKind;
use crate::services::lifecycle::POLL_INTERVAL;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

/// Resolves which namespaced kinds can be listed and deleted.
///
/// Nothing is kept between calls: API extensions come and go between test cases,
/// so every call asks the server again.
#[derive(Clone)]
pub struct DiscoveryCache {
    client: Arc<dyn ClusterClient>,
    interval: Duration,
}

impl DiscoveryCache {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        DiscoveryCache {
            client,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Retries while discovery reports failed API groups; any other error is returned at once.
    pub async fn preferred_namespaced_resources(
        &self,
        timeout: Duration,
    ) -> Result<BTreeSet<ResourceKind>, PollError<ClusterError>> {
        let resources = poll_until(self.interval, timeout, || async move {
            match self.client.discover_namespaced_resources().await {
                Ok(resources) => Attempt::Done(resources),
                Err(ClusterError::PartialDiscovery(details)) => {
                    warn!("Discovery is incomplete, retrying: {}", details);
                    Attempt::NotYet
                }
                Err(e) => Attempt::Fatal(e),
            }
        })
        .await?;

        let drainable: BTreeSet<ResourceKind> = resources.into_iter().filter(ResourceKind::is_drainable).collect();
        debug!("{} namespaced kinds support list and delete", drainable.len());
        Ok(drainable)
    }
}
