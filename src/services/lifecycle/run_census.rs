
use crate::services::base::cluster_client::ClusterClient;
use crate::services::base::cluster_error::ClusterError;
use crate::services::lifecycle::namespace_handle::{NamespaceHandle, NamespacePhase};
use crate::services::lifecycle::run_id::RunId;
use log::warn;
use std::fmt::{Display, Formatter};

/// Namespaces of one test run that still exist in the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunNamespaceCensus {
    pub active: usize,
    pub terminating: usize,
}

impl RunNamespaceCensus {
    pub fn total(&self) -> usize {
        self.active + self.terminating
    }
}

impl Display for RunNamespaceCensus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "active: {}, terminating: {}", self.active, self.terminating)
    }
}

pub async fn count_run_namespaces(client: &dyn ClusterClient, run_id: &RunId) -> Result<RunNamespaceCensus, ClusterError> {
    let namespaces = client.list_namespaces(&run_id.label_selector()).await?;
    let mut census = RunNamespaceCensus::default();
    for namespace in &namespaces {
        match NamespaceHandle::try_from(namespace) {
            Ok(handle) if handle.phase == NamespacePhase::Terminating => census.terminating += 1,
            Ok(_) => census.active += 1,
            Err(e) => warn!("Skipping namespace in run census: {}", e),
        }
    }
    Ok(census)
}
