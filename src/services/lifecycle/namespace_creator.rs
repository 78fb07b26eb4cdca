#[cfg(test)]
mod tests;

use crate::services::base::cluster_client::ClusterClient;
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::polling::{Attempt, PollError, poll_until};
use crate::services::lifecycle::namespace_handle::NamespaceHandle;
use crate::services::lifecycle::run_id::{RUN_ID_LABEL, RunId};
use crate::services::lifecycle::{
    DEFAULT_SERVICE_ACCOUNT, NAMESPACE_CREATION_TIMEOUT, POLL_INTERVAL, SERVICE_ACCOUNT_PROVISION_TIMEOUT,
};
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use log::{info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Label carrying the base name of the test suite that owns a namespace.
pub const BASE_NAME_LABEL: &str = "e2e-framework";

#[derive(Debug)]
pub enum CreateNamespaceError {
    /// The namespace was never accepted by the cluster
    Create(PollError<ClusterError>),
    /// The namespace exists but its default service account never showed up
    IdentityNotProvisioned {
        handle: NamespaceHandle,
        source: ClusterError,
    },
}

impl CreateNamespaceError {
    /// The namespace that was created before the failure, if any.
    pub fn created_namespace(&self) -> Option<&NamespaceHandle> {
        match self {
            CreateNamespaceError::Create(_) => None,
            CreateNamespaceError::IdentityNotProvisioned { handle, .. } => Some(handle),
        }
    }
}

impl Display for CreateNamespaceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CreateNamespaceError::Create(e) => write!(f, "failed to create namespace: {}", e),
            CreateNamespaceError::IdentityNotProvisioned { handle, source } => write!(
                f,
                "default service account was not provisioned in namespace {}: {}",
                handle.name, source
            ),
        }
    }
}

impl Error for CreateNamespaceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CreateNamespaceError::Create(e) => Some(e),
            CreateNamespaceError::IdentityNotProvisioned { source, .. } => Some(source),
        }
    }
}

/// Creates uniquely named test namespaces and waits until pods can be admitted into them.
#[derive(Clone)]
pub struct NamespaceCreator {
    client: Arc<dyn ClusterClient>,
    run_id: RunId,
    interval: Duration,
    creation_timeout: Duration,
    identity_timeout: Duration,
}

impl NamespaceCreator {
    pub fn new(client: Arc<dyn ClusterClient>, run_id: RunId) -> Self {
        NamespaceCreator {
            client,
            run_id,
            interval: POLL_INTERVAL,
            creation_timeout: NAMESPACE_CREATION_TIMEOUT,
            identity_timeout: SERVICE_ACCOUNT_PROVISION_TIMEOUT,
        }
    }

    pub fn with_identity_timeout(mut self, identity_timeout: Duration) -> Self {
        self.identity_timeout = identity_timeout;
        self
    }

    pub fn generate_name_prefix(&self, base_name: &str) -> String {
        format!("e2e-test-{}-{}-", base_name, self.run_id.short())
    }

    pub fn namespace_definition(&self, base_name: &str, labels: BTreeMap<String, String>) -> Namespace {
        let mut labels = labels;
        labels.insert(RUN_ID_LABEL.to_string(), self.run_id.to_string());
        labels.insert(BASE_NAME_LABEL.to_string(), base_name.to_string());
        Namespace {
            metadata: ObjectMeta {
                generate_name: Some(self.generate_name_prefix(base_name)),
                labels: Some(labels),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub async fn create_namespace(
        &self,
        base_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<NamespaceHandle, CreateNamespaceError> {
        let definition = self.namespace_definition(base_name, labels);

        let created = poll_until(self.interval, self.creation_timeout, || {
            let definition = &definition;
            async move {
                match self.client.create_namespace(definition).await {
                    Ok(namespace) => Attempt::Done(namespace),
                    Err(e) => {
                        warn!("Unexpected error when creating namespace: {}", e);
                        Attempt::NotYet
                    }
                }
            }
        })
        .await
        .map_err(CreateNamespaceError::Create)?;

        let handle = NamespaceHandle::try_from(&created)
            .map_err(|e| CreateNamespaceError::Create(PollError::Attempt(ClusterError::Other(e.to_string()))))?;
        info!("Namespace {} created, waiting for its default service account", handle.name);

        if let Err(source) = self
            .client
            .wait_for_service_account(&handle.name, DEFAULT_SERVICE_ACCOUNT, self.identity_timeout)
            .await
        {
            return Err(CreateNamespaceError::IdentityNotProvisioned { handle, source });
        }
        Ok(handle)
    }
}
