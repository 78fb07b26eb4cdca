use crate::configuration::models::test_context_settings::TestContextSettings;
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::resource_kind::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
/// Typed operations on namespaces, pods and service accounts plus API discovery
pub trait ClusterClient: Send + Sync {
    /// Submits a namespace object, honoring `metadata.generate_name`
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError>;

    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError>;

    /// Requests deletion; the namespace may linger in the Terminating phase afterwards
    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError>;

    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<Namespace>, ClusterError>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError>;

    /// Blocks until the named service account exists or `timeout` elapses
    async fn wait_for_service_account(&self, namespace: &str, name: &str, timeout: Duration)
    -> Result<(), ClusterError>;

    /// Returns the preferred version of every namespaced resource kind the server exposes
    async fn discover_namespaced_resources(&self) -> Result<Vec<ResourceKind>, ClusterError>;
}

#[async_trait]
/// Kind-agnostic listing used to look for leftovers of arbitrary resource kinds
pub trait DynamicClusterClient: Send + Sync {
    /// Returns the names of all objects of `kind` in `namespace`
    async fn list_objects(&self, kind: &ResourceKind, namespace: &str) -> Result<Vec<String>, ClusterError>;
}

/// Client handles a lifecycle coordinator works with.
#[derive(Clone)]
pub struct ClusterClients {
    pub client: Arc<dyn ClusterClient>,
    pub dynamic_client: Option<Arc<dyn DynamicClusterClient>>,
}

impl ClusterClients {
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        ClusterClients {
            client,
            dynamic_client: None,
        }
    }

    pub fn with_dynamic_client(mut self, dynamic_client: Arc<dyn DynamicClusterClient>) -> Self {
        self.dynamic_client = Some(dynamic_client);
        self
    }
}

#[async_trait]
/// Builds cluster clients from the process configuration
pub trait ClientProvider: Send + Sync {
    async fn connect(&self, settings: &TestContextSettings) -> anyhow::Result<ClusterClients>;
}
