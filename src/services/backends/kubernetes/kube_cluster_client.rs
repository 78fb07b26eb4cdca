use crate::configuration::models::test_context_settings::TestContextSettings;
use crate::services::backends::kubernetes::kubeconfig_loader;
use crate::services::base::cluster_client::{ClientProvider, ClusterClient, ClusterClients, DynamicClusterClient};
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::cluster_error::partial_discovery_details::PartialDiscoveryDetails;
use crate::services::base::resource_kind::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, Pod, ServiceAccount};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResourceList;
use kube::api::{DeleteParams, DynamicObject, ListParams, PostParams};
use kube::runtime::wait::await_condition;
use kube::{Api, Client, Config};
use log::{debug, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Cluster client backed by a live API server.
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        KubeClusterClient { client }
    }

    pub fn try_from_config(config: Config) -> anyhow::Result<Self> {
        let client = Client::try_from(config)?;
        Ok(KubeClusterClient::new(client))
    }

    fn namespaces(&self) -> Api<Namespace> {
        Api::all(self.client.clone())
    }
}

fn namespaced_kinds(list: &APIResourceList) -> impl Iterator<Item = ResourceKind> + '_ {
    list.resources
        .iter()
        .filter(|resource| resource.namespaced)
        .map(|resource| ResourceKind::from_api_resource(&list.group_version, resource))
        .filter(|kind| !kind.is_subresource())
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError> {
        Ok(self.namespaces().create(&PostParams::default(), namespace).await?)
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError> {
        Ok(self.namespaces().get(name).await?)
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        self.namespaces().delete(name, &DeleteParams::background()).await?;
        Ok(())
    }

    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<Namespace>, ClusterError> {
        let params = ListParams::default().labels(label_selector);
        Ok(self.namespaces().list(&params).await?.items)
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.list(&ListParams::default()).await?.items)
    }

    async fn wait_for_service_account(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let exists = |account: Option<&ServiceAccount>| account.is_some();
        match tokio::time::timeout(timeout, await_condition(api, name, exists)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(ClusterError::Other(format!("watch on service account {} failed: {}", name, e))),
            Err(_) => Err(ClusterError::Timeout(format!(
                "service account {}/{} was not provisioned within {:?}",
                namespace, name, timeout
            ))),
        }
    }

    async fn discover_namespaced_resources(&self) -> Result<Vec<ResourceKind>, ClusterError> {
        let mut discovered = Vec::new();

        let core = self.client.list_core_api_versions().await?;
        if let Some(version) = core.versions.first() {
            let resources = self.client.list_core_api_resources(version).await?;
            discovered.extend(namespaced_kinds(&resources));
        }

        let mut failed_groups = BTreeMap::new();
        let groups = self.client.list_api_groups().await?;
        for group in groups.groups {
            let Some(preferred) = group.preferred_version.or_else(|| group.versions.first().cloned()) else {
                continue;
            };
            match self.client.list_api_group_resources(&preferred.group_version).await {
                Ok(resources) => discovered.extend(namespaced_kinds(&resources)),
                Err(e) => {
                    warn!("Discovery of {} failed: {}", preferred.group_version, e);
                    failed_groups.insert(preferred.group_version, e.to_string());
                }
            }
        }

        debug!("Discovered {} namespaced resource kinds", discovered.len());
        if failed_groups.is_empty() {
            Ok(discovered)
        } else {
            Err(ClusterError::PartialDiscovery(PartialDiscoveryDetails::new(
                failed_groups,
                discovered,
            )))
        }
    }
}

#[async_trait]
impl DynamicClusterClient for KubeClusterClient {
    async fn list_objects(&self, kind: &ResourceKind, namespace: &str) -> Result<Vec<String>, ClusterError> {
        let api: Api<DynamicObject> = Api::namespaced_with(self.client.clone(), namespace, &kind.to_api_resource());
        let list = api.list(&ListParams::default()).await?;
        Ok(list.items.into_iter().filter_map(|object| object.metadata.name).collect())
    }
}

/// Connects to the cluster described by the test settings.
pub struct KubeClientProvider;

#[async_trait]
impl ClientProvider for KubeClientProvider {
    async fn connect(&self, settings: &TestContextSettings) -> anyhow::Result<ClusterClients> {
        let config = kubeconfig_loader::from_settings(settings).await?;
        let client = Arc::new(KubeClusterClient::try_from_config(config)?);
        Ok(ClusterClients::new(client.clone()).with_dynamic_client(client))
    }
}
