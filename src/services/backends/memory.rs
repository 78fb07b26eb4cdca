
use crate::services::base::cluster_client::{ClusterClient, ClusterClients, DynamicClusterClient};
use crate::services::base::cluster_error::ClusterError;
use crate::services::base::resource_kind::ResourceKind;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Namespace, NamespaceStatus, Pod};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::chrono::Utc;
use log::debug;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

const SERVICE_ACCOUNT_POLL: Duration = Duration::from_millis(100);

/// Backend operations that can be counted or scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Operation {
    Create,
    Get,
    Delete,
    Discover,
    ListPods,
    ListObjects,
}

#[derive(Default)]
struct ClusterState {
    namespaces: BTreeMap<String, Namespace>,
    pods: BTreeMap<String, Vec<Pod>>,
    objects: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    service_accounts: BTreeSet<(String, String)>,
    resources: Vec<ResourceKind>,
    provision_service_accounts: bool,
    finalizer_stuck: bool,
    removal_delay: u32,
    pending_removal: BTreeMap<String, u32>,
    scripted_failures: BTreeMap<Operation, VecDeque<ClusterError>>,
    list_failures: BTreeMap<String, ClusterError>,
    generated_names: u64,
    calls: BTreeMap<Operation, u32>,
}

impl ClusterState {
    fn record(&mut self, operation: Operation) -> Result<(), ClusterError> {
        *self.calls.entry(operation).or_default() += 1;
        match self.scripted_failures.get_mut(&operation).and_then(|queue| queue.pop_front()) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn has_content(&self, namespace: &str) -> bool {
        let has_pods = self.pods.get(namespace).is_some_and(|pods| !pods.is_empty());
        let has_objects = self
            .objects
            .get(namespace)
            .is_some_and(|kinds| kinds.values().any(|names| !names.is_empty()));
        has_pods || has_objects
    }

    fn next_name(&mut self, prefix: &str) -> String {
        self.generated_names += 1;
        format!("{}{:05x}", prefix, self.generated_names)
    }
}

/// In-process cluster with namespace controller semantics.
///
/// Content seeded with [`InMemoryCluster::add_pod`] or [`InMemoryCluster::add_object`] is never
/// drained, which models stuck controllers. A namespace without such content is removed once
/// deletion is requested, after `removal_delay` reads, unless the finalizer is marked stuck.
pub struct InMemoryCluster {
    state: RwLock<ClusterState>,
}

impl Default for InMemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCluster {
    pub fn new() -> Self {
        let state = ClusterState {
            resources: default_resources(),
            provision_service_accounts: true,
            ..Default::default()
        };
        InMemoryCluster {
            state: RwLock::new(state),
        }
    }

    pub fn with_resources(mut self, resources: Vec<ResourceKind>) -> Self {
        self.state.get_mut().resources = resources;
        self
    }

    /// Namespaces get their `default` service account only when explicitly provisioned.
    pub fn without_service_account_provisioning(mut self) -> Self {
        self.state.get_mut().provision_service_accounts = false;
        self
    }

    pub fn with_stuck_finalizer(mut self) -> Self {
        self.state.get_mut().finalizer_stuck = true;
        self
    }

    /// Number of reads a terminating, empty namespace survives before it disappears.
    pub fn with_removal_delay(mut self, reads: u32) -> Self {
        self.state.get_mut().removal_delay = reads;
        self
    }

    pub fn into_clients(self) -> (Arc<InMemoryCluster>, ClusterClients) {
        let cluster = Arc::new(self);
        let clients = ClusterClients::new(cluster.clone()).with_dynamic_client(cluster.clone());
        (cluster, clients)
    }

    pub async fn fail_next(&self, operation: Operation, error: ClusterError) {
        let mut state = self.state.write().await;
        state.scripted_failures.entry(operation).or_default().push_back(error);
    }

    /// Every listing of `resource` fails with `error` until cleared.
    pub async fn fail_listing(&self, resource: &str, error: ClusterError) {
        let mut state = self.state.write().await;
        state.list_failures.insert(resource.to_string(), error);
    }

    pub async fn call_count(&self, operation: Operation) -> u32 {
        let state = self.state.read().await;
        state.calls.get(&operation).copied().unwrap_or_default()
    }

    pub async fn add_pod(&self, namespace: &str, name: &str, marked_for_deletion: bool) {
        let pod = Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                deletion_timestamp: marked_for_deletion.then(|| Time(Utc::now())),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut state = self.state.write().await;
        state.pods.entry(namespace.to_string()).or_default().push(pod);
    }

    pub async fn add_object(&self, namespace: &str, kind: &ResourceKind, name: &str) {
        let mut state = self.state.write().await;
        state
            .objects
            .entry(namespace.to_string())
            .or_default()
            .entry(kind.resource.clone())
            .or_default()
            .push(name.to_string());
    }

    pub async fn add_namespace(&self, name: &str) {
        let namespace = Namespace {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut state = self.state.write().await;
        insert_namespace(&mut state, name.to_string(), namespace);
    }

    pub async fn provision_service_account(&self, namespace: &str, name: &str) {
        let mut state = self.state.write().await;
        state
            .service_accounts
            .insert((namespace.to_string(), name.to_string()));
    }

    pub async fn namespace(&self, name: &str) -> Option<Namespace> {
        let state = self.state.read().await;
        state.namespaces.get(name).cloned()
    }

    pub async fn namespace_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.namespaces.keys().cloned().collect()
    }
}

fn insert_namespace(state: &mut ClusterState, name: String, mut namespace: Namespace) -> Namespace {
    namespace.metadata.name = Some(name.clone());
    namespace.metadata.generate_name = None;
    namespace.metadata.creation_timestamp = Some(Time(Utc::now()));
    namespace.status = Some(NamespaceStatus {
        phase: Some("Active".to_string()),
        ..Default::default()
    });
    if state.provision_service_accounts {
        state.service_accounts.insert((name.clone(), "default".to_string()));
    }
    state.namespaces.insert(name, namespace.clone());
    namespace
}

fn default_resources() -> Vec<ResourceKind> {
    vec![
        ResourceKind::new("", "v1", "pods", "Pod").with_verbs(&["create", "delete", "get", "list", "watch"]),
        ResourceKind::new("", "v1", "configmaps", "ConfigMap").with_verbs(&["create", "delete", "get", "list"]),
        ResourceKind::new("", "v1", "serviceaccounts", "ServiceAccount")
            .with_verbs(&["create", "delete", "get", "list"]),
        ResourceKind::new("", "v1", "bindings", "Binding").with_verbs(&["create"]),
        ResourceKind::new("apps", "v1", "deployments", "Deployment").with_verbs(&["create", "delete", "get", "list"]),
    ]
}

fn matches_selector(namespace: &Namespace, label_selector: &str) -> bool {
    let labels = namespace.metadata.labels.clone().unwrap_or_default();
    label_selector
        .split(',')
        .filter(|requirement| !requirement.trim().is_empty())
        .all(|requirement| match requirement.split_once('=') {
            Some((key, value)) => labels.get(key.trim()).is_some_and(|v| v == value.trim()),
            None => labels.contains_key(requirement.trim()),
        })
}

#[async_trait]
impl ClusterClient for InMemoryCluster {
    async fn create_namespace(&self, namespace: &Namespace) -> Result<Namespace, ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::Create)?;
        let name = match (&namespace.metadata.name, &namespace.metadata.generate_name) {
            (Some(name), _) => name.clone(),
            (None, Some(prefix)) => state.next_name(prefix),
            (None, None) => return Err(ClusterError::Other("name or generateName is required".to_string())),
        };
        if state.namespaces.contains_key(&name) {
            return Err(ClusterError::Other(format!("namespaces \"{}\" already exists", name)));
        }
        debug!("Created in-memory namespace {}", name);
        Ok(insert_namespace(&mut state, name, namespace.clone()))
    }

    async fn get_namespace(&self, name: &str) -> Result<Namespace, ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::Get)?;
        if let Some(remaining) = state.pending_removal.get_mut(name) {
            if *remaining == 0 {
                state.pending_removal.remove(name);
                state.namespaces.remove(name);
            } else {
                *remaining -= 1;
            }
        }
        state
            .namespaces
            .get(name)
            .cloned()
            .ok_or_else(|| ClusterError::NotFound(format!("namespaces \"{}\" not found", name)))
    }

    async fn delete_namespace(&self, name: &str) -> Result<(), ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::Delete)?;
        let Some(namespace) = state.namespaces.get_mut(name) else {
            return Err(ClusterError::NotFound(format!("namespaces \"{}\" not found", name)));
        };
        if namespace.metadata.deletion_timestamp.is_none() {
            namespace.metadata.deletion_timestamp = Some(Time(Utc::now()));
        }
        namespace.status = Some(NamespaceStatus {
            phase: Some("Terminating".to_string()),
            ..Default::default()
        });
        state.service_accounts.retain(|(namespace, _)| namespace != name);

        if state.finalizer_stuck || state.has_content(name) {
            debug!("In-memory namespace {} is stuck in Terminating", name);
            return Ok(());
        }
        if state.removal_delay == 0 {
            state.namespaces.remove(name);
        } else {
            let delay = state.removal_delay;
            state.pending_removal.entry(name.to_string()).or_insert(delay);
        }
        Ok(())
    }

    async fn list_namespaces(&self, label_selector: &str) -> Result<Vec<Namespace>, ClusterError> {
        let state = self.state.read().await;
        Ok(state
            .namespaces
            .values()
            .filter(|namespace| matches_selector(namespace, label_selector))
            .cloned()
            .collect())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::ListPods)?;
        Ok(state.pods.get(namespace).cloned().unwrap_or_default())
    }

    async fn wait_for_service_account(
        &self,
        namespace: &str,
        name: &str,
        timeout: Duration,
    ) -> Result<(), ClusterError> {
        let key = (namespace.to_string(), name.to_string());
        let start_time = Instant::now();
        loop {
            if self.state.read().await.service_accounts.contains(&key) {
                return Ok(());
            }
            if start_time.elapsed() >= timeout {
                return Err(ClusterError::Timeout(format!(
                    "service account {}/{} was not provisioned within {:?}",
                    namespace, name, timeout
                )));
            }
            tokio::time::sleep(SERVICE_ACCOUNT_POLL).await;
        }
    }

    async fn discover_namespaced_resources(&self) -> Result<Vec<ResourceKind>, ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::Discover)?;
        Ok(state.resources.clone())
    }
}

#[async_trait]
impl DynamicClusterClient for InMemoryCluster {
    async fn list_objects(&self, kind: &ResourceKind, namespace: &str) -> Result<Vec<String>, ClusterError> {
        let mut state = self.state.write().await;
        state.record(Operation::ListObjects)?;
        if let Some(error) = state.list_failures.get(&kind.resource) {
            return Err(error.clone());
        }
        let names = match (kind.group.as_str(), kind.resource.as_str()) {
            ("", "pods") => state
                .pods
                .get(namespace)
                .map(|pods| pods.iter().filter_map(|pod| pod.metadata.name.clone()).collect())
                .unwrap_or_default(),
            ("", "serviceaccounts") => state
                .service_accounts
                .iter()
                .filter(|(ns, _)| ns == namespace)
                .map(|(_, name)| name.clone())
                .collect(),
            _ => state
                .objects
                .get(namespace)
                .and_then(|kinds| kinds.get(&kind.resource))
                .cloned()
                .unwrap_or_default(),
        };
        Ok(names)
    }
}
