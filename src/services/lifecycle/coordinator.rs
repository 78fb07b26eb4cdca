pub mod lifecycle_error;
pub mod test_case;


use crate::configuration::models::test_context_settings::TestContextSettings;
use crate::services::backends::kubernetes::kube_cluster_client::KubeClientProvider;
use crate::services::base::cluster_client::{ClientProvider, ClusterClients};
use crate::services::lifecycle::coordinator::lifecycle_error::LifecycleError;
use crate::services::lifecycle::coordinator::test_case::TestCase;
use crate::services::lifecycle::discovery_cache::DiscoveryCache;
use crate::services::lifecycle::drain_prober::DrainProber;
use crate::services::lifecycle::namespace_creator::NamespaceCreator;
use crate::services::lifecycle::namespace_destroyer::NamespaceDestroyer;
use crate::services::lifecycle::namespace_handle::NamespaceHandle;
use crate::services::lifecycle::run_census::count_run_namespaces;
use crate::services::lifecycle::run_id::RunId;
use futures::FutureExt;
use futures::future::join_all;
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Default)]
struct CoordinatorState {
    clients: Option<ClusterClients>,
    namespaces: Vec<NamespaceHandle>,
    namespace: Option<NamespaceHandle>,
}

/// Creates the namespaces of a test case before its body runs and removes them afterwards.
///
/// One coordinator serves one test case at a time. Parallel test cases use separate coordinators.
pub struct LifecycleCoordinator {
    settings: Arc<TestContextSettings>,
    run_id: RunId,
    injected_clients: Option<ClusterClients>,
    client_provider: Arc<dyn ClientProvider>,
    identity_timeout: Option<Duration>,
    state: Mutex<CoordinatorState>,
}

impl LifecycleCoordinator {
    pub fn new(settings: Arc<TestContextSettings>, run_id: RunId) -> Self {
        LifecycleCoordinator {
            settings,
            run_id,
            injected_clients: None,
            client_provider: Arc::new(KubeClientProvider),
            identity_timeout: None,
            state: Mutex::new(CoordinatorState::default()),
        }
    }

    /// Uses `clients` for every test case instead of connecting through the settings.
    pub fn with_clients(mut self, clients: ClusterClients) -> Self {
        self.injected_clients = Some(clients);
        self
    }

    pub fn with_client_provider(mut self, client_provider: Arc<dyn ClientProvider>) -> Self {
        self.client_provider = client_provider;
        self
    }

    pub fn with_identity_timeout(mut self, identity_timeout: Duration) -> Self {
        self.identity_timeout = Some(identity_timeout);
        self
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    pub fn settings(&self) -> &TestContextSettings {
        &self.settings
    }

    /// The namespace created for the current test case.
    pub async fn namespace(&self) -> Option<NamespaceHandle> {
        self.state.lock().await.namespace.clone()
    }

    pub async fn registered_namespaces(&self) -> Vec<NamespaceHandle> {
        self.state.lock().await.namespaces.clone()
    }

    /// Clients bound to the current test case, connecting on first use.
    pub async fn clients(&self) -> Result<ClusterClients, LifecycleError> {
        let mut state = self.state.lock().await;
        if let Some(clients) = &state.clients {
            return Ok(clients.clone());
        }
        let clients = match &self.injected_clients {
            Some(clients) => clients.clone(),
            None => self
                .client_provider
                .connect(&self.settings)
                .await
                .map_err(LifecycleError::Configuration)?,
        };
        state.clients = Some(clients.clone());
        Ok(clients)
    }

    pub async fn before(&self, test_case: &TestCase) -> Result<Option<NamespaceHandle>, LifecycleError> {
        self.clients().await?;
        if test_case.skip_namespace_creation {
            info!("Skipping namespace creation for {}", test_case.name);
            return Ok(None);
        }
        let handle = self.create_namespace(&test_case.name, BTreeMap::new()).await?;
        self.state.lock().await.namespace = Some(handle.clone());
        Ok(Some(handle))
    }

    /// Creates a namespace and registers it for cleanup at the end of the test case.
    ///
    /// A namespace that was created but never got its default service account is
    /// registered as well, the error is still returned.
    pub async fn create_namespace(
        &self,
        base_name: &str,
        labels: BTreeMap<String, String>,
    ) -> Result<NamespaceHandle, LifecycleError> {
        let clients = self.clients().await?;
        let mut creator = NamespaceCreator::new(clients.client, self.run_id);
        if let Some(timeout) = self.identity_timeout {
            creator = creator.with_identity_timeout(timeout);
        }
        match creator.create_namespace(base_name, labels).await {
            Ok(handle) => {
                self.register(handle.clone()).await;
                Ok(handle)
            }
            Err(e) => {
                if let Some(handle) = e.created_namespace() {
                    self.register(handle.clone()).await;
                }
                Err(LifecycleError::Creation(e))
            }
        }
    }

    async fn register(&self, handle: NamespaceHandle) {
        debug!("Registering namespace {} for cleanup", handle.name);
        self.state.lock().await.namespaces.push(handle);
    }

    /// Deletes every namespace registered during the test case and resets the coordinator.
    pub async fn after(&self, test_case: &TestCase, failed: bool) -> Result<(), LifecycleError> {
        let (clients, namespaces) = {
            let mut state = self.state.lock().await;
            let state = std::mem::take(&mut *state);
            (state.clients, state.namespaces)
        };
        let Some(clients) = clients else {
            return Ok(());
        };
        let names: Vec<&str> = namespaces.iter().map(|handle| handle.name.as_str()).collect();

        if !self.settings.delete_namespace {
            info!("Namespace deletion is disabled, keeping {:?}", names);
            return Ok(());
        }
        if failed && !self.settings.delete_namespace_on_failure {
            info!("{} failed, keeping namespaces {:?}", test_case.name, names);
            return Ok(());
        }

        let prober = DrainProber::new(
            DiscoveryCache::new(clients.client.clone()),
            clients.dynamic_client.clone(),
        );
        let destroyer = NamespaceDestroyer::new(clients.client.clone(), prober);
        let timeout = self.settings.namespace_deletion_timeout();
        let results = join_all(names.iter().map(|name| destroyer.delete_namespace(name, timeout))).await;

        let mut failures = BTreeMap::new();
        for (name, result) in names.iter().zip(results) {
            match result {
                Ok(()) => {}
                Err(e) => {
                    error!("Couldn't delete namespace {}: {}", name, e);
                    failures.insert(name.to_string(), e);
                }
            }
        }

        match count_run_namespaces(clients.client.as_ref(), &self.run_id).await {
            Ok(census) => debug!("Namespaces of run {} still present: {}", self.run_id, census),
            Err(e) => debug!("Couldn't count namespaces of run {}: {}", self.run_id, e),
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::CleanupFailed(failures))
        }
    }

    /// Runs `body` between [`LifecycleCoordinator::before`] and [`LifecycleCoordinator::after`].
    ///
    /// Cleanup runs even when the body panics, the panic is resumed afterwards.
    pub async fn run<'a, F, Fut, T>(&'a self, test_case: &TestCase, body: F) -> Result<T, LifecycleError>
    where
        F: FnOnce(&'a LifecycleCoordinator) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        if let Err(e) = self.before(test_case).await {
            if let Err(cleanup) = self.after(test_case, true).await {
                warn!("Cleanup after failed setup of {} failed: {}", test_case.name, cleanup);
            }
            return Err(e);
        }

        let outcome = AssertUnwindSafe(body(self)).catch_unwind().await;
        let failed = !matches!(outcome, Ok(Ok(_)));
        let cleanup = self.after(test_case, failed).await;

        match (outcome, cleanup) {
            (Err(panic), cleanup) => {
                if let Err(e) = cleanup {
                    error!("{}", e);
                }
                std::panic::resume_unwind(panic)
            }
            (Ok(Ok(value)), Ok(())) => Ok(value),
            (Ok(Ok(_)), Err(e)) => Err(e),
            (Ok(Err(source)), Ok(())) => Err(LifecycleError::TestFailed { source, cleanup: None }),
            (Ok(Err(source)), Err(e)) => Err(LifecycleError::TestFailed {
                source,
                cleanup: e.cleanup_failures().cloned(),
            }),
        }
    }
}
