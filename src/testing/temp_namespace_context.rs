use crate::services::lifecycle::coordinator::LifecycleCoordinator;
use crate::services::lifecycle::coordinator::test_case::TestCase;
use crate::services::lifecycle::namespace_handle::NamespaceHandle;
use crate::services::lifecycle::run_id::RunId;
use crate::testing::{kind_clients, kind_settings};
use test_context::AsyncTestContext;

/// An isolated namespace on the kind cluster, removed again on teardown.
pub struct TempNamespaceContext {
    pub namespace: NamespaceHandle,
    pub coordinator: LifecycleCoordinator,
    test_case: TestCase,
}

impl AsyncTestContext for TempNamespaceContext {
    async fn setup() -> Self {
        let clients = kind_clients().await.expect("Failed to connect to the kind cluster");
        let coordinator = LifecycleCoordinator::new(kind_settings(), RunId::generate()).with_clients(clients);
        let test_case = TestCase::new("temp");
        let namespace = coordinator
            .before(&test_case)
            .await
            .expect("Failed to create namespace")
            .expect("Namespace creation is enabled");
        TempNamespaceContext {
            namespace,
            coordinator,
            test_case,
        }
    }

    async fn teardown(self) {
        self.coordinator
            .after(&self.test_case, false)
            .await
            .expect("Failed to delete test namespaces");
    }
}
