use super::*;
use crate::services::backends::memory::{InMemoryCluster, Operation};
use maplit::btreemap;
use std::collections::BTreeSet;
use tokio::time::Instant;
use uuid::Uuid;

fn run_id() -> RunId {
    RunId::from(Uuid::parse_str("5f0e8d4c-2b7a-4c1e-9f3d-6a5b4c3d2e1f").unwrap())
}

#[tokio::test(start_paused = true)]
async fn test_created_namespace_carries_run_and_base_name_labels() {
    // Arrange
    let (_, clients) = InMemoryCluster::new().into_clients();
    let creator = NamespaceCreator::new(clients.client, run_id());

    // Act
    let handle = creator
        .create_namespace("nginx", btreemap! { "team".to_string() => "web".to_string() })
        .await
        .unwrap();

    // Assert
    assert!(handle.name.starts_with("e2e-test-nginx-5f0e8d4c-"));
    assert_eq!(
        handle.labels.get(RUN_ID_LABEL).map(String::as_str),
        Some("5f0e8d4c-2b7a-4c1e-9f3d-6a5b4c3d2e1f")
    );
    assert_eq!(handle.labels.get(BASE_NAME_LABEL).map(String::as_str), Some("nginx"));
    assert_eq!(handle.labels.get("team").map(String::as_str), Some("web"));
}

#[tokio::test(start_paused = true)]
async fn test_names_are_unique_under_concurrent_creation() {
    // Arrange
    let (_, clients) = InMemoryCluster::new().into_clients();
    let creator = NamespaceCreator::new(clients.client, run_id());

    // Act
    let handles = futures::future::join_all((0..20).map(|_| creator.create_namespace("nginx", BTreeMap::new()))).await;

    // Assert
    let names: BTreeSet<String> = handles.into_iter().map(|h| h.unwrap().name).collect();
    assert_eq!(names.len(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_transient_create_failures_are_retried() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster
        .fail_next(Operation::Create, ClusterError::ServiceUnavailable("apiserver".to_string()))
        .await;
    cluster
        .fail_next(Operation::Create, ClusterError::Other("connection refused".to_string()))
        .await;
    let creator = NamespaceCreator::new(clients.client, run_id());

    // Act
    let result = creator.create_namespace("nginx", BTreeMap::new()).await;

    // Assert
    assert!(result.is_ok());
    assert_eq!(cluster.call_count(Operation::Create).await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_creation_gives_up_at_deadline() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    for _ in 0..100 {
        cluster
            .fail_next(Operation::Create, ClusterError::ServiceUnavailable("apiserver".to_string()))
            .await;
    }
    let creator = NamespaceCreator::new(clients.client, run_id());
    let start = Instant::now();

    // Act
    let result = creator.create_namespace("nginx", BTreeMap::new()).await;

    // Assert
    let error = result.unwrap_err();
    assert!(matches!(error, CreateNamespaceError::Create(PollError::Timeout(_))));
    assert!(error.created_namespace().is_none());
    assert!(start.elapsed() <= NAMESPACE_CREATION_TIMEOUT + POLL_INTERVAL);
    assert!(cluster.namespace_names().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_late_service_account() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().without_service_account_provisioning().into_clients();
    let creator = NamespaceCreator::new(clients.client, run_id());
    let provisioner = {
        let cluster = cluster.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(5)).await;
            for name in cluster.namespace_names().await {
                cluster.provision_service_account(&name, "default").await;
            }
        })
    };

    // Act
    let result = creator.create_namespace("nginx", BTreeMap::new()).await;

    // Assert
    provisioner.await.unwrap();
    assert!(result.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_missing_service_account_fails_with_created_namespace() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().without_service_account_provisioning().into_clients();
    let creator = NamespaceCreator::new(clients.client, run_id()).with_identity_timeout(Duration::from_secs(10));

    // Act
    let result = creator.create_namespace("nginx", BTreeMap::new()).await;

    // Assert
    let error = result.unwrap_err();
    let handle = error.created_namespace().cloned().unwrap();
    assert!(matches!(
        error,
        CreateNamespaceError::IdentityNotProvisioned {
            source: ClusterError::Timeout(_),
            ..
        }
    ));
    assert_eq!(cluster.namespace_names().await, vec![handle.name]);
}

#[tokio::test(start_paused = true)]
async fn test_caller_labels_cannot_replace_identifying_labels() {
    // Arrange
    let (_, clients) = InMemoryCluster::new().into_clients();
    let creator = NamespaceCreator::new(clients.client, run_id());
    let labels = btreemap! {
        BASE_NAME_LABEL.to_string() => "other".to_string(),
        RUN_ID_LABEL.to_string() => "another-run".to_string(),
    };

    // Act
    let handle = creator.create_namespace("nginx", labels).await.unwrap();

    // Assert
    assert_eq!(handle.labels.get(BASE_NAME_LABEL).map(String::as_str), Some("nginx"));
    assert_eq!(
        handle.labels.get(RUN_ID_LABEL).map(String::as_str),
        Some("5f0e8d4c-2b7a-4c1e-9f3d-6a5b4c3d2e1f")
    );
}
