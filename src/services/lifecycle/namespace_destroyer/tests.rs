use super::*;
use crate::services::backends::memory::{InMemoryCluster, Operation};
use crate::services::base::cluster_client::ClusterClients;
use crate::services::base::resource_kind::ResourceKind;
use crate::services::lifecycle::discovery_cache::DiscoveryCache;
use crate::services::lifecycle::namespace_destroyer::deletion_error::SuspectedComponent;

const TIMEOUT: Duration = Duration::from_secs(10);

fn destroyer(clients: &ClusterClients) -> NamespaceDestroyer {
    let prober = DrainProber::new(
        DiscoveryCache::new(clients.client.clone()),
        clients.dynamic_client.clone(),
    );
    NamespaceDestroyer::new(clients.client.clone(), prober)
}

#[tokio::test(start_paused = true)]
async fn test_empty_namespace_is_deleted() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().with_removal_delay(2).into_clients();
    cluster.add_namespace("ns").await;

    // Act
    let result = destroyer(&clients).delete_namespace("ns", TIMEOUT).await;

    // Assert
    assert_eq!(result, Ok(()));
    assert!(cluster.namespace("ns").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_already_deleted_namespace_is_not_an_error() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();

    // Act
    let result = destroyer(&clients).delete_namespace("gone", TIMEOUT).await;

    // Assert
    assert_eq!(result, Ok(()));
    assert_eq!(cluster.call_count(Operation::Get).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_delete_is_reported() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_namespace("ns").await;
    cluster
        .fail_next(Operation::Delete, ClusterError::Forbidden("namespaces is forbidden".to_string()))
        .await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert!(!error.is_timeout());
    assert_eq!(error.namespace(), "ns");
    assert!(error.to_string().contains("namespaces is forbidden"));
}

#[tokio::test(start_paused = true)]
async fn test_transient_read_errors_keep_waiting() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().with_removal_delay(1).into_clients();
    cluster.add_namespace("ns").await;
    cluster
        .fail_next(Operation::Get, ClusterError::ServiceUnavailable("apiserver".to_string()))
        .await;

    // Act
    let result = destroyer(&clients).delete_namespace("ns", TIMEOUT).await;

    // Assert
    assert_eq!(result, Ok(()));
}

#[tokio::test(start_paused = true)]
async fn test_unmarked_pods_implicate_namespace_controller() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_namespace("ns").await;
    cluster.add_pod("ns", "web-0", false).await;
    cluster.add_pod("ns", "web-1", false).await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert_eq!(
        error,
        NamespaceDeletionError::PodsNotMarkedForDeletion {
            namespace: "ns".to_string(),
            timeout: TIMEOUT,
            remaining_pods: 2,
            missing_deletion_timestamp: 2,
        }
    );
    assert!(error.to_string().contains("pods remaining: 2"));
    assert!(error.to_string().contains("missing deletion timestamp: 2"));
    assert_eq!(error.suspected_component(), SuspectedComponent::NamespaceController);
}

#[tokio::test(start_paused = true)]
async fn test_marked_pods_implicate_node_agent() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_namespace("ns").await;
    cluster.add_pod("ns", "web-0", true).await;
    cluster.add_pod("ns", "web-1", true).await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert!(error.to_string().contains("pods remaining: 2"));
    assert!(!error.to_string().contains("missing deletion timestamp"));
    assert_eq!(error.suspected_component(), SuspectedComponent::NodeAgent);
}

#[tokio::test(start_paused = true)]
async fn test_stuck_finalizer_on_empty_namespace() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().with_stuck_finalizer().into_clients();
    cluster.add_namespace("ns").await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert!(error.is_timeout());
    assert!(error.to_string().contains("namespace is empty but is not yet removed"));
    assert_eq!(error.suspected_component(), SuspectedComponent::NamespaceFinalizer);
}

#[tokio::test(start_paused = true)]
async fn test_non_pod_content_implicates_garbage_collector() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_namespace("ns").await;
    cluster
        .add_object("ns", &ResourceKind::new("apps", "v1", "deployments", "Deployment"), "web")
        .await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert!(error.to_string().contains("namespaced content other than pods remains"));
    assert_eq!(error.suspected_component(), SuspectedComponent::GarbageCollector);
}

#[tokio::test(start_paused = true)]
async fn test_failed_inspection_is_reported() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().with_stuck_finalizer().into_clients();
    cluster.add_namespace("ns").await;
    cluster
        .fail_listing("configmaps", ClusterError::Other("connection reset".to_string()))
        .await;

    // Act
    let error = destroyer(&clients).delete_namespace("ns", TIMEOUT).await.unwrap_err();

    // Assert
    assert_eq!(
        error,
        NamespaceDeletionError::DiagnosisFailed {
            namespace: "ns".to_string(),
            timeout: TIMEOUT,
            source: ClusterError::Other("connection reset".to_string()),
        }
    );
}

#[test]
fn test_classification_of_empty_namespace_ignores_pod_counts() {
    // Arrange
    let diagnosis = DrainResult {
        content_remains: false,
        pods: PodCensus::default(),
    };

    // Act
    let error = classify("ns", TIMEOUT, Ok(diagnosis));

    // Assert
    assert_eq!(
        error,
        NamespaceDeletionError::EmptyButNotRemoved {
            namespace: "ns".to_string(),
            timeout: TIMEOUT,
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_unbounded_deadline_is_accepted() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().with_removal_delay(1).into_clients();
    cluster.add_namespace("ns").await;

    // Act
    let result = destroyer(&clients).delete_namespace("ns", Duration::MAX).await;

    // Assert
    assert_eq!(result, Ok(()));
}
