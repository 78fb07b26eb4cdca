use super::*;
use crate::services::backends::memory::{InMemoryCluster, Operation};
use crate::services::base::cluster_client::ClusterClients;
use crate::services::base::resource_kind::ResourceKind;
use crate::services::lifecycle::DISCOVERY_TIMEOUT;

fn config_maps() -> ResourceKind {
    ResourceKind::new("", "v1", "configmaps", "ConfigMap")
}

fn prober(clients: &ClusterClients) -> DrainProber {
    DrainProber::new(DiscoveryCache::new(clients.client.clone()), clients.dynamic_client.clone())
}

#[tokio::test(start_paused = true)]
async fn test_empty_namespace_has_no_content() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_namespace("ns").await;
    cluster.delete_namespace("ns").await.unwrap();

    // Act
    let remains = prober(&clients).has_remaining_content("ns", DISCOVERY_TIMEOUT).await;

    // Assert
    assert_eq!(remains, Ok(false));
}

#[tokio::test(start_paused = true)]
async fn test_every_kind_with_stragglers_is_reported() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().without_service_account_provisioning().into_clients();
    cluster.add_namespace("ns").await;
    cluster.add_pod("ns", "web-0", false).await;
    cluster.add_object("ns", &config_maps(), "settings").await;

    // Act
    let remaining = prober(&clients).remaining_content("ns", DISCOVERY_TIMEOUT).await.unwrap();

    // Assert
    assert_eq!(remaining.len(), 2);
    assert_eq!(remaining.get("v1, Resource=pods"), Some(&vec!["web-0".to_string()]));
    assert_eq!(remaining.get("v1, Resource=configmaps"), Some(&vec!["settings".to_string()]));
}

#[tokio::test(start_paused = true)]
async fn test_ignored_resources_are_never_listed() {
    // Arrange
    let bindings = ResourceKind::new("", "v1", "bindings", "Binding").with_verbs(&["list", "delete"]);
    let (cluster, clients) = InMemoryCluster::new().with_resources(vec![bindings.clone()]).into_clients();
    cluster.add_object("ns", &bindings, "binding-0").await;

    // Act
    let remains = prober(&clients).has_remaining_content("ns", DISCOVERY_TIMEOUT).await;

    // Assert
    assert_eq!(remains, Ok(false));
    assert_eq!(cluster.call_count(Operation::ListObjects).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_skippable_listing_errors_do_not_abort() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_pod("ns", "web-0", true).await;
    cluster
        .fail_listing("configmaps", ClusterError::Forbidden("configmaps is forbidden".to_string()))
        .await;
    cluster
        .fail_listing("deployments", ClusterError::ServiceUnavailable("apps unavailable".to_string()))
        .await;

    // Act
    let remains = prober(&clients).has_remaining_content("ns", DISCOVERY_TIMEOUT).await;

    // Assert
    assert_eq!(remains, Ok(true));
}

#[tokio::test(start_paused = true)]
async fn test_unexpected_listing_error_aborts_probe() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster
        .fail_listing("configmaps", ClusterError::Other("connection reset".to_string()))
        .await;

    // Act
    let result = prober(&clients).has_remaining_content("ns", DISCOVERY_TIMEOUT).await;

    // Assert
    assert_eq!(result, Err(ClusterError::Other("connection reset".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_missing_dynamic_client_reports_no_content() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_pod("ns", "web-0", false).await;
    let prober = DrainProber::new(DiscoveryCache::new(clients.client.clone()), None);

    // Act
    let remains = prober.has_remaining_content("ns", DISCOVERY_TIMEOUT).await;

    // Assert
    assert_eq!(remains, Ok(false));
    assert_eq!(cluster.call_count(Operation::Discover).await, 0);
}

#[tokio::test]
async fn test_pod_census_counts_missing_deletion_timestamps() {
    // Arrange
    let (cluster, clients) = InMemoryCluster::new().into_clients();
    cluster.add_pod("ns", "web-0", false).await;
    cluster.add_pod("ns", "web-1", true).await;
    cluster.add_pod("ns", "web-2", false).await;

    // Act
    let census = count_remaining_pods(clients.client.as_ref(), "ns").await.unwrap();

    // Assert
    assert_eq!(
        census,
        PodCensus {
            remaining: 3,
            missing_deletion_timestamp: 2
        }
    );
}
