use super::*;
use kube::core::ErrorResponse;
use maplit::btreemap;

fn api_error(code: u16) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("status {}", code),
        reason: "Test".to_string(),
        code,
    })
}

#[test]
fn test_kube_errors_are_classified_by_status_code() {
    assert_eq!(ClusterError::from(api_error(404)), ClusterError::NotFound("status 404".to_string()));
    assert_eq!(ClusterError::from(api_error(403)), ClusterError::Forbidden("status 403".to_string()));
    assert_eq!(
        ClusterError::from(api_error(405)),
        ClusterError::MethodNotAllowed("status 405".to_string())
    );
    assert_eq!(
        ClusterError::from(api_error(503)),
        ClusterError::ServiceUnavailable("status 503".to_string())
    );
    assert!(matches!(ClusterError::from(api_error(500)), ClusterError::Other(_)));
}

#[test]
fn test_skippable_listing_errors() {
    assert!(ClusterError::NotFound("x".to_string()).is_skippable_for_listing());
    assert!(ClusterError::Forbidden("x".to_string()).is_skippable_for_listing());
    assert!(ClusterError::MethodNotAllowed("x".to_string()).is_skippable_for_listing());
    assert!(ClusterError::ServiceUnavailable("x".to_string()).is_skippable_for_listing());
    assert!(!ClusterError::Other("x".to_string()).is_skippable_for_listing());
    assert!(!ClusterError::Timeout("x".to_string()).is_skippable_for_listing());
}

#[test]
fn test_partial_discovery_message_lists_failed_groups() {
    let details = PartialDiscoveryDetails::new(
        btreemap! { "metrics.k8s.io".to_string() => "the server is currently unable to handle the request".to_string() },
        Vec::new(),
    );
    let error = ClusterError::PartialDiscovery(details);

    assert!(error.is_partial_discovery());
    assert!(error.to_string().contains("metrics.k8s.io: the server is currently unable"));
}
