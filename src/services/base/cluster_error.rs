pub mod partial_discovery_details;

#[cfg(test)]
mod tests;

use crate::services::base::cluster_error::partial_discovery_details::PartialDiscoveryDetails;
use crate::services::base::polling::PollError;
use kube::core::ErrorResponse;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Classified error returned by every cluster backend call.
/// The lifecycle logic only ever branches on the variant, never on the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterError {
    NotFound(String),
    Forbidden(String),
    MethodNotAllowed(String),
    ServiceUnavailable(String),
    PartialDiscovery(PartialDiscoveryDetails),
    Timeout(String),
    Other(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }

    pub fn is_partial_discovery(&self) -> bool {
        matches!(self, ClusterError::PartialDiscovery(_))
    }

    /// Listing failures that only mean "this kind cannot be inspected here right now".
    pub fn is_skippable_for_listing(&self) -> bool {
        matches!(
            self,
            ClusterError::NotFound(_)
                | ClusterError::Forbidden(_)
                | ClusterError::MethodNotAllowed(_)
                | ClusterError::ServiceUnavailable(_)
        )
    }
}

impl From<kube::Error> for ClusterError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(ErrorResponse { code: 404, message, .. }) => ClusterError::NotFound(message),
            kube::Error::Api(ErrorResponse { code: 403, message, .. }) => ClusterError::Forbidden(message),
            kube::Error::Api(ErrorResponse { code: 405, message, .. }) => ClusterError::MethodNotAllowed(message),
            kube::Error::Api(ErrorResponse { code: 503, message, .. }) => ClusterError::ServiceUnavailable(message),
            other => ClusterError::Other(other.to_string()),
        }
    }
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterError::NotFound(message) => write!(f, "Resource not found: {}", message),
            ClusterError::Forbidden(message) => write!(f, "Operation forbidden: {}", message),
            ClusterError::MethodNotAllowed(message) => write!(f, "Method not allowed: {}", message),
            ClusterError::ServiceUnavailable(message) => write!(f, "Service unavailable: {}", message),
            ClusterError::PartialDiscovery(details) => write!(f, "Partial discovery failure: {}", details),
            ClusterError::Timeout(message) => write!(f, "Operation timed out: {}", message),
            ClusterError::Other(message) => write!(f, "An error occurred: {}", message),
        }
    }
}

impl Error for ClusterError {}

impl From<PollError<ClusterError>> for ClusterError {
    fn from(error: PollError<ClusterError>) -> Self {
        match error {
            PollError::Attempt(e) => e,
            PollError::Timeout(timeout) => ClusterError::Timeout(format!("condition not met within {:?}", timeout)),
        }
    }
}
