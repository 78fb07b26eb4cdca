use crate::services::base::cluster_error::ClusterError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Subsystem most likely responsible for a namespace that outlived its deletion deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuspectedComponent {
    /// Namespace finalizer never ran although the namespace is empty
    NamespaceFinalizer,
    /// Namespace controller did not request deletion of the pods
    NamespaceController,
    /// Node agent did not terminate pods that were marked for deletion
    NodeAgent,
    /// Garbage collection of non-pod content is stuck
    GarbageCollector,
    Unknown,
}

impl Display for SuspectedComponent {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SuspectedComponent::NamespaceFinalizer => write!(f, "namespace finalizer"),
            SuspectedComponent::NamespaceController => write!(f, "namespace controller"),
            SuspectedComponent::NodeAgent => write!(f, "kubelet"),
            SuspectedComponent::GarbageCollector => write!(f, "garbage collector"),
            SuspectedComponent::Unknown => write!(f, "unknown"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceDeletionError {
    Delete {
        namespace: String,
        source: ClusterError,
    },
    EmptyButNotRemoved {
        namespace: String,
        timeout: Duration,
    },
    PodsNotMarkedForDeletion {
        namespace: String,
        timeout: Duration,
        remaining_pods: usize,
        missing_deletion_timestamp: usize,
    },
    PodsNotTerminated {
        namespace: String,
        timeout: Duration,
        remaining_pods: usize,
    },
    ContentRemains {
        namespace: String,
        timeout: Duration,
    },
    DiagnosisFailed {
        namespace: String,
        timeout: Duration,
        source: ClusterError,
    },
}

impl NamespaceDeletionError {
    pub fn namespace(&self) -> &str {
        match self {
            NamespaceDeletionError::Delete { namespace, .. }
            | NamespaceDeletionError::EmptyButNotRemoved { namespace, .. }
            | NamespaceDeletionError::PodsNotMarkedForDeletion { namespace, .. }
            | NamespaceDeletionError::PodsNotTerminated { namespace, .. }
            | NamespaceDeletionError::ContentRemains { namespace, .. }
            | NamespaceDeletionError::DiagnosisFailed { namespace, .. } => namespace,
        }
    }

    pub fn is_timeout(&self) -> bool {
        !matches!(self, NamespaceDeletionError::Delete { .. })
    }

    pub fn suspected_component(&self) -> SuspectedComponent {
        match self {
            NamespaceDeletionError::EmptyButNotRemoved { .. } => SuspectedComponent::NamespaceFinalizer,
            NamespaceDeletionError::PodsNotMarkedForDeletion { .. } => SuspectedComponent::NamespaceController,
            NamespaceDeletionError::PodsNotTerminated { .. } => SuspectedComponent::NodeAgent,
            NamespaceDeletionError::ContentRemains { .. } => SuspectedComponent::GarbageCollector,
            NamespaceDeletionError::Delete { .. } | NamespaceDeletionError::DiagnosisFailed { .. } => {
                SuspectedComponent::Unknown
            }
        }
    }
}

impl Display for NamespaceDeletionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NamespaceDeletionError::Delete { namespace, source } => {
                write!(f, "failed to delete namespace {}: {}", namespace, source)
            }
            NamespaceDeletionError::EmptyButNotRemoved { namespace, timeout } => write!(
                f,
                "namespace {} was not deleted within {:?}, namespace is empty but is not yet removed",
                namespace, timeout
            ),
            NamespaceDeletionError::PodsNotMarkedForDeletion {
                namespace,
                timeout,
                remaining_pods,
                missing_deletion_timestamp,
            } => write!(
                f,
                "namespace {} was not deleted within {:?}, pods remaining: {}, pods missing deletion timestamp: {}",
                namespace, timeout, remaining_pods, missing_deletion_timestamp
            ),
            NamespaceDeletionError::PodsNotTerminated {
                namespace,
                timeout,
                remaining_pods,
            } => write!(
                f,
                "namespace {} was not deleted within {:?}, pods remaining: {}",
                namespace, timeout, remaining_pods
            ),
            NamespaceDeletionError::ContentRemains { namespace, timeout } => write!(
                f,
                "namespace {} was not deleted within {:?}, namespaced content other than pods remains",
                namespace, timeout
            ),
            NamespaceDeletionError::DiagnosisFailed {
                namespace,
                timeout,
                source,
            } => write!(
                f,
                "namespace {} was not deleted within {:?} and its content could not be inspected: {}",
                namespace, timeout, source
            ),
        }
    }
}

impl Error for NamespaceDeletionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            NamespaceDeletionError::Delete { source, .. } | NamespaceDeletionError::DiagnosisFailed { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}
