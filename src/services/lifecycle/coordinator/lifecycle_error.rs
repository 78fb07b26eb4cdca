use crate::services::lifecycle::namespace_creator::CreateNamespaceError;
use crate::services::lifecycle::namespace_destroyer::deletion_error::NamespaceDeletionError;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum LifecycleError {
    /// Cluster clients could not be obtained from the settings
    Configuration(anyhow::Error),
    Creation(CreateNamespaceError),
    /// Namespaces of the test case that could not be deleted, keyed by name
    CleanupFailed(BTreeMap<String, NamespaceDeletionError>),
    /// The test body failed; cleanup failures of the same test case are kept alongside
    TestFailed {
        source: anyhow::Error,
        cleanup: Option<BTreeMap<String, NamespaceDeletionError>>,
    },
}

impl LifecycleError {
    /// Namespace deletion failures, whatever else went wrong.
    pub fn cleanup_failures(&self) -> Option<&BTreeMap<String, NamespaceDeletionError>> {
        match self {
            LifecycleError::CleanupFailed(failures) => Some(failures),
            LifecycleError::TestFailed { cleanup, .. } => cleanup.as_ref(),
            _ => None,
        }
    }
}

fn describe_failures(failures: &BTreeMap<String, NamespaceDeletionError>) -> String {
    failures
        .iter()
        .map(|(namespace, error)| format!("Couldn't delete ns: {:?}: {}", namespace, error))
        .collect::<Vec<_>>()
        .join(",")
}

impl Display for LifecycleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleError::Configuration(e) => write!(f, "failed to obtain cluster clients: {}", e),
            LifecycleError::Creation(e) => write!(f, "{}", e),
            LifecycleError::CleanupFailed(failures) => write!(f, "{}", describe_failures(failures)),
            LifecycleError::TestFailed { source, cleanup: None } => write!(f, "test failed: {}", source),
            LifecycleError::TestFailed {
                source,
                cleanup: Some(failures),
            } => write!(f, "test failed: {}; {}", source, describe_failures(failures)),
        }
    }
}

impl Error for LifecycleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            LifecycleError::Configuration(e) | LifecycleError::TestFailed { source: e, .. } => Some(&**e),
            LifecycleError::Creation(e) => Some(e),
            LifecycleError::CleanupFailed(_) => None,
        }
    }
}
