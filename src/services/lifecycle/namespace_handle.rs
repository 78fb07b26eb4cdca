
use anyhow::anyhow;
use k8s_openapi::api::core::v1::Namespace;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespacePhase {
    Active,
    Terminating,
}

/// Local view of a namespace created for a test. The cluster owns the authoritative copy.
#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceHandle {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    pub created: Option<Time>,
    pub deletion_timestamp: Option<Time>,
    pub phase: NamespacePhase,
}

impl NamespaceHandle {
    pub fn is_terminating(&self) -> bool {
        self.phase == NamespacePhase::Terminating
    }
}

impl TryFrom<&Namespace> for NamespaceHandle {
    type Error = anyhow::Error;

    fn try_from(namespace: &Namespace) -> Result<Self, Self::Error> {
        let metadata = &namespace.metadata;
        let name = metadata
            .name
            .clone()
            .ok_or_else(|| anyhow!("Namespace returned by the cluster has no name"))?;
        let status_phase = namespace.status.as_ref().and_then(|status| status.phase.as_deref());
        let phase = match (status_phase, &metadata.deletion_timestamp) {
            (Some("Terminating"), _) | (_, Some(_)) => NamespacePhase::Terminating,
            _ => NamespacePhase::Active,
        };
        Ok(NamespaceHandle {
            name,
            labels: metadata.labels.clone().unwrap_or_default(),
            created: metadata.creation_timestamp.clone(),
            deletion_timestamp: metadata.deletion_timestamp.clone(),
            phase,
        })
    }
}
