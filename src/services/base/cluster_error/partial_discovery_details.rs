use crate::services::base::resource_kind::ResourceKind;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Outcome of a discovery round where some API groups answered and others did not.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialDiscoveryDetails {
    pub failed_groups: BTreeMap<String, String>,
    pub discovered: Vec<ResourceKind>,
}

impl PartialDiscoveryDetails {
    pub fn new(failed_groups: BTreeMap<String, String>, discovered: Vec<ResourceKind>) -> Self {
        PartialDiscoveryDetails {
            failed_groups,
            discovered,
        }
    }
}

impl Display for PartialDiscoveryDetails {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let groups = self
            .failed_groups
            .iter()
            .map(|(group, cause)| format!("{}: {}", group, cause))
            .collect::<Vec<_>>()
            .join("; ");
        write!(
            f,
            "unable to retrieve the complete list of server APIs ({} kinds discovered), failed groups: [{}]",
            self.discovered.len(),
            groups
        )
    }
}
