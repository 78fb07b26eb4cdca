
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;
use kube::discovery::ApiResource;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

pub const VERB_LIST: &str = "list";
pub const VERB_DELETE: &str = "delete";

/// A namespaced resource kind as reported by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ResourceKind {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub kind: String,
    pub verbs: BTreeSet<String>,
}

impl ResourceKind {
    pub fn new(group: &str, version: &str, resource: &str, kind: &str) -> Self {
        ResourceKind {
            group: group.to_string(),
            version: version.to_string(),
            resource: resource.to_string(),
            kind: kind.to_string(),
            verbs: BTreeSet::new(),
        }
    }

    pub fn with_verbs(mut self, verbs: &[&str]) -> Self {
        self.verbs = verbs.iter().map(|v| v.to_string()).collect();
        self
    }

    /// Builds a descriptor from one entry of an `APIResourceList` served for `group_version`.
    pub fn from_api_resource(group_version: &str, resource: &APIResource) -> Self {
        let (group, version) = match group_version.split_once('/') {
            Some((group, version)) => (group, version),
            None => ("", group_version),
        };
        ResourceKind {
            group: resource.group.clone().unwrap_or_else(|| group.to_string()),
            version: resource.version.clone().unwrap_or_else(|| version.to_string()),
            resource: resource.name.clone(),
            kind: resource.kind.clone(),
            verbs: resource.verbs.iter().cloned().collect(),
        }
    }

    pub fn supports(&self, verb: &str) -> bool {
        self.verbs.contains(verb)
    }

    /// Only kinds we can both enumerate and remove take part in drain checks.
    pub fn is_drainable(&self) -> bool {
        self.supports(VERB_LIST) && self.supports(VERB_DELETE)
    }

    pub fn is_subresource(&self) -> bool {
        self.resource.contains('/')
    }

    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }

    pub fn to_api_resource(&self) -> ApiResource {
        ApiResource {
            group: self.group.clone(),
            version: self.version.clone(),
            api_version: self.api_version(),
            kind: self.kind.clone(),
            plural: self.resource.clone(),
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, Resource={}", self.api_version(), self.resource)
    }
}
