#[cfg(test)]
mod tests;

use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Label carrying the run identifier on every namespace of a test run.
pub const RUN_ID_LABEL: &str = "e2e-run";

/// Identifies one invocation of the test process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(Uuid);

impl RunId {
    pub fn generate() -> Self {
        RunId(Uuid::new_v4())
    }

    /// First eight hex digits, short enough to embed in namespace names.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }

    /// Label selector matching every namespace created by this run.
    pub fn label_selector(&self) -> String {
        format!("{}={}", RUN_ID_LABEL, self)
    }
}

impl From<Uuid> for RunId {
    fn from(value: Uuid) -> Self {
        RunId(value)
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
