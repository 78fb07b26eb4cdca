/// A single test case as seen by the coordinator hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Used as the base of generated namespace names, must be a valid DNS label prefix
    pub name: String,
    pub skip_namespace_creation: bool,
}

impl TestCase {
    pub fn new(name: impl Into<String>) -> Self {
        TestCase {
            name: name.into(),
            skip_namespace_creation: false,
        }
    }

    pub fn without_namespace(mut self) -> Self {
        self.skip_namespace_creation = true;
        self
    }
}
