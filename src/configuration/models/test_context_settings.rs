
use anyhow::Context;
use duration_string::DurationString;
use log::{debug, info};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_REPORT_DIR: &str = "reports";
pub const DEFAULT_NAMESPACE_DELETION_TIMEOUT: Duration = Duration::from_secs(5 * 60);
pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Process-wide settings of a test run. Loaded once and shared read-only afterwards.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestContextSettings {
    /// Path to the kubeconfig file, in-cluster configuration is used when absent
    pub kubeconfig: Option<String>,
    pub kube_context: Option<String>,
    /// Overrides the API server URL taken from the kubeconfig
    pub host: Option<String>,
    pub delete_namespace: bool,
    pub delete_namespace_on_failure: bool,
    pub report_dir: String,
    pub namespace_deletion_timeout: DurationString,
    pub log_filter: String,
}

impl Default for TestContextSettings {
    fn default() -> Self {
        TestContextSettings {
            kubeconfig: None,
            kube_context: None,
            host: None,
            delete_namespace: true,
            delete_namespace_on_failure: true,
            report_dir: DEFAULT_REPORT_DIR.to_string(),
            namespace_deletion_timeout: DEFAULT_NAMESPACE_DELETION_TIMEOUT.into(),
            log_filter: "info".to_string(),
        }
    }
}

impl TestContextSettings {
    pub fn from_yaml_str(source: &str) -> anyhow::Result<Self> {
        let settings: TestContextSettings = serde_yml::from_str(source).context("Failed to parse test settings")?;
        Ok(settings)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        info!("Loading test settings from {:?}", path);
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read test settings from {:?}", path))?;
        Self::from_yaml_str(&content)
    }

    /// Default settings with the kubeconfig path taken from `KUBECONFIG`.
    pub fn from_env() -> Self {
        let kubeconfig = std::env::var(KUBECONFIG_ENV).ok().filter(|value| !value.is_empty());
        debug!("Using kubeconfig from environment: {:?}", kubeconfig);
        TestContextSettings {
            kubeconfig,
            ..Default::default()
        }
    }

    pub fn namespace_deletion_timeout(&self) -> Duration {
        Duration::from(self.namespace_deletion_timeout)
    }

    /// Creates the report directory. An existing directory is fine.
    pub fn ensure_report_dir(&self) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.report_dir)
            .with_context(|| format!("Failed to create report directory {}", self.report_dir))
    }
}
