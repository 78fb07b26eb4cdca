use crate::configuration::models::test_context_settings::TestContextSettings;
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use kube::Config;
use kube::config::{KubeConfigOptions, Kubeconfig};
use log::{debug, info};
use serde_yml::from_str;
use std::process::Command;
use std::sync::Arc;

/// Location of a kubeconfig file and the context to select from it.
#[derive(Debug, Clone)]
pub struct KubeConfigFile {
    pub path: String,
    pub context: Option<String>,
}

pub fn from_command() -> Arc<dyn KubeConfigLoader<ConfigSource = String>> {
    Arc::new(ExecutableKubeConfigLoader)
}

pub fn from_file() -> Arc<dyn KubeConfigLoader<ConfigSource = KubeConfigFile>> {
    Arc::new(FileKubeConfigLoader)
}

pub fn from_cluster() -> Arc<dyn ParameterLessConfigLoader> {
    Arc::new(InClusterKubeConfigLoader)
}

/// Resolves the client configuration of a test run.
///
/// A configured kubeconfig path wins, otherwise the in-cluster configuration is tried.
/// `host` replaces the API server URL in both cases.
pub async fn from_settings(settings: &TestContextSettings) -> anyhow::Result<Config> {
    let mut config = match &settings.kubeconfig {
        Some(path) => {
            let source = KubeConfigFile {
                path: path.clone(),
                context: settings.kube_context.clone(),
            };
            from_file().load(&source).await?
        }
        None => from_cluster()
            .load()
            .map_err(|e| anyhow!("kubeconfig must be specified to load client config: {}", e))?,
    };
    if let Some(host) = &settings.host {
        info!("Overriding API server URL with {}", host);
        config.cluster_url = host.parse()?;
    }
    Ok(config)
}

#[async_trait]
pub trait KubeConfigLoader: Send + Sync {
    type ConfigSource;
    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config>;
}

pub trait ParameterLessConfigLoader {
    fn load(&self) -> anyhow::Result<Config>;
}

struct ExecutableKubeConfigLoader;

#[async_trait]
impl KubeConfigLoader for ExecutableKubeConfigLoader {
    type ConfigSource = String;

    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config> {
        info!("Obtaining kubeconfig from command: {:?}", source);
        let output = Command::new("sh").arg("-c").arg(source).output()?;
        if !output.status.success() {
            bail!(
                "Failed to execute command: {:?}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        let kubeconfig_string = String::from_utf8(output.stdout)?;
        let kubeconfig: Kubeconfig = from_str(&kubeconfig_string)?;
        Ok(Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default()).await?)
    }
}

struct FileKubeConfigLoader;

#[async_trait]
impl KubeConfigLoader for FileKubeConfigLoader {
    type ConfigSource = KubeConfigFile;

    async fn load(&self, source: &Self::ConfigSource) -> anyhow::Result<Config> {
        info!(">>> kubeConfig: {}", source.path);
        let kubeconfig_string = std::fs::read_to_string(&source.path)
            .map_err(|e| anyhow!("error loading KubeConfig {}: {}", source.path, e))?;
        let kubeconfig: Kubeconfig = from_str(&kubeconfig_string)?;
        if let Some(context) = &source.context {
            debug!(">>> kubeContext: {}", context);
        }
        let options = KubeConfigOptions {
            context: source.context.clone(),
            ..Default::default()
        };
        Ok(Config::from_custom_kubeconfig(kubeconfig, &options).await?)
    }
}

struct InClusterKubeConfigLoader;

impl ParameterLessConfigLoader for InClusterKubeConfigLoader {
    fn load(&self) -> anyhow::Result<Config> {
        info!("Loading in-cluster Kubernetes configuration");
        let config = Config::incluster()?;
        Ok(config)
    }
}
