use crate::configuration::models::test_context_settings::TestContextSettings;
use crate::services::backends::kubernetes::kube_cluster_client::KubeClusterClient;
use crate::services::backends::kubernetes::kubeconfig_loader;
use crate::services::base::cluster_client::ClusterClients;
use kube::Config;
use std::sync::Arc;

pub mod temp_namespace_context;

pub const KIND_KUBECONFIG_COMMAND: &str = "kind get kubeconfig --name kind";

/// COVERAGE: disabled since this is a testing helper
#[cfg_attr(coverage, coverage(off))]
pub async fn get_kubeconfig() -> anyhow::Result<Config> {
    kubeconfig_loader::from_command()
        .load(&KIND_KUBECONFIG_COMMAND.to_string())
        .await
}

#[cfg_attr(coverage, coverage(off))]
pub async fn kind_clients() -> anyhow::Result<ClusterClients> {
    let config = get_kubeconfig().await?;
    let client = Arc::new(KubeClusterClient::try_from_config(config)?);
    Ok(ClusterClients::new(client.clone()).with_dynamic_client(client))
}

/// Settings of cluster-backed tests, deletion deadline shortened for a local cluster.
pub fn kind_settings() -> Arc<TestContextSettings> {
    Arc::new(TestContextSettings {
        namespace_deletion_timeout: std::time::Duration::from_secs(2 * 60).into(),
        ..TestContextSettings::from_env()
    })
}
