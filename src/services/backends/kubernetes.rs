
pub mod kube_cluster_client;
pub mod kubeconfig_loader;
