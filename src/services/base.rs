pub mod cluster_client;
pub mod cluster_error;
pub mod polling;
pub mod resource_kind;
