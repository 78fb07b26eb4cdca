pub mod coordinator;
pub mod discovery_cache;
pub mod drain_prober;
pub mod namespace_creator;
pub mod namespace_destroyer;
pub mod namespace_handle;
pub mod run_census;
pub mod run_id;

use std::time::Duration;

/// How often namespace, discovery and creation conditions are polled.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub const NAMESPACE_CREATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Service accounts are provisioned after namespace creation and admission
/// rejects pods until the default one exists.
pub const SERVICE_ACCOUNT_PROVISION_TIMEOUT: Duration = Duration::from_secs(2 * 60);

pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(30);
