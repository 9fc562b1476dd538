use ecsrun_awscli::AwsCliClient;
use ecsrun_core::config::Config;
use ecsrun_core::ControlPlane;
use std::sync::Arc;

/// Create the control-plane client for a config.
pub fn create_client(config: &Config) -> Arc<dyn ControlPlane> {
    Arc::new(AwsCliClient::new(config))
}
