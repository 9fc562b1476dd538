use crate::client::ControlPlane;
use crate::config::Config;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Fixed intervals used while observing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay between task state polls.
    pub poll_delay: Duration,
    /// Pause before the first log fetch so the log stream can be created.
    pub log_grace: Duration,
    /// Delay between log fetches.
    pub log_interval: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_secs(6),
            log_grace: Duration::from_secs(3),
            log_interval: Duration::from_secs(5),
        }
    }
}

/// Everything a run needs besides the user's options: where to run, the
/// client to run through, and how long to wait.
#[derive(Clone)]
pub struct RunContext {
    pub cluster: String,
    pub service: Option<String>,
    pub task_definition_path: Option<PathBuf>,
    pub service_definition_path: Option<PathBuf>,
    pub timeout: Duration,
    pub timing: Timing,
    pub client: Arc<dyn ControlPlane>,
    /// Upstream cancellation for the whole run.
    pub shutdown: CancellationToken,
}

impl RunContext {
    pub fn new(cluster: impl Into<String>, client: Arc<dyn ControlPlane>) -> Self {
        Self {
            cluster: cluster.into(),
            service: None,
            task_definition_path: None,
            service_definition_path: None,
            timeout: Duration::from_secs(600),
            timing: Timing::default(),
            client,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(config: &Config, client: Arc<dyn ControlPlane>) -> Self {
        Self {
            service: config.service.clone(),
            task_definition_path: config.task_definition.clone(),
            service_definition_path: config.service_definition.clone(),
            timeout: config.timeout(),
            ..Self::new(config.cluster.clone(), client)
        }
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_task_definition_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.task_definition_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("cluster", &self.cluster)
            .field("service", &self.service)
            .field("task_definition_path", &self.task_definition_path)
            .field("service_definition_path", &self.service_definition_path)
            .field("timeout", &self.timeout)
            .field("timing", &self.timing)
            .finish_non_exhaustive()
    }
}
