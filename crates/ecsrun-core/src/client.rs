use crate::definition::{ServiceDefinition, TaskDefinition, TaskOverride};
use crate::error::{ClientError, WaitError};
use crate::tags::Tag;
use crate::task::{Failure, Task, TaskReference};
use crate::waiter::{self, WaitTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Body of a `RunTask` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunTaskInput {
    pub cluster: String,
    pub task_definition: String,
    pub count: u32,
    #[serde(default, skip_serializing_if = "TaskOverride::is_empty")]
    pub overrides: TaskOverride,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagate_tags: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_configuration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity_provider_strategy: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_constraints: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placement_strategy: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(
        default,
        rename = "enableECSManagedTags",
        skip_serializing_if = "Option::is_none"
    )]
    pub enable_ecs_managed_tags: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_execute_command: Option<bool>,
}

/// Tasks plus per-task failures, as returned by `RunTask` and `DescribeTasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TasksOutput {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub failures: Vec<Failure>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub timestamp: i64,
    pub message: String,
    #[serde(default)]
    pub ingestion_time: Option<i64>,
}

impl LogEvent {
    pub fn time(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogEventsPage {
    #[serde(default)]
    pub events: Vec<LogEvent>,
    #[serde(default)]
    pub next_forward_token: Option<String>,
}

/// Fixed-delay polling budget for the task waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaiterConfig {
    pub delay: Duration,
    pub max_attempts: u32,
}

/// The remote container-orchestration control plane.
///
/// Every call may fail with a transport or service error; callers treat those
/// as terminal. The waiters have default implementations that poll
/// `describe_tasks`.
#[async_trait::async_trait]
pub trait ControlPlane: Send + Sync {
    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceDefinition, ClientError>;

    async fn describe_task_definition(
        &self,
        reference: &TaskReference,
    ) -> Result<TaskDefinition, ClientError>;

    /// ARNs of the active revisions registered under `family`.
    async fn list_task_definitions(&self, family: &str) -> Result<Vec<String>, ClientError>;

    async fn list_tags_for_resource(&self, arn: &str) -> Result<Vec<Tag>, ClientError>;

    async fn run_task(&self, input: &RunTaskInput) -> Result<TasksOutput, ClientError>;

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: &[String],
    ) -> Result<TasksOutput, ClientError>;

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<TaskDefinition, ClientError>;

    /// Events of one log stream newer than `start_time`, continuing from
    /// `next_token` when given.
    async fn get_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: DateTime<Utc>,
        next_token: Option<&str>,
    ) -> Result<LogEventsPage, ClientError>;

    async fn wait_until_running(
        &self,
        cluster: &str,
        task_arn: &str,
        config: WaiterConfig,
        cancel: &CancellationToken,
    ) -> Result<(), WaitError> {
        waiter::wait_for_tasks(self, cluster, task_arn, WaitTarget::Running, config, cancel).await
    }

    async fn wait_until_stopped(
        &self,
        cluster: &str,
        task_arn: &str,
        config: WaiterConfig,
        cancel: &CancellationToken,
    ) -> Result<(), WaitError> {
        waiter::wait_for_tasks(self, cluster, task_arn, WaitTarget::Stopped, config, cancel).await
    }
}
