use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a task definition revision: `family:revision` or a full ARN.
/// Never empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskReference(String);

impl TaskReference {
    pub fn new(s: impl Into<String>) -> Option<Self> {
        let s = s.into();
        if s.trim().is_empty() {
            None
        } else {
            Some(Self(s))
        }
    }

    pub fn from_parts(family: &str, revision: u32) -> Self {
        Self(format!("{}:{}", family, revision))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family part of the reference, without the revision.
    pub fn family(&self) -> &str {
        let name = arn_to_name(&self.0);
        name.split_once(':').map_or(name, |(family, _)| family)
    }

    /// Revision part of the reference, if it carries one.
    pub fn revision(&self) -> Option<u32> {
        arn_to_name(&self.0)
            .split_once(':')
            .and_then(|(_, rev)| rev.parse().ok())
    }
}

impl fmt::Display for TaskReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last segment of an ARN, e.g. `app:3` for a task definition ARN or the task
/// ID for a task ARN. Non-ARN input is returned as-is.
pub fn arn_to_name(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Provisioning,
    Pending,
    Activating,
    Running,
    Deactivating,
    Stopping,
    Deprovisioning,
    Stopped,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Provisioning => write!(f, "PROVISIONING"),
            TaskStatus::Pending => write!(f, "PENDING"),
            TaskStatus::Activating => write!(f, "ACTIVATING"),
            TaskStatus::Running => write!(f, "RUNNING"),
            TaskStatus::Deactivating => write!(f, "DEACTIVATING"),
            TaskStatus::Stopping => write!(f, "STOPPING"),
            TaskStatus::Deprovisioning => write!(f, "DEPROVISIONING"),
            TaskStatus::Stopped => write!(f, "STOPPED"),
            TaskStatus::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A task as returned by `RunTask` / `DescribeTasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_arn: String,
    #[serde(default)]
    pub task_definition_arn: Option<String>,
    #[serde(default)]
    pub cluster_arn: Option<String>,
    #[serde(default)]
    pub last_status: Option<TaskStatus>,
    #[serde(default)]
    pub desired_status: Option<TaskStatus>,
    #[serde(default)]
    pub stopped_reason: Option<String>,
    #[serde(default)]
    pub containers: Vec<Container>,
}

impl Task {
    /// Short task ID (last ARN segment).
    pub fn id(&self) -> &str {
        arn_to_name(&self.task_arn)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub name: String,
    #[serde(default)]
    pub container_arn: Option<String>,
    #[serde(default)]
    pub last_status: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Per-task failure reported by `RunTask` / `DescribeTasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Failure {
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

impl Failure {
    pub fn reason_or_unknown(&self) -> String {
        self.reason.clone().unwrap_or_else(|| "unknown failure".to_string())
    }
}
