//! Fixed-delay task waiters built on `describe_tasks`.
//!
//! Acceptors follow the ECS `TasksRunning` / `TasksStopped` waiters:
//! running fails as soon as any task is STOPPED or reported MISSING, and
//! succeeds once every task is RUNNING. Stopped succeeds once every task is
//! STOPPED. The first poll is immediate.

use crate::client::{ControlPlane, TasksOutput, WaiterConfig};
use crate::error::WaitError;
use crate::task::TaskStatus;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    Running,
    Stopped,
}

#[derive(Debug)]
enum Acceptor {
    Success,
    Retry,
    Failure(WaitError),
}

fn evaluate(out: &TasksOutput, target: WaitTarget) -> Acceptor {
    let all = |status: TaskStatus| {
        !out.tasks.is_empty() && out.tasks.iter().all(|t| t.last_status == Some(status))
    };

    match target {
        WaitTarget::Running => {
            if let Some(task) = out
                .tasks
                .iter()
                .find(|t| t.last_status == Some(TaskStatus::Stopped))
            {
                return Acceptor::Failure(WaitError::Terminal {
                    arn: task.task_arn.clone(),
                    status: TaskStatus::Stopped.to_string(),
                    reason: task.stopped_reason.clone().unwrap_or_default(),
                });
            }
            if let Some(failure) = out
                .failures
                .iter()
                .find(|f| f.reason.as_deref() == Some("MISSING"))
            {
                return Acceptor::Failure(WaitError::Terminal {
                    arn: failure.arn.clone().unwrap_or_default(),
                    status: "MISSING".to_string(),
                    reason: failure.detail.clone().unwrap_or_default(),
                });
            }
            if all(TaskStatus::Running) {
                Acceptor::Success
            } else {
                Acceptor::Retry
            }
        }
        WaitTarget::Stopped => {
            if all(TaskStatus::Stopped) {
                Acceptor::Success
            } else {
                Acceptor::Retry
            }
        }
    }
}

/// Poll `task_arn` until it reaches `target`, for at most `config.max_attempts`
/// polls `config.delay` apart.
pub async fn wait_for_tasks<C: ControlPlane + ?Sized>(
    client: &C,
    cluster: &str,
    task_arn: &str,
    target: WaitTarget,
    config: WaiterConfig,
    cancel: &CancellationToken,
) -> Result<(), WaitError> {
    let arns = [task_arn.to_string()];
    for attempt in 1..=config.max_attempts {
        let out = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WaitError::Cancelled),
            out = client.describe_tasks(cluster, &arns) => out?,
        };
        match evaluate(&out, target) {
            Acceptor::Success => return Ok(()),
            Acceptor::Failure(e) => return Err(e),
            Acceptor::Retry => {
                debug!(attempt, max_attempts = config.max_attempts, ?target, "task not ready");
            }
        }
        if attempt < config.max_attempts {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(WaitError::Cancelled),
                _ = tokio::time::sleep(config.delay) => {}
            }
        }
    }
    Err(WaitError::Timeout {
        attempts: config.max_attempts,
    })
}
