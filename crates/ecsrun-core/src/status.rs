use crate::client::TasksOutput;
use crate::context::RunContext;
use crate::definition::ContainerDefinition;
use crate::error::{Result, RunError};
use crate::task::{Container, Task};
use tracing::{info, warn};

/// Read-only inspection after the wait: reports why the task stopped and fails
/// if the watched container exited non-zero.
pub async fn describe_task_status(
    ctx: &RunContext,
    task: &Task,
    watch: &ContainerDefinition,
) -> Result<()> {
    let out = ctx
        .client
        .describe_tasks(&ctx.cluster, std::slice::from_ref(&task.task_arn))
        .await
        .map_err(RunError::Status)?;
    check_task_status(&out, &watch.name)
}

pub fn check_task_status(out: &TasksOutput, watch_container: &str) -> Result<()> {
    if let Some(failure) = out.failures.first() {
        if let Some(arn) = &failure.arn {
            warn!("Task ARN: {}", arn);
        }
        return Err(RunError::TaskFailure {
            reason: failure.reason_or_unknown(),
        });
    }
    let Some(task) = out.tasks.first() else {
        return Err(RunError::NoTaskReturned);
    };

    if let Some(reason) = &task.stopped_reason {
        info!("Stopped reason: {}", reason);
    }
    let Some(container) = watched(task, watch_container) else {
        return Ok(());
    };
    if let Some(reason) = &container.reason {
        info!("Container reason: {}", reason);
    }
    match container.exit_code {
        Some(code) if code != 0 => {
            warn!("Exit Code: {}", code);
            Err(RunError::ExitCode(code))
        }
        _ => Ok(()),
    }
}

fn watched<'a>(task: &'a Task, name: &str) -> Option<&'a Container> {
    task.containers
        .iter()
        .find(|c| c.name == name)
        .or_else(|| task.containers.first())
}
