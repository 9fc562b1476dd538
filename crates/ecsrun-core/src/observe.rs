//! Waits for a launched task and tails its logs in the meantime.
//!
//! The state-wait runs on the caller's task. When the watched container ships
//! its logs with `awslogs`, a second task polls the log stream on a child
//! cancellation token. The token is cancelled as soon as the state-wait
//! returns, whatever the outcome. Events that are not fetched by then are not
//! printed.

use crate::client::{ControlPlane, WaiterConfig};
use crate::context::RunContext;
use crate::definition::ContainerDefinition;
use crate::error::{ClientError, WaitError};
use crate::task::Task;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const AWSLOGS_DRIVER: &str = "awslogs";
const AWSLOGS_GROUP: &str = "awslogs-group";
const AWSLOGS_STREAM_PREFIX: &str = "awslogs-stream-prefix";

/// Log group and stream a container writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogTarget {
    pub group: String,
    pub stream: String,
}

/// Where `container` of `task` streams its logs, if it uses the `awslogs`
/// driver with a stream prefix.
pub fn log_target(task: &Task, container: &ContainerDefinition) -> Option<LogTarget> {
    let lc = container.log_configuration.as_ref()?;
    if lc.log_driver != AWSLOGS_DRIVER {
        return None;
    }
    let prefix = lc.options.get(AWSLOGS_STREAM_PREFIX)?;
    let group = lc.options.get(AWSLOGS_GROUP)?;
    Some(LogTarget {
        group: group.clone(),
        stream: format!("{}/{}/{}", prefix, container.name, task.id()),
    })
}

/// Number of state polls that fit in `timeout`, rounded up, plus one.
pub fn wait_attempts(timeout: Duration, delay: Duration) -> u32 {
    let timeout = timeout.as_nanos();
    let delay = delay.as_nanos().max(1);
    let mut attempts = timeout / delay + 1;
    if timeout % delay > 0 {
        attempts += 1;
    }
    u32::try_from(attempts).unwrap_or(u32::MAX)
}

/// Position in a log stream. Only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCursor {
    next_token: Option<String>,
    start_time: DateTime<Utc>,
}

impl LogCursor {
    pub fn new(start_time: DateTime<Utc>) -> Self {
        Self {
            next_token: None,
            start_time,
        }
    }

    /// Fetch and print events after the cursor. On error the cursor is left
    /// where it was.
    pub async fn fetch(
        &mut self,
        client: &dyn ControlPlane,
        target: &LogTarget,
    ) -> Result<usize, ClientError> {
        let page = client
            .get_log_events(
                &target.group,
                &target.stream,
                self.start_time,
                self.next_token.as_deref(),
            )
            .await?;
        for event in &page.events {
            match event.time() {
                Some(ts) => info!(target: "ecsrun::container", "{} {}", ts.to_rfc3339(), event.message),
                None => info!(target: "ecsrun::container", "{}", event.message),
            }
        }
        if page.next_forward_token.is_some() {
            self.next_token = page.next_forward_token;
        }
        Ok(page.events.len())
    }
}

pub async fn observe(
    ctx: &RunContext,
    task: &Task,
    watch: &ContainerDefinition,
    started_at: DateTime<Utc>,
    until_running: bool,
) -> Result<(), WaitError> {
    info!("Waiting for run task...(it may take a while)");

    let Some(target) = log_target(task, watch) else {
        info!("awslogs not configured");
        return wait_task(ctx, task, until_running).await;
    };

    info!("Watching container: {}", watch.name);
    debug!(group = %target.group, stream = %target.stream, "log stream");
    tokio::select! {
        biased;
        _ = ctx.shutdown.cancelled() => return Err(WaitError::Cancelled),
        _ = tokio::time::sleep(ctx.timing.log_grace) => {}
    }

    let tail = ctx.shutdown.child_token();
    let tailer = tokio::spawn(tail_logs(
        Arc::clone(&ctx.client),
        target,
        LogCursor::new(started_at),
        ctx.timing.log_interval,
        tail.clone(),
    ));

    let result = wait_task(ctx, task, until_running).await;
    tail.cancel();
    if let Err(e) = tailer.await {
        debug!(error = %e, "log tailer did not finish cleanly");
    }
    result
}

async fn tail_logs(
    client: Arc<dyn ControlPlane>,
    target: LogTarget,
    mut cursor: LogCursor,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            result = cursor.fetch(client.as_ref(), &target) => {
                if let Err(e) = result {
                    debug!(error = %e, stream = %target.stream, "failed to fetch log events");
                }
            }
        }
    }
}

async fn wait_task(ctx: &RunContext, task: &Task, until_running: bool) -> Result<(), WaitError> {
    let config = WaiterConfig {
        delay: ctx.timing.poll_delay,
        max_attempts: wait_attempts(ctx.timeout, ctx.timing.poll_delay),
    };
    let id = task.id();

    if until_running {
        info!("Waiting for task ID {} until running", id);
        ctx.client
            .wait_until_running(&ctx.cluster, &task.task_arn, config, &ctx.shutdown)
            .await?;
        info!("Task ID {} is running", id);
        return Ok(());
    }

    info!("Waiting for task ID {} until stopped", id);
    ctx.client
        .wait_until_stopped(&ctx.cluster, &task.task_arn, config, &ctx.shutdown)
        .await?;
    info!("Task ID {} is stopped", id);
    Ok(())
}
