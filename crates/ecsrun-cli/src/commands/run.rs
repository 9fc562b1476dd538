use crate::dispatch;
use clap::Args;
use ecsrun_core::config::Config;
use ecsrun_core::tags::parse_tags;
use ecsrun_core::{
    OverrideSource, PropagateTags, RunContext, RunError, RunOptions, TaskDefinitionSelector,
    WaitMode,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Task definition file to register and run (defaults to the configured one)
    #[arg(long, value_name = "PATH")]
    pub task_def: Option<PathBuf>,

    /// Run an already registered revision without registering a new one
    #[arg(long)]
    pub skip_task_definition: bool,

    /// Run the latest registered revision of the family
    #[arg(long)]
    pub latest_task_definition: bool,

    /// Revision to run with --skip-task-definition / --latest-task-definition
    #[arg(long)]
    pub revision: Option<u32>,

    /// Resolve the task definition but do not run anything
    #[arg(long)]
    pub dry_run: bool,

    /// Return as soon as the task is submitted
    #[arg(long)]
    pub no_wait: bool,

    /// Lifecycle phase to wait for: running or stopped
    #[arg(long, default_value = "stopped", value_name = "PHASE")]
    pub wait_until: WaitMode,

    /// Task overrides as inline JSON
    #[arg(long, value_name = "JSON", conflicts_with = "overrides_file")]
    pub overrides: Option<String>,

    /// File with task overrides (JSON or YAML)
    #[arg(long, value_name = "PATH")]
    pub overrides_file: Option<PathBuf>,

    /// Number of tasks to start
    #[arg(long, default_value = "1")]
    pub count: u32,

    /// Tags for the task, e.g. KEY=VALUE,KEY2=VALUE2
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Tag propagation: SERVICE copies the service's tags, anything else is
    /// passed to RunTask as-is
    #[arg(long, default_value = "", value_name = "MODE")]
    pub propagate_tags: String,

    /// Container whose logs are streamed (defaults to the first container)
    #[arg(long, value_name = "NAME")]
    pub watch_container: Option<String>,
}

impl RunArgs {
    pub fn to_options(&self) -> Result<RunOptions, RunError> {
        let selector = if self.skip_task_definition {
            TaskDefinitionSelector::Skip {
                revision: self.revision,
            }
        } else if self.latest_task_definition {
            TaskDefinitionSelector::Latest {
                revision: self.revision,
            }
        } else {
            TaskDefinitionSelector::Register {
                path: self.task_def.clone(),
            }
        };

        let overrides = match (&self.overrides, &self.overrides_file) {
            (Some(inline), _) => OverrideSource::Inline(inline.clone()),
            (None, Some(path)) => OverrideSource::File(path.clone()),
            (None, None) => OverrideSource::None,
        };

        Ok(RunOptions {
            selector,
            overrides,
            count: self.count,
            tags: parse_tags(&self.tags).map_err(RunError::InvalidTags)?,
            propagate_tags: PropagateTags::parse(&self.propagate_tags),
            dry_run: self.dry_run,
            wait: if self.no_wait {
                WaitMode::NoWait
            } else {
                self.wait_until
            },
            watch_container: self.watch_container.clone(),
        })
    }
}

pub async fn run(config: &Config, args: &RunArgs) -> anyhow::Result<()> {
    let options = args.to_options()?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            signal.cancel();
        }
    });

    let ctx = RunContext::from_config(config, dispatch::create_client(config))
        .with_shutdown(shutdown);
    ecsrun_core::run(&ctx, &options).await?;
    Ok(())
}
