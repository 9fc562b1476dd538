//! The `run` command: resolve, submit, then observe.

use crate::context::RunContext;
use crate::definition::{read_definition_file, TaskOverride};
use crate::error::{Result, RunError};
use crate::observe::observe;
use crate::options::{OverrideSource, RunOptions, WaitMode};
use crate::resolve::{resolve, ResolvedTaskDefinition};
use crate::status::describe_task_status;
use crate::submit::{load_service, submit};
use chrono::Utc;
use tracing::{debug, info};

pub async fn run(ctx: &RunContext, options: &RunOptions) -> Result<()> {
    info!("Running task {}", options.dry_run_suffix());

    let overrides = load_overrides(&options.overrides)?;
    debug!(?overrides, "Overrides");

    let resolved = resolve(ctx, &options.selector, options.dry_run).await?;
    info!("Task definition ARN: {}", resolved);
    let reference = match resolved {
        ResolvedTaskDefinition::Live(reference) if !options.dry_run => reference,
        _ => {
            info!("DRY RUN OK");
            return Ok(());
        }
    };

    let definition = ctx
        .client
        .describe_task_definition(&reference)
        .await
        .map_err(RunError::Resolve)?;
    let watch = definition
        .watch_container(options.watch_container.as_deref())
        .cloned()
        .ok_or_else(|| RunError::WatchContainerNotFound {
            name: options.watch_container.clone().unwrap_or_default(),
        })?;
    info!("Watch container: {}", watch.name);

    let service = load_service(ctx).await?;
    let task = submit(ctx, &reference, &overrides, options, &service).await?;

    let until_running = match options.wait {
        WaitMode::NoWait => {
            info!("Run task invoked");
            return Ok(());
        }
        WaitMode::UntilRunning => true,
        WaitMode::UntilStopped => false,
    };

    observe(ctx, &task, &watch, Utc::now(), until_running).await?;
    describe_task_status(ctx, &task, &watch).await?;
    info!("Run task completed!");
    Ok(())
}

/// Parse the per-run overrides. An empty inline string means no overrides.
pub fn load_overrides(source: &OverrideSource) -> Result<TaskOverride> {
    match source {
        OverrideSource::None => Ok(TaskOverride::default()),
        OverrideSource::Inline(s) if s.trim().is_empty() => Ok(TaskOverride::default()),
        OverrideSource::Inline(s) => serde_json::from_str(s).map_err(RunError::InvalidOverrides),
        OverrideSource::File(path) => {
            read_definition_file(path).map_err(|source| RunError::OverridesFile {
                path: path.clone(),
                source,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn inline_overrides_parse() {
        let ov = load_overrides(&OverrideSource::Inline(
            r#"{"containerOverrides":[{"name":"app","command":["rake","db:migrate"]}]}"#.into(),
        ))
        .unwrap();
        assert_eq!(ov.container_overrides[0].name.as_deref(), Some("app"));
    }

    #[test]
    fn invalid_inline_overrides_are_input_errors() {
        let err = load_overrides(&OverrideSource::Inline("{oops".into())).unwrap_err();
        assert!(matches!(err, RunError::InvalidOverrides(_)));
        assert!(err.to_string().starts_with("invalid overrides"));
    }

    #[test]
    fn empty_inline_means_no_overrides() {
        assert!(load_overrides(&OverrideSource::Inline("  ".into()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_overrides_file_is_reported_with_path() {
        let err = load_overrides(&OverrideSource::File(PathBuf::from(
            "/nonexistent/overrides.json",
        )))
        .unwrap_err();
        assert!(err
            .to_string()
            .starts_with("failed to read overrides-file /nonexistent/overrides.json"));
    }
}
