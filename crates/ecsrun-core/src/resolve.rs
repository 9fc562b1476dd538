//! Decides which task definition revision a run executes.

use crate::context::RunContext;
use crate::definition::{load_task_definition, TaskDefinition};
use crate::error::{Result, RunError};
use crate::options::TaskDefinitionSelector;
use crate::task::{arn_to_name, TaskReference};
use std::fmt;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTaskDefinition {
    /// A revision that exists remotely.
    Live(TaskReference),
    /// Dry-run only: the family that would have been registered.
    WouldRegister { family: String },
}

impl ResolvedTaskDefinition {
    pub fn reference(&self) -> Option<&TaskReference> {
        match self {
            ResolvedTaskDefinition::Live(reference) => Some(reference),
            ResolvedTaskDefinition::WouldRegister { .. } => None,
        }
    }
}

impl fmt::Display for ResolvedTaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedTaskDefinition::Live(reference) => write!(f, "{}", reference),
            ResolvedTaskDefinition::WouldRegister { family } => {
                write!(f, "family {} will be registered", family)
            }
        }
    }
}

pub async fn resolve(
    ctx: &RunContext,
    selector: &TaskDefinitionSelector,
    dry_run: bool,
) -> Result<ResolvedTaskDefinition> {
    match selector {
        TaskDefinitionSelector::Skip { revision } | TaskDefinitionSelector::Latest { revision } => {
            let family = family_for_run(ctx).await?;
            if let Some(revision) = revision.filter(|r| *r > 0) {
                return Ok(ResolvedTaskDefinition::Live(TaskReference::from_parts(
                    &family, revision,
                )));
            }
            info!(
                "Revision is not specified. Use latest task definition family {}",
                family
            );
            latest_task_definition(ctx, &family)
                .await
                .map(ResolvedTaskDefinition::Live)
        }
        TaskDefinitionSelector::Register { path } => {
            let path = path
                .as_deref()
                .or(ctx.task_definition_path.as_deref())
                .ok_or(RunError::MissingTaskDefinition)?;
            let definition = load_task_definition(path)?;
            if dry_run {
                return Ok(ResolvedTaskDefinition::WouldRegister {
                    family: definition.family,
                });
            }
            info!("Registering a new task definition for family {}", definition.family);
            let registered = ctx
                .client
                .register_task_definition(&definition)
                .await
                .map_err(RunError::Resolve)?;
            registered_reference(&registered)
                .map(ResolvedTaskDefinition::Live)
                .ok_or(RunError::NoRevisions {
                    family: definition.family,
                })
        }
    }
}

/// Family of the running service's task definition, or of the local one when
/// no service is configured. The service's own revision is ignored.
async fn family_for_run(ctx: &RunContext) -> Result<String> {
    if let Some(service) = &ctx.service {
        let sv = ctx
            .client
            .describe_service(&ctx.cluster, service)
            .await
            .map_err(RunError::Resolve)?;
        let arn = sv.task_definition.ok_or(RunError::MissingFamily)?;
        let name = arn_to_name(&arn);
        let family = name.split_once(':').map_or(name, |(family, _)| family);
        return Ok(family.to_string());
    }
    let path = ctx
        .task_definition_path
        .as_deref()
        .ok_or(RunError::MissingFamily)?;
    Ok(load_task_definition(path)?.family)
}

async fn latest_task_definition(ctx: &RunContext, family: &str) -> Result<TaskReference> {
    let arns = ctx
        .client
        .list_task_definitions(family)
        .await
        .map_err(RunError::Resolve)?;
    latest_revision(family, arns).ok_or_else(|| RunError::NoRevisions {
        family: family.to_string(),
    })
}

/// The reference with the numerically highest revision in `family`.
pub fn latest_revision(
    family: &str,
    arns: impl IntoIterator<Item = String>,
) -> Option<TaskReference> {
    arns.into_iter()
        .filter_map(TaskReference::new)
        .filter(|r| r.family() == family)
        .filter_map(|r| r.revision().map(|rev| (rev, r)))
        .max_by_key(|(rev, _)| *rev)
        .map(|(_, r)| r)
}

fn registered_reference(td: &TaskDefinition) -> Option<TaskReference> {
    td.task_definition_arn
        .clone()
        .and_then(TaskReference::new)
        .or_else(|| td.revision.map(|rev| TaskReference::from_parts(&td.family, rev)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arn(family: &str, rev: u32) -> String {
        format!(
            "arn:aws:ecs:us-east-1:123456789012:task-definition/{}:{}",
            family, rev
        )
    }

    #[test]
    fn latest_revision_is_numeric_max() {
        let arns = vec![arn("app", 9), arn("app", 10), arn("app", 2)];
        let latest = latest_revision("app", arns).unwrap();
        assert_eq!(latest.as_str(), arn("app", 10));
    }

    #[test]
    fn latest_revision_ignores_other_families() {
        let arns = vec![arn("app", 3), arn("app-worker", 50)];
        assert_eq!(latest_revision("app", arns).unwrap().revision(), Some(3));
        assert!(latest_revision("db", vec![arn("app", 1)]).is_none());
        assert!(latest_revision("app", Vec::new()).is_none());
    }

    #[test]
    fn display_for_dry_run() {
        let r = ResolvedTaskDefinition::WouldRegister {
            family: "batch".into(),
        };
        assert_eq!(r.to_string(), "family batch will be registered");
        assert!(r.reference().is_none());
    }
}
