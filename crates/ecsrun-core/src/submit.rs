//! Builds and sends the single `RunTask` request.

use crate::client::RunTaskInput;
use crate::context::RunContext;
use crate::definition::{load_service_definition, ServiceDefinition, TaskOverride};
use crate::error::{Result, RunError};
use crate::options::{PropagateTags, RunOptions};
use crate::tags::Tag;
use crate::task::{Task, TaskReference};
use tracing::{debug, info, warn};

/// Service settings the task inherits: the local service definition when one
/// is configured, the live service otherwise, or nothing for a standalone task.
pub async fn load_service(ctx: &RunContext) -> Result<ServiceDefinition> {
    if let Some(path) = &ctx.service_definition_path {
        return Ok(load_service_definition(path)?);
    }
    match &ctx.service {
        Some(service) => ctx
            .client
            .describe_service(&ctx.cluster, service)
            .await
            .map_err(RunError::Submit),
        None => Ok(ServiceDefinition::default()),
    }
}

/// `RunTask` body with placement, networking and capacity settings copied
/// verbatim from `service`. Tag propagation is applied by [`submit`].
pub fn build_run_task_input(
    cluster: &str,
    reference: &TaskReference,
    overrides: &TaskOverride,
    count: u32,
    tags: &[Tag],
    service: &ServiceDefinition,
) -> RunTaskInput {
    RunTaskInput {
        cluster: cluster.to_string(),
        task_definition: reference.to_string(),
        count,
        overrides: overrides.clone(),
        tags: tags.to_vec(),
        propagate_tags: None,
        launch_type: service.launch_type.clone(),
        network_configuration: service.network_configuration.clone(),
        capacity_provider_strategy: service.capacity_provider_strategy.clone(),
        placement_constraints: service.placement_constraints.clone(),
        placement_strategy: service.placement_strategy.clone(),
        platform_version: service.platform_version.clone(),
        enable_ecs_managed_tags: service.enable_ecs_managed_tags,
        enable_execute_command: service.enable_execute_command,
    }
}

pub async fn submit(
    ctx: &RunContext,
    reference: &TaskReference,
    overrides: &TaskOverride,
    options: &RunOptions,
    service: &ServiceDefinition,
) -> Result<Task> {
    info!("Running task with {}", reference);

    let mut input = build_run_task_input(
        &ctx.cluster,
        reference,
        overrides,
        options.count,
        &options.tags,
        service,
    );

    match &options.propagate_tags {
        PropagateTags::Service => {
            let service_arn = service_arn(ctx, service).await?;
            let tags = ctx
                .client
                .list_tags_for_resource(&service_arn)
                .await
                .map_err(RunError::Submit)?;
            debug!(service_arn = %service_arn, ?tags, "propagate tags from service");
            input.tags.extend(tags);
        }
        PropagateTags::None => input.propagate_tags = None,
        PropagateTags::Passthrough(mode) => input.propagate_tags = Some(mode.clone()),
    }
    debug!(?input, "run task input");

    let out = ctx.client.run_task(&input).await.map_err(RunError::Submit)?;
    if let Some(failure) = out.failures.first() {
        if let Some(arn) = &failure.arn {
            warn!("Task ARN: {}", arn);
        }
        return Err(RunError::TaskFailure {
            reason: failure.reason_or_unknown(),
        });
    }

    let task = out.tasks.into_iter().next().ok_or(RunError::NoTaskReturned)?;
    info!("Task ARN: {}", task.task_arn);
    Ok(task)
}

async fn service_arn(ctx: &RunContext, service: &ServiceDefinition) -> Result<String> {
    if let Some(arn) = &service.service_arn {
        return Ok(arn.clone());
    }
    let name = ctx.service.as_deref().ok_or(RunError::MissingServiceArn)?;
    ctx.client
        .describe_service(&ctx.cluster, name)
        .await
        .map_err(RunError::Submit)?
        .service_arn
        .ok_or(RunError::MissingServiceArn)
}
