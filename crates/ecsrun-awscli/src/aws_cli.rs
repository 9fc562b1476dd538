use chrono::{DateTime, Utc};
use ecsrun_core::client::{ControlPlane, LogEventsPage, RunTaskInput, TasksOutput};
use ecsrun_core::config::Config;
use ecsrun_core::definition::{ServiceDefinition, TaskDefinition};
use ecsrun_core::error::ClientError;
use ecsrun_core::tags::Tag;
use ecsrun_core::task::{Failure, TaskReference};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

/// Control plane backed by the `aws` command line tool.
pub struct AwsCliClient {
    binary: String,
    region: Option<String>,
    profile: Option<String>,
}

#[derive(Deserialize)]
struct DescribeServicesOutput {
    #[serde(default)]
    services: Vec<ServiceDefinition>,
    #[serde(default)]
    failures: Vec<Failure>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskDefinitionOutput {
    task_definition: TaskDefinition,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListTaskDefinitionsOutput {
    #[serde(default)]
    task_definition_arns: Vec<String>,
}

#[derive(Deserialize)]
struct ListTagsOutput {
    #[serde(default)]
    tags: Vec<Tag>,
}

impl AwsCliClient {
    pub fn new(config: &Config) -> Self {
        Self {
            binary: config.aws_cli.clone().unwrap_or_else(|| "aws".to_string()),
            region: config.region.clone(),
            profile: config.profile.clone(),
        }
    }

    /// Full argument list for one call: global flags first, then the
    /// operation and its arguments.
    fn command_args(&self, service: &str, op: &str, args: &[String]) -> Vec<String> {
        let mut full = Vec::with_capacity(args.len() + 8);
        if let Some(region) = &self.region {
            full.push("--region".to_string());
            full.push(region.clone());
        }
        if let Some(profile) = &self.profile {
            full.push("--profile".to_string());
            full.push(profile.clone());
        }
        full.push("--output".to_string());
        full.push("json".to_string());
        full.push(service.to_string());
        full.push(op.to_string());
        full.extend(args.iter().cloned());
        full
    }

    /// Run `aws <service> <op> ...` and decode its JSON stdout.
    async fn call<T: DeserializeOwned>(
        &self,
        service: &str,
        op: &str,
        args: Vec<String>,
    ) -> Result<T, ClientError> {
        let full = self.command_args(service, op, &args);
        debug!("Running: {} {} {}", self.binary, service, op);

        let output = Command::new(&self.binary).args(&full).output().await?;
        let op_name = format!("{} {}", service, op);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ClientError::Command {
                op: op_name,
                message: stderr.trim().to_string(),
            });
        }
        decode(&op_name, &output.stdout)
    }
}

fn decode<T: DeserializeOwned>(op: &str, stdout: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(stdout).map_err(|source| ClientError::Decode {
        op: op.to_string(),
        source,
    })
}

fn json_arg<T: serde::Serialize>(op: &str, value: &T) -> Result<String, ClientError> {
    serde_json::to_string(value).map_err(|source| ClientError::Decode {
        op: op.to_string(),
        source,
    })
}

fn first_service(out: DescribeServicesOutput, name: &str) -> Result<ServiceDefinition, ClientError> {
    if let Some(failure) = out.failures.first() {
        return Err(ClientError::Command {
            op: "ecs describe-services".to_string(),
            message: format!("{}: {}", name, failure.reason_or_unknown()),
        });
    }
    out.services
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::NotFound(format!("service {}", name)))
}

fn log_events_args(
    group: &str,
    stream: &str,
    start_time: DateTime<Utc>,
    next_token: Option<&str>,
) -> Vec<String> {
    let mut args = vec![
        "--log-group-name".to_string(),
        group.to_string(),
        "--log-stream-name".to_string(),
        stream.to_string(),
        "--start-from-head".to_string(),
        "--start-time".to_string(),
        start_time.timestamp_millis().to_string(),
    ];
    if let Some(token) = next_token {
        args.push("--next-token".to_string());
        args.push(token.to_string());
    }
    args
}

#[async_trait::async_trait]
impl ControlPlane for AwsCliClient {
    async fn describe_service(
        &self,
        cluster: &str,
        service: &str,
    ) -> Result<ServiceDefinition, ClientError> {
        let out: DescribeServicesOutput = self
            .call(
                "ecs",
                "describe-services",
                vec![
                    "--cluster".into(),
                    cluster.into(),
                    "--services".into(),
                    service.into(),
                ],
            )
            .await?;
        first_service(out, service)
    }

    async fn describe_task_definition(
        &self,
        reference: &TaskReference,
    ) -> Result<TaskDefinition, ClientError> {
        let out: TaskDefinitionOutput = self
            .call(
                "ecs",
                "describe-task-definition",
                vec!["--task-definition".into(), reference.to_string()],
            )
            .await?;
        Ok(out.task_definition)
    }

    async fn list_task_definitions(&self, family: &str) -> Result<Vec<String>, ClientError> {
        let out: ListTaskDefinitionsOutput = self
            .call(
                "ecs",
                "list-task-definitions",
                vec![
                    "--family-prefix".into(),
                    family.into(),
                    "--status".into(),
                    "ACTIVE".into(),
                ],
            )
            .await?;
        Ok(out.task_definition_arns)
    }

    async fn list_tags_for_resource(&self, arn: &str) -> Result<Vec<Tag>, ClientError> {
        let out: ListTagsOutput = self
            .call(
                "ecs",
                "list-tags-for-resource",
                vec!["--resource-arn".into(), arn.into()],
            )
            .await?;
        Ok(out.tags)
    }

    async fn run_task(&self, input: &RunTaskInput) -> Result<TasksOutput, ClientError> {
        let body = json_arg("ecs run-task", input)?;
        self.call("ecs", "run-task", vec!["--cli-input-json".into(), body])
            .await
    }

    async fn describe_tasks(
        &self,
        cluster: &str,
        task_arns: &[String],
    ) -> Result<TasksOutput, ClientError> {
        let mut args = vec!["--cluster".to_string(), cluster.to_string(), "--tasks".to_string()];
        args.extend(task_arns.iter().cloned());
        self.call("ecs", "describe-tasks", args).await
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<TaskDefinition, ClientError> {
        let body = json_arg(
            "ecs register-task-definition",
            &definition.registration_input(),
        )?;
        let out: TaskDefinitionOutput = self
            .call(
                "ecs",
                "register-task-definition",
                vec!["--cli-input-json".into(), body],
            )
            .await?;
        Ok(out.task_definition)
    }

    async fn get_log_events(
        &self,
        group: &str,
        stream: &str,
        start_time: DateTime<Utc>,
        next_token: Option<&str>,
    ) -> Result<LogEventsPage, ClientError> {
        self.call(
            "logs",
            "get-log-events",
            log_events_args(group, stream, start_time, next_token),
        )
        .await
    }
}
