//! Scripted in-memory control plane shared by the integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use ecsrun_core::client::{ControlPlane, LogEventsPage, RunTaskInput, TasksOutput};
use ecsrun_core::definition::{
    ContainerDefinition, LogConfiguration, ServiceDefinition, TaskDefinition,
};
use ecsrun_core::error::ClientError;
use ecsrun_core::tags::Tag;
use ecsrun_core::task::{Container, Task, TaskReference, TaskStatus};
use ecsrun_core::{RunContext, Timing};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CLUSTER: &str = "test-cluster";
pub const TASK_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:task/test-cluster/0f1e2d3c";
pub const SERVICE_ARN: &str = "arn:aws:ecs:us-east-1:123456789012:service/test-cluster/web";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    DescribeService(String),
    DescribeTaskDefinition(String),
    ListTaskDefinitions(String),
    ListTagsForResource(String),
    RunTask,
    DescribeTasks,
    RegisterTaskDefinition(String),
    GetLogEvents(Option<String>),
}

#[derive(Default)]
struct State {
    service: Option<ServiceDefinition>,
    task_definitions: Vec<TaskDefinition>,
    revisions: Vec<String>,
    service_tags: Vec<Tag>,
    run_output: Option<TasksOutput>,
    describe_script: VecDeque<TasksOutput>,
    log_pages: VecDeque<Result<LogEventsPage, String>>,
    panic_on_logs: bool,
    calls: Vec<Call>,
    run_inputs: Vec<RunTaskInput>,
}

#[derive(Default)]
pub struct FakeControlPlane {
    state: Mutex<State>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service(self, service: ServiceDefinition) -> Self {
        self.state.lock().unwrap().service = Some(service);
        self
    }

    pub fn with_task_definition(self, td: TaskDefinition) -> Self {
        self.state.lock().unwrap().task_definitions.push(td);
        self
    }

    pub fn with_revisions(self, arns: Vec<String>) -> Self {
        self.state.lock().unwrap().revisions = arns;
        self
    }

    pub fn with_service_tags(self, tags: Vec<Tag>) -> Self {
        self.state.lock().unwrap().service_tags = tags;
        self
    }

    pub fn with_run_output(self, out: TasksOutput) -> Self {
        self.state.lock().unwrap().run_output = Some(out);
        self
    }

    /// Responses for successive `describe_tasks` calls; the last one repeats.
    pub fn with_describe_script(self, script: Vec<TasksOutput>) -> Self {
        self.state.lock().unwrap().describe_script = script.into();
        self
    }

    pub fn with_log_pages(self, pages: Vec<Result<LogEventsPage, String>>) -> Self {
        self.state.lock().unwrap().log_pages = pages.into();
        self
    }

    /// Makes `get_log_events` panic, as a crashed log reader would.
    pub fn with_panicking_logs(self) -> Self {
        self.state.lock().unwrap().panic_on_logs = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn run_inputs(&self) -> Vec<RunTaskInput> {
        self.state.lock().unwrap().run_inputs.clone()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }
}

#[async_trait::async_trait]
impl ControlPlane for FakeControlPlane {
    async fn describe_service(
        &self,
        _cluster: &str,
        service: &str,
    ) -> Result<ServiceDefinition, ClientError> {
        self.record(Call::DescribeService(service.to_string()));
        self.state
            .lock()
            .unwrap()
            .service
            .clone()
            .ok_or_else(|| ClientError::NotFound(service.to_string()))
    }

    async fn describe_task_definition(
        &self,
        reference: &TaskReference,
    ) -> Result<TaskDefinition, ClientError> {
        self.record(Call::DescribeTaskDefinition(reference.to_string()));
        let state = self.state.lock().unwrap();
        state
            .task_definitions
            .iter()
            .find(|td| {
                td.task_definition_arn.as_deref() == Some(reference.as_str())
                    || (td.family == reference.family() && td.revision == reference.revision())
            })
            .cloned()
            .ok_or_else(|| ClientError::NotFound(reference.to_string()))
    }

    async fn list_task_definitions(&self, family: &str) -> Result<Vec<String>, ClientError> {
        self.record(Call::ListTaskDefinitions(family.to_string()));
        Ok(self.state.lock().unwrap().revisions.clone())
    }

    async fn list_tags_for_resource(&self, arn: &str) -> Result<Vec<Tag>, ClientError> {
        self.record(Call::ListTagsForResource(arn.to_string()));
        Ok(self.state.lock().unwrap().service_tags.clone())
    }

    async fn run_task(&self, input: &RunTaskInput) -> Result<TasksOutput, ClientError> {
        self.record(Call::RunTask);
        let mut state = self.state.lock().unwrap();
        state.run_inputs.push(input.clone());
        Ok(state.run_output.clone().unwrap_or_else(|| TasksOutput {
            tasks: vec![task_with_status(TaskStatus::Provisioning)],
            failures: vec![],
        }))
    }

    async fn describe_tasks(
        &self,
        _cluster: &str,
        _task_arns: &[String],
    ) -> Result<TasksOutput, ClientError> {
        self.record(Call::DescribeTasks);
        let mut state = self.state.lock().unwrap();
        let out = if state.describe_script.len() > 1 {
            state.describe_script.pop_front()
        } else {
            state.describe_script.front().cloned()
        };
        Ok(out.unwrap_or_else(|| stopped_with_exit(0)))
    }

    async fn register_task_definition(
        &self,
        definition: &TaskDefinition,
    ) -> Result<TaskDefinition, ClientError> {
        self.record(Call::RegisterTaskDefinition(definition.family.clone()));
        let mut registered = definition.clone();
        registered.revision = Some(1);
        registered.task_definition_arn = Some(td_arn(&definition.family, 1));
        Ok(registered)
    }

    async fn get_log_events(
        &self,
        _group: &str,
        _stream: &str,
        _start_time: DateTime<Utc>,
        next_token: Option<&str>,
    ) -> Result<LogEventsPage, ClientError> {
        self.record(Call::GetLogEvents(next_token.map(str::to_string)));
        let panic_on_logs = self.state.lock().unwrap().panic_on_logs;
        if panic_on_logs {
            panic!("log reader crashed");
        }
        match self.state.lock().unwrap().log_pages.pop_front() {
            Some(Ok(page)) => Ok(page),
            Some(Err(message)) => Err(ClientError::Command {
                op: "logs get-log-events".into(),
                message,
            }),
            None => Ok(LogEventsPage {
                events: vec![],
                next_forward_token: next_token.map(str::to_string),
            }),
        }
    }
}

pub fn td_arn(family: &str, revision: u32) -> String {
    format!(
        "arn:aws:ecs:us-east-1:123456789012:task-definition/{}:{}",
        family, revision
    )
}

pub fn container(name: &str) -> ContainerDefinition {
    ContainerDefinition {
        name: name.into(),
        log_configuration: None,
        extra: Default::default(),
    }
}

pub fn awslogs_container(name: &str) -> ContainerDefinition {
    ContainerDefinition {
        name: name.into(),
        log_configuration: Some(LogConfiguration {
            log_driver: "awslogs".into(),
            options: [
                ("awslogs-group".to_string(), "/ecs/app".to_string()),
                ("awslogs-stream-prefix".to_string(), "ecs".to_string()),
            ]
            .into_iter()
            .collect(),
            extra: Default::default(),
        }),
        extra: Default::default(),
    }
}

pub fn task_definition(
    family: &str,
    revision: u32,
    containers: Vec<ContainerDefinition>,
) -> TaskDefinition {
    TaskDefinition {
        family: family.into(),
        task_definition_arn: Some(td_arn(family, revision)),
        revision: Some(revision),
        container_definitions: containers,
        extra: Default::default(),
    }
}

pub fn service(task_definition: &str) -> ServiceDefinition {
    ServiceDefinition {
        service_arn: Some(SERVICE_ARN.into()),
        service_name: Some("web".into()),
        task_definition: Some(task_definition.into()),
        launch_type: Some("FARGATE".into()),
        ..Default::default()
    }
}

pub fn task_with_status(status: TaskStatus) -> Task {
    Task {
        task_arn: TASK_ARN.into(),
        last_status: Some(status),
        containers: vec![Container {
            name: "app".into(),
            ..Default::default()
        }],
        ..Default::default()
    }
}

pub fn tasks(status: TaskStatus) -> TasksOutput {
    TasksOutput {
        tasks: vec![task_with_status(status)],
        failures: vec![],
    }
}

pub fn stopped_with_exit(code: i64) -> TasksOutput {
    let mut task = task_with_status(TaskStatus::Stopped);
    task.stopped_reason = Some("Essential container in task exited".into());
    task.containers[0].exit_code = Some(code);
    TasksOutput {
        tasks: vec![task],
        failures: vec![],
    }
}

pub fn fast_timing() -> Timing {
    Timing {
        poll_delay: Duration::from_millis(10),
        log_grace: Duration::from_millis(5),
        log_interval: Duration::from_millis(5),
    }
}

pub fn context(client: Arc<FakeControlPlane>) -> RunContext {
    RunContext::new(CLUSTER, client)
        .with_timing(fast_timing())
        .with_timeout(Duration::from_secs(2))
}
