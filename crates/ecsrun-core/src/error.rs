use std::path::PathBuf;
use thiserror::Error;

/// Failure talking to the remote control plane.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("{op} failed: {message}")]
    Command { op: String, message: String },

    #[error("Failed to spawn client process: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Unexpected {op} response: {source}")]
    Decode {
        op: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Failure loading a local definition file.
#[derive(Error, Debug)]
pub enum DefinitionError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to render {path}: {message}")]
    Template { path: PathBuf, message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Error, Debug)]
pub enum WaitError {
    #[error("exceeded wait attempts ({attempts})")]
    Timeout { attempts: u32 },

    #[error("task {arn} is {status}: {reason}")]
    Terminal {
        arn: String,
        status: String,
        reason: String,
    },

    #[error("wait cancelled")]
    Cancelled,

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Errors surfaced by the `run` entry point. Each variant carries the phase it
/// failed in.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid overrides: {0}")]
    InvalidOverrides(#[source] serde_json::Error),

    #[error("failed to read overrides-file {path}: {source}")]
    OverridesFile {
        path: PathBuf,
        #[source]
        source: DefinitionError,
    },

    #[error("invalid tags: {0}")]
    InvalidTags(String),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("task definition family is unknown: no service or task_definition configured")]
    MissingFamily,

    #[error("task definition path is not configured")]
    MissingTaskDefinition,

    #[error("no task definition registered for family {family}")]
    NoRevisions { family: String },

    #[error("container {name} is not defined in task definition")]
    WatchContainerNotFound { name: String },

    #[error("failed to resolve task definition: {0}")]
    Resolve(#[source] ClientError),

    #[error("failed to run task: {0}")]
    Submit(#[source] ClientError),

    #[error("failed to run task: {reason}")]
    TaskFailure { reason: String },

    #[error("failed to run task: no task returned")]
    NoTaskReturned,

    #[error("failed to run task: service ARN is required to propagate tags from service")]
    MissingServiceArn,

    #[error("failed to run task: {0}")]
    Wait(#[from] WaitError),

    #[error("failed to describe task status: {0}")]
    Status(#[source] ClientError),

    #[error("Exit Code: {0}")]
    ExitCode(i64),
}

pub type Result<T, E = RunError> = std::result::Result<T, E>;
