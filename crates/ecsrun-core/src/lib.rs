pub mod client;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod observe;
pub mod options;
pub mod resolve;
pub mod run;
pub mod status;
pub mod submit;
pub mod tags;
pub mod task;
pub mod template;
pub mod waiter;

pub use client::ControlPlane;
pub use config::Config;
pub use context::{RunContext, Timing};
pub use error::{ClientError, DefinitionError, RunError, WaitError};
pub use options::{OverrideSource, PropagateTags, RunOptions, TaskDefinitionSelector, WaitMode};
pub use run::run;
pub use task::{Task, TaskReference, TaskStatus};
