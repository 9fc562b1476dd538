use crate::tags::Tag;
use std::path::PathBuf;
use std::str::FromStr;

/// Which task definition revision a run executes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDefinitionSelector {
    /// Register the local definition (`path`, else the configured one) and run it.
    Register { path: Option<PathBuf> },
    /// Run the latest registered revision of the family, or `revision` if given.
    Latest { revision: Option<u32> },
    /// Run what is already registered without touching definitions.
    Skip { revision: Option<u32> },
}

impl Default for TaskDefinitionSelector {
    fn default() -> Self {
        Self::Register { path: None }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverrideSource {
    #[default]
    None,
    Inline(String),
    File(PathBuf),
}

/// How tags reach the launched task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PropagateTags {
    /// No propagation field is sent.
    #[default]
    None,
    /// The service's tags are fetched and appended to the run's tags.
    Service,
    /// Sent verbatim as the native propagation parameter.
    Passthrough(String),
}

impl PropagateTags {
    pub fn parse(s: &str) -> Self {
        match s {
            "" => Self::None,
            "SERVICE" => Self::Service,
            other => Self::Passthrough(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WaitMode {
    /// Return as soon as the task is submitted.
    NoWait,
    UntilRunning,
    #[default]
    UntilStopped,
}

impl WaitMode {
    pub fn until_running(&self) -> bool {
        matches!(self, WaitMode::UntilRunning)
    }
}

impl FromStr for WaitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "running" => Ok(WaitMode::UntilRunning),
            "stopped" => Ok(WaitMode::UntilStopped),
            "no-wait" | "none" => Ok(WaitMode::NoWait),
            other => Err(format!("unknown wait mode: {}", other)),
        }
    }
}

/// Everything the user asked for in one `run` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub selector: TaskDefinitionSelector,
    pub overrides: OverrideSource,
    pub count: u32,
    pub tags: Vec<Tag>,
    pub propagate_tags: PropagateTags,
    pub dry_run: bool,
    pub wait: WaitMode,
    pub watch_container: Option<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            selector: TaskDefinitionSelector::default(),
            overrides: OverrideSource::None,
            count: 1,
            tags: Vec::new(),
            propagate_tags: PropagateTags::None,
            dry_run: false,
            wait: WaitMode::default(),
            watch_container: None,
        }
    }
}

impl RunOptions {
    /// Suffix for progress lines, e.g. `Running task (DRY RUN)`.
    pub fn dry_run_suffix(&self) -> &'static str {
        if self.dry_run {
            "(DRY RUN)"
        } else {
            ""
        }
    }
}
