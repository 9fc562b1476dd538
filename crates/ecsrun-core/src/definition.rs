//! Task definition, service definition and override models, plus the local
//! definition source that loads them from JSON or YAML files.
//!
//! Only the fields this crate interprets are typed. Everything else is kept
//! in a flattened map so it round-trips verbatim to the control plane.

use crate::error::DefinitionError;
use crate::template;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Fields the control plane returns but refuses on registration.
const READ_ONLY_FIELDS: &[&str] = &[
    "taskDefinitionArn",
    "revision",
    "status",
    "requiresAttributes",
    "compatibilities",
    "registeredAt",
    "registeredBy",
    "deregisteredAt",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_definition_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u32>,
    #[serde(default)]
    pub container_definitions: Vec<ContainerDefinition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskDefinition {
    /// The container whose logs are watched: the one named `name`, or the
    /// first container when no name is given.
    pub fn watch_container(&self, name: Option<&str>) -> Option<&ContainerDefinition> {
        match name {
            Some(name) if !name.is_empty() => {
                self.container_definitions.iter().find(|c| c.name == name)
            }
            _ => self.container_definitions.first(),
        }
    }

    /// Body suitable for `RegisterTaskDefinition`, with read-only fields removed.
    pub fn registration_input(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            for field in READ_ONLY_FIELDS {
                map.remove(*field);
            }
        }
        value
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_configuration: Option<LogConfiguration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogConfiguration {
    pub log_driver: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The parts of a service that a one-off task inherits.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDefinition {
    #[serde(default)]
    pub service_arn: Option<String>,
    #[serde(default)]
    pub service_name: Option<String>,
    #[serde(default)]
    pub task_definition: Option<String>,
    #[serde(default)]
    pub launch_type: Option<String>,
    #[serde(default)]
    pub network_configuration: Option<Value>,
    #[serde(default)]
    pub capacity_provider_strategy: Option<Vec<Value>>,
    #[serde(default)]
    pub placement_constraints: Option<Vec<Value>>,
    #[serde(default)]
    pub placement_strategy: Option<Vec<Value>>,
    #[serde(default)]
    pub platform_version: Option<String>,
    #[serde(default, rename = "enableECSManagedTags")]
    pub enable_ecs_managed_tags: Option<bool>,
    #[serde(default)]
    pub enable_execute_command: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyValuePair {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Per-run modifications layered on the task definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskOverride {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_overrides: Vec<ContainerOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_role_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_role_arn: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TaskOverride {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<KeyValuePair>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_reservation: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Read, render and parse a definition file. `.yaml` / `.yml` files are
/// parsed as YAML, everything else as JSON.
pub fn read_definition_file<T: DeserializeOwned>(path: &Path) -> Result<T, DefinitionError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DefinitionError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let rendered = template::render(&raw).map_err(|message| DefinitionError::Template {
        path: path.to_path_buf(),
        message,
    })?;
    parse_definition(path, &rendered)
}

fn parse_definition<T: DeserializeOwned>(path: &Path, src: &str) -> Result<T, DefinitionError> {
    let is_yaml = path
        .extension()
        .is_some_and(|ext| ext == "yaml" || ext == "yml");
    let parsed = if is_yaml {
        serde_yaml::from_str(src).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(src).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| DefinitionError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn load_task_definition(path: &Path) -> Result<TaskDefinition, DefinitionError> {
    read_definition_file(path)
}

pub fn load_service_definition(path: &Path) -> Result<ServiceDefinition, DefinitionError> {
    read_definition_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TASK_DEF: &str = r#"{
        "family": "worker",
        "taskDefinitionArn": "arn:aws:ecs:us-east-1:1:task-definition/worker:4",
        "revision": 4,
        "status": "ACTIVE",
        "cpu": "256",
        "containerDefinitions": [
            {"name": "app", "image": "app:latest", "essential": true},
            {"name": "sidecar", "image": "envoy",
             "logConfiguration": {"logDriver": "awslogs",
                                  "options": {"awslogs-group": "/ecs/worker"}}}
        ]
    }"#;

    fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn unknown_fields_round_trip() {
        let td: TaskDefinition = serde_json::from_str(TASK_DEF).unwrap();
        assert_eq!(td.extra.get("cpu"), Some(&Value::String("256".into())));
        let app = &td.container_definitions[0];
        assert_eq!(app.extra.get("image"), Some(&Value::String("app:latest".into())));
    }

    #[test]
    fn registration_input_drops_read_only_fields() {
        let td: TaskDefinition = serde_json::from_str(TASK_DEF).unwrap();
        let input = td.registration_input();
        let map = input.as_object().unwrap();
        assert!(!map.contains_key("taskDefinitionArn"));
        assert!(!map.contains_key("revision"));
        assert!(!map.contains_key("status"));
        assert_eq!(map["family"], "worker");
        assert_eq!(map["cpu"], "256");
        assert!(map.contains_key("containerDefinitions"));
    }

    #[test]
    fn watch_container_by_name_or_first() {
        let td: TaskDefinition = serde_json::from_str(TASK_DEF).unwrap();
        assert_eq!(td.watch_container(None).unwrap().name, "app");
        assert_eq!(td.watch_container(Some("")).unwrap().name, "app");
        assert_eq!(td.watch_container(Some("sidecar")).unwrap().name, "sidecar");
        assert!(td.watch_container(Some("missing")).is_none());
    }

    #[test]
    fn loads_json_and_yaml_files() {
        let json = write_temp(".json", TASK_DEF);
        let td = load_task_definition(json.path()).unwrap();
        assert_eq!(td.family, "worker");

        let yaml = write_temp(
            ".yml",
            "family: batch\ncontainerDefinitions:\n  - name: main\n    image: busybox\n",
        );
        let td = load_task_definition(yaml.path()).unwrap();
        assert_eq!(td.family, "batch");
        assert_eq!(td.container_definitions[0].name, "main");
    }

    #[test]
    fn shell_length_expansion_in_command_is_preserved() {
        let file = write_temp(
            ".json",
            r#"{"family": "job", "containerDefinitions": [
                {"name": "app", "command": ["sh", "-c", "a=${#X}; b=${Y#}; echo ${#ARGS}"]}
            ]}"#,
        );
        let td = load_task_definition(file.path()).unwrap();
        assert_eq!(
            td.container_definitions[0].extra["command"][2],
            "a=${#X}; b=${Y#}; echo ${#ARGS}"
        );
    }

    #[test]
    fn missing_and_invalid_files_are_errors() {
        let err = load_task_definition(Path::new("/nonexistent/ecsrun/td.json")).unwrap_err();
        assert!(matches!(err, DefinitionError::Read { .. }));

        let bad = write_temp(".json", "{ not json");
        let err = load_task_definition(bad.path()).unwrap_err();
        assert!(matches!(err, DefinitionError::Parse { .. }));

        let no_family = write_temp(".json", r#"{"containerDefinitions": []}"#);
        assert!(load_task_definition(no_family.path()).is_err());
    }

    #[test]
    fn service_definition_reads_placement_fields() {
        let sv: ServiceDefinition = serde_json::from_str(
            r#"{
                "serviceArn": "arn:aws:ecs:us-east-1:1:service/default/web",
                "launchType": "FARGATE",
                "platformVersion": "1.4.0",
                "enableECSManagedTags": true,
                "networkConfiguration": {"awsvpcConfiguration": {"subnets": ["subnet-1"]}},
                "desiredCount": 2
            }"#,
        )
        .unwrap();
        assert_eq!(sv.launch_type.as_deref(), Some("FARGATE"));
        assert_eq!(sv.enable_ecs_managed_tags, Some(true));
        assert!(sv.network_configuration.is_some());
    }

    #[test]
    fn override_rejects_wrong_shape() {
        assert!(serde_json::from_str::<TaskOverride>(r#"{"containerOverrides": "x"}"#).is_err());
        let ov: TaskOverride = serde_json::from_str(
            r#"{"containerOverrides":[{"name":"app","command":["echo","hi"]}]}"#,
        )
        .unwrap();
        assert_eq!(ov.container_overrides[0].command.as_ref().unwrap().len(), 2);
        assert!(!ov.is_empty());
        assert!(TaskOverride::default().is_empty());
    }
}
