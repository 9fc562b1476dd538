use ecsrun_core::Config;
use std::path::Path;

const SAMPLE_CONFIG: &str = r#"# ecsrun configuration
# Relative definition paths resolve against this file's directory.

region: us-east-1
# profile: default
cluster: default
service: my-service
service_definition: ecs-service-def.json
task_definition: ecs-task-def.json

# Seconds to wait for the task to reach the requested phase
timeout: 600
"#;

pub fn run(config_path: Option<&Path>, path: bool, init: bool) -> anyhow::Result<()> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::default_path);

    if path {
        println!("{}", config_path.display());
        return Ok(());
    }

    if init {
        if config_path.exists() {
            println!("Config already exists at: {}", config_path.display());
            println!("Remove it first if you want to reinitialize.");
            return Ok(());
        }

        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&config_path, SAMPLE_CONFIG)?;
        println!("Sample config written to: {}", config_path.display());
        return Ok(());
    }

    println!("Config path:     {}", config_path.display());
    if !config_path.exists() {
        println!("Status:          not found");
        println!("Run `ecsrun config --init` to create one.");
        return Ok(());
    }

    let config = Config::load_from(&config_path)?;
    println!("Cluster:         {}", config.cluster);
    println!(
        "Service:         {}",
        config.service.as_deref().unwrap_or("-")
    );
    println!(
        "Task definition: {}",
        display_path(config.task_definition.as_deref())
    );
    println!(
        "Service def:     {}",
        display_path(config.service_definition.as_deref())
    );
    println!("Timeout:         {}s", config.timeout);
    Ok(())
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "-".to_string())
}
