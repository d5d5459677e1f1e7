use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::runtime::ExecutionTarget;

pub const TASK_NAME: &str = "Jarvis AI Assistant";
pub const WAKE_FLAG: &str = "--wake";

const DEFAULT_MAX_RESTARTS: u32 = 3;
const DEFAULT_RESTART_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trigger {
    AtUserLogon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Hidden,
    Visible,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunLevel {
    Standard,
    Elevated,
}

/// Governs automatic relaunch of the task's process after a crash.
/// `max_restarts` stays small so a broken install cannot crash-loop forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestartPolicy {
    pub max_restarts: u32,
    pub restart_interval: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PowerPolicy {
    pub run_on_battery: bool,
    pub continue_on_battery_transition: bool,
}

/// Declarative description of the background task to register. Built
/// transiently at install time; the host scheduler owns the persisted copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSpecification {
    pub name: String,
    pub description: String,
    pub executable_path: PathBuf,
    pub arguments: Vec<String>,
    pub working_directory: PathBuf,
    pub trigger: Trigger,
    pub visibility: Visibility,
    pub restart_policy: RestartPolicy,
    pub run_level: RunLevel,
    pub power_policy: PowerPolicy,
}

/// Pure construction: combines the resolved runtime with the assistant
/// script and the fixed policy defaults. The script must already exist;
/// callers abort before any host mutation otherwise.
pub fn build_specification(
    target: &ExecutionTarget,
    script_path: &Path,
    working_dir: &Path,
) -> Result<TaskSpecification> {
    if !script_path.exists() {
        return Err(anyhow!(
            "E_SCRIPT_MISSING: assistant script not found at {} (set JARVIS_HOME or run from the Jarvis directory)",
            script_path.display()
        ));
    }
    Ok(TaskSpecification {
        name: TASK_NAME.to_string(),
        description: "Launches the Jarvis assistant in wake-word mode at user logon".to_string(),
        executable_path: target.path.clone(),
        arguments: vec![script_path.display().to_string(), WAKE_FLAG.to_string()],
        working_directory: working_dir.to_path_buf(),
        trigger: Trigger::AtUserLogon,
        visibility: target.visibility,
        restart_policy: RestartPolicy {
            max_restarts: DEFAULT_MAX_RESTARTS,
            restart_interval: DEFAULT_RESTART_INTERVAL,
        },
        run_level: RunLevel::Elevated,
        power_policy: PowerPolicy {
            run_on_battery: true,
            continue_on_battery_transition: true,
        },
    })
}
