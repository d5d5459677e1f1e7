use std::{
    fs,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::{installer::TaskHost, task_spec::TaskSpecification, task_xml, trace};

/// Production [`TaskHost`]: drives the Windows Task Scheduler through
/// `schtasks.exe`. Registration goes through a task-definition XML file so
/// the restart and battery policy survive the trip intact.
pub struct SchtasksHost {
    data_dir: PathBuf,
}

impl SchtasksHost {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    fn schtasks(&self, args: &[&str]) -> Result<Output> {
        Command::new("schtasks.exe")
            .args(args)
            .output()
            .context("run schtasks.exe failed")
    }
}

fn stderr_text(out: &Output) -> String {
    let s = String::from_utf8_lossy(&out.stderr);
    let t = s.trim();
    if t.is_empty() {
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    } else {
        t.to_string()
    }
}

impl TaskHost for SchtasksHost {
    fn remove(&self, name: &str) -> Result<()> {
        // Query first: a failed lookup means nothing is registered under
        // this name, which is "nothing to remove" rather than an error.
        let query = self.schtasks(&["/Query", "/TN", name])?;
        if !query.status.success() {
            trace::event(
                &self.data_dir,
                "Scheduler",
                "SCHED.remove",
                "skipped",
                Some(json!({"task": name})),
            );
            return Ok(());
        }

        let out = self.schtasks(&["/Delete", "/TN", name, "/F"])?;
        if !out.status.success() {
            return Err(anyhow!(
                "schtasks /Delete exited with {}: {}",
                out.status,
                stderr_text(&out)
            ));
        }
        trace::event(
            &self.data_dir,
            "Scheduler",
            "SCHED.remove",
            "ok",
            Some(json!({"task": name})),
        );
        Ok(())
    }

    fn register(&self, spec: &TaskSpecification) -> Result<()> {
        let xml = task_xml::render(spec);
        let xml_path = std::env::temp_dir().join(format!("jarvis-task-{}.xml", std::process::id()));
        fs::write(&xml_path, xml)
            .with_context(|| format!("write task xml failed: {}", xml_path.display()))?;

        let xml_arg = xml_path.display().to_string();
        let out = self.schtasks(&["/Create", "/TN", &spec.name, "/XML", &xml_arg, "/F"]);
        let _ = fs::remove_file(&xml_path);

        let out = out?;
        if !out.status.success() {
            return Err(anyhow!(
                "schtasks /Create exited with {}: {}",
                out.status,
                stderr_text(&out)
            ));
        }
        trace::event(
            &self.data_dir,
            "Scheduler",
            "SCHED.register",
            "ok",
            Some(json!({"task": spec.name})),
        );
        Ok(())
    }

    fn start(&self, name: &str) -> Result<()> {
        let out = self.schtasks(&["/Run", "/TN", name])?;
        if !out.status.success() {
            return Err(anyhow!(
                "schtasks /Run exited with {}: {}",
                out.status,
                stderr_text(&out)
            ));
        }
        Ok(())
    }
}
