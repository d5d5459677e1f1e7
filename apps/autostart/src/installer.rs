use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde_json::json;

use crate::{task_spec::TaskSpecification, trace};

/// Port onto the host's task-scheduling facility. The production
/// implementation shells out to the scheduler; tests inject a fake so the
/// install flow can be exercised without touching the host.
pub trait TaskHost: Send + Sync {
    /// Remove the named task. A name with no registration is not an error.
    fn remove(&self, name: &str) -> Result<()>;
    /// Register the task described by `spec`, replacing any registration
    /// that still exists under the same name.
    fn register(&self, spec: &TaskSpecification) -> Result<()>;
    /// Ask the host to run the named task immediately, independent of its
    /// trigger.
    fn start(&self, name: &str) -> Result<()>;
}

/// Idempotent install: remove any prior task under the spec's name, then
/// force-register the new one. Two installs of the same spec leave exactly
/// one registration. There is no rollback across the remove/register window;
/// the force registration wins either way.
pub fn install(host: &dyn TaskHost, data_dir: &Path, spec: &TaskSpecification) -> Result<()> {
    let span = trace::Span::start(
        data_dir,
        "Install",
        "INSTALL.register",
        Some(json!({
            "task": spec.name,
            "command": spec.executable_path.display().to_string(),
            "visibility": spec.visibility,
        })),
    );

    if !spec.executable_path.exists() {
        let msg = format!(
            "E_RUNTIME_NOT_FOUND: task executable missing: {}",
            spec.executable_path.display()
        );
        span.err("logic", "E_RUNTIME_NOT_FOUND", &msg, None);
        return Err(anyhow!(msg));
    }

    // Stale-task removal is best effort; the force registration below wins
    // either way.
    if let Err(e) = host.remove(&spec.name) {
        trace::event(
            data_dir,
            "Install",
            "INSTALL.remove_prior",
            "skipped",
            Some(json!({"task": spec.name, "message": e.to_string()})),
        );
    }

    if let Err(e) = host.register(spec) {
        span.err("host", "E_REGISTER_FAILED", &e.to_string(), None);
        return Err(e.context(
            "E_REGISTER_FAILED: the scheduler rejected the registration (retry from an elevated prompt)",
        ));
    }

    span.ok(None);
    Ok(())
}

/// Optional follow-up after a successful install. A failure here is reported
/// to the operator but never unregisters the task or fails the install.
pub fn start_now(host: &dyn TaskHost, data_dir: &Path, name: &str) -> Result<()> {
    let span = trace::Span::start(data_dir, "Install", "INSTALL.start_now", None);
    match host.start(name) {
        Ok(()) => {
            span.ok(None);
            Ok(())
        }
        Err(e) => {
            span.err("host", "E_START_FAILED", &e.to_string(), None);
            Err(e).with_context(|| format!("E_START_FAILED: could not start task {name:?}"))
        }
    }
}
