use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::task_spec::Visibility;

// The scheduled task runs the assistant through Python. pythonw.exe is the
// windowless entry point; when it sits next to python.exe we prefer it so the
// assistant gets no console window at logon.
const STANDARD_EXE: &str = "python.exe";
const WINDOWLESS_EXE: &str = "pythonw.exe";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionTarget {
    pub path: PathBuf,
    pub visibility: Visibility,
}

/// Locates the Python runtime the task will launch. `JARVIS_PYTHON` wins when
/// set; otherwise the PATH entries are scanned in order. Never fails silently:
/// when neither variant exists the caller gets `E_RUNTIME_NOT_FOUND`.
pub fn resolve_execution_target() -> Result<ExecutionTarget> {
    if let Ok(raw) = std::env::var("JARVIS_PYTHON") {
        let t = raw.trim();
        if !t.is_empty() {
            return resolve_explicit(Path::new(t));
        }
    }

    let dirs: Vec<PathBuf> = std::env::var_os("PATH")
        .map(|raw| std::env::split_paths(&raw).collect())
        .unwrap_or_default();
    resolve_in_dirs(&dirs)
}

fn resolve_explicit(p: &Path) -> Result<ExecutionTarget> {
    if !p.exists() {
        return Err(anyhow!(
            "E_RUNTIME_NOT_FOUND: JARVIS_PYTHON points to missing file: {}",
            p.display()
        ));
    }
    // A sibling windowless variant still wins over the explicit path.
    let windowless = p.with_file_name(WINDOWLESS_EXE);
    if windowless.exists() {
        return Ok(ExecutionTarget {
            path: windowless,
            visibility: Visibility::Hidden,
        });
    }
    Ok(ExecutionTarget {
        path: p.to_path_buf(),
        visibility: Visibility::Visible,
    })
}

pub fn resolve_in_dirs(dirs: &[PathBuf]) -> Result<ExecutionTarget> {
    for dir in dirs {
        let windowless = dir.join(WINDOWLESS_EXE);
        if windowless.exists() {
            return Ok(ExecutionTarget {
                path: windowless,
                visibility: Visibility::Hidden,
            });
        }
        let standard = dir.join(STANDARD_EXE);
        if standard.exists() {
            return Ok(ExecutionTarget {
                path: standard,
                visibility: Visibility::Visible,
            });
        }
    }
    Err(anyhow!(
        "E_RUNTIME_NOT_FOUND: no {STANDARD_EXE} or {WINDOWLESS_EXE} on PATH (install Python or set JARVIS_PYTHON)"
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    #[test]
    fn prefers_windowless_variant_when_both_exist() {
        let td = tempfile::tempdir().expect("tempdir");
        std::fs::write(td.path().join(STANDARD_EXE), b"x").expect("write");
        std::fs::write(td.path().join(WINDOWLESS_EXE), b"x").expect("write");

        let got = resolve_in_dirs(&[td.path().to_path_buf()]).expect("resolve");
        assert_eq!(got.path, td.path().join(WINDOWLESS_EXE));
        assert_eq!(got.visibility, Visibility::Hidden);
    }

    #[test]
    fn falls_back_to_standard_variant() {
        let td = tempfile::tempdir().expect("tempdir");
        std::fs::write(td.path().join(STANDARD_EXE), b"x").expect("write");

        let got = resolve_in_dirs(&[td.path().to_path_buf()]).expect("resolve");
        assert_eq!(got.path, td.path().join(STANDARD_EXE));
        assert_eq!(got.visibility, Visibility::Visible);
    }

    #[test]
    fn errors_when_no_runtime_anywhere() {
        let td = tempfile::tempdir().expect("tempdir");
        let err = resolve_in_dirs(&[td.path().to_path_buf()]).unwrap_err();
        assert!(err.to_string().contains("E_RUNTIME_NOT_FOUND"));
    }

    #[test]
    fn scans_dirs_in_order() {
        let empty = tempfile::tempdir().expect("tempdir");
        let hit = tempfile::tempdir().expect("tempdir");
        std::fs::write(hit.path().join(STANDARD_EXE), b"x").expect("write");

        let got = resolve_in_dirs(&[empty.path().to_path_buf(), hit.path().to_path_buf()])
            .expect("resolve");
        assert_eq!(got.path, hit.path().join(STANDARD_EXE));
    }

    #[test]
    fn explicit_env_path_is_respected() {
        let _g = env_lock().lock().unwrap();
        let td = tempfile::tempdir().expect("tempdir");
        let py = td.path().join(STANDARD_EXE);
        std::fs::write(&py, b"x").expect("write");
        std::env::set_var("JARVIS_PYTHON", py.display().to_string());

        let got = resolve_execution_target().expect("resolve");
        assert_eq!(got.path, py);
        assert_eq!(got.visibility, Visibility::Visible);
        std::env::remove_var("JARVIS_PYTHON");
    }

    #[test]
    fn explicit_env_path_upgrades_to_sibling_windowless() {
        let _g = env_lock().lock().unwrap();
        let td = tempfile::tempdir().expect("tempdir");
        let py = td.path().join(STANDARD_EXE);
        std::fs::write(&py, b"x").expect("write");
        std::fs::write(td.path().join(WINDOWLESS_EXE), b"x").expect("write");
        std::env::set_var("JARVIS_PYTHON", py.display().to_string());

        let got = resolve_execution_target().expect("resolve");
        assert_eq!(got.path, td.path().join(WINDOWLESS_EXE));
        assert_eq!(got.visibility, Visibility::Hidden);
        std::env::remove_var("JARVIS_PYTHON");
    }

    #[test]
    fn explicit_env_path_must_exist() {
        let _g = env_lock().lock().unwrap();
        let td = tempfile::tempdir().expect("tempdir");
        std::env::set_var(
            "JARVIS_PYTHON",
            td.path().join("gone.exe").display().to_string(),
        );

        let err = resolve_execution_target().unwrap_err();
        assert!(err.to_string().contains("E_RUNTIME_NOT_FOUND"));
        std::env::remove_var("JARVIS_PYTHON");
    }
}
