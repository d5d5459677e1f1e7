use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, OnceLock},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use serde::Serialize;
use serde_json::Value;

const DEFAULT_TRACE_MAX_BYTES: u64 = 2_000_000; // 2MB
const DEFAULT_TRACE_MAX_FILES: usize = 3;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn env_bool_default_true(key: &str) -> bool {
    match std::env::var(key) {
        Ok(v) => {
            let t = v.trim().to_ascii_lowercase();
            !(t == "0" || t == "false" || t == "no" || t == "off")
        }
        Err(_) => true,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(v) => v.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(v) => v.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

pub fn enabled() -> bool {
    // Default: enabled. Set JARVIS_AUTOSTART_TRACE_ENABLED=0 to disable.
    env_bool_default_true("JARVIS_AUTOSTART_TRACE_ENABLED")
}

fn max_bytes() -> u64 {
    env_u64("JARVIS_AUTOSTART_TRACE_MAX_BYTES", DEFAULT_TRACE_MAX_BYTES)
}

fn max_files() -> usize {
    env_usize("JARVIS_AUTOSTART_TRACE_MAX_FILES", DEFAULT_TRACE_MAX_FILES)
}

pub fn trace_path(data_dir: &Path) -> PathBuf {
    data_dir.join("trace.jsonl")
}

fn rotate_if_needed_best_effort(data_dir: &Path) {
    let p = trace_path(data_dir);
    let max_b = max_bytes();
    let max_f = max_files();
    if max_f == 0 {
        return;
    }

    let len = match std::fs::metadata(&p) {
        Ok(m) => m.len(),
        Err(_) => return,
    };
    if len <= max_b {
        return;
    }

    // Remove the oldest first so Windows renames won't fail due to existing dest files.
    let oldest = data_dir.join(format!("trace.jsonl.{max_f}"));
    if oldest.exists() {
        let _ = std::fs::remove_file(&oldest);
    }

    // Shift: trace.jsonl.(n-1) -> trace.jsonl.n, then trace.jsonl -> trace.jsonl.1
    for i in (1..max_f).rev() {
        let src = data_dir.join(format!("trace.jsonl.{i}"));
        let dst = data_dir.join(format!("trace.jsonl.{}", i + 1));
        if src.exists() {
            let _ = std::fs::rename(&src, &dst);
        }
    }
    let first = data_dir.join("trace.jsonl.1");
    let _ = std::fs::rename(&p, &first);
}

fn trace_write_lock() -> &'static Mutex<()> {
    static TRACE_WRITE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    TRACE_WRITE_LOCK.get_or_init(|| Mutex::new(()))
}

pub fn emit_best_effort(data_dir: &Path, ev: &TraceEvent) {
    if !enabled() {
        return;
    }
    let _guard = trace_write_lock().lock().unwrap();
    let _ = std::fs::create_dir_all(data_dir);
    rotate_if_needed_best_effort(data_dir);

    let p = trace_path(data_dir);
    let mut f = match OpenOptions::new().create(true).append(true).open(&p) {
        Ok(f) => f,
        Err(e) => {
            crate::safe_eprintln!("trace: open failed: {}: {e}", p.display());
            return;
        }
    };
    let mut line = match serde_json::to_string(ev) {
        Ok(s) => s,
        Err(e) => {
            crate::safe_eprintln!("trace: serialize failed: {e}");
            return;
        }
    };
    line.push('\n');
    if let Err(e) = f.write_all(line.as_bytes()) {
        crate::safe_eprintln!("trace: write failed: {e}");
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceError {
    pub kind: String,    // host|io|process|logic|unknown
    pub code: String,    // E_*
    pub message: String, // short
}

#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub ts_ms: i64,
    pub stage: String,
    pub step_id: String,
    pub op: String,     // start|end|event
    pub status: String, // ok|err|skipped|aborted
    pub duration_ms: Option<u128>,
    pub error: Option<TraceError>,
    pub ctx: Option<Value>,
}

pub fn event(data_dir: &Path, stage: &str, step_id: &str, status: &str, ctx: Option<Value>) {
    emit_best_effort(
        data_dir,
        &TraceEvent {
            ts_ms: now_ms(),
            stage: stage.to_string(),
            step_id: step_id.to_string(),
            op: "event".to_string(),
            status: status.to_string(),
            duration_ms: None,
            error: None,
            ctx,
        },
    );
}

pub struct Span {
    data_dir: PathBuf,
    stage: String,
    step_id: String,
    t0: Instant,
    finished: bool,
}

impl Span {
    pub fn start(data_dir: &Path, stage: &str, step_id: &str, ctx: Option<Value>) -> Self {
        emit_best_effort(
            data_dir,
            &TraceEvent {
                ts_ms: now_ms(),
                stage: stage.to_string(),
                step_id: step_id.to_string(),
                op: "start".to_string(),
                status: "ok".to_string(),
                duration_ms: None,
                error: None,
                ctx,
            },
        );
        Self {
            data_dir: data_dir.to_path_buf(),
            stage: stage.to_string(),
            step_id: step_id.to_string(),
            t0: Instant::now(),
            finished: false,
        }
    }

    pub fn ok(mut self, ctx: Option<Value>) {
        self.finished = true;
        emit_best_effort(
            &self.data_dir,
            &TraceEvent {
                ts_ms: now_ms(),
                stage: self.stage.clone(),
                step_id: self.step_id.clone(),
                op: "end".to_string(),
                status: "ok".to_string(),
                duration_ms: Some(self.t0.elapsed().as_millis()),
                error: None,
                ctx,
            },
        );
    }

    pub fn err(mut self, kind: &str, code: &str, message: &str, ctx: Option<Value>) {
        self.finished = true;
        emit_best_effort(
            &self.data_dir,
            &TraceEvent {
                ts_ms: now_ms(),
                stage: self.stage.clone(),
                step_id: self.step_id.clone(),
                op: "end".to_string(),
                status: "err".to_string(),
                duration_ms: Some(self.t0.elapsed().as_millis()),
                error: Some(TraceError {
                    kind: kind.to_string(),
                    code: code.to_string(),
                    message: message.to_string(),
                }),
                ctx,
            },
        );
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        emit_best_effort(
            &self.data_dir,
            &TraceEvent {
                ts_ms: now_ms(),
                stage: self.stage.clone(),
                step_id: self.step_id.clone(),
                op: "end".to_string(),
                status: "aborted".to_string(),
                duration_ms: Some(self.t0.elapsed().as_millis()),
                error: Some(TraceError {
                    kind: "logic".to_string(),
                    code: "ABORTED".to_string(),
                    message: "span dropped without explicit ok/err".to_string(),
                }),
                ctx: None,
            },
        );
    }
}
