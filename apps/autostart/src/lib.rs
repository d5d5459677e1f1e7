pub mod data_dir;
pub mod elevation;
pub mod installer;
pub mod runtime;
mod safe_print;
#[cfg(windows)]
pub mod scheduler_windows;
pub mod task_spec;
pub mod task_xml;
pub mod trace;
