// Best-effort stderr logging that never panics.
//
// When the installer is relaunched detached (e.g. from the registered task
// itself) stderr may be closed, and `eprintln!` panics on write errors. We
// avoid that by explicitly ignoring stderr write failures.

#[macro_export]
macro_rules! safe_eprintln {
    ($($arg:tt)*) => {{
        use std::io::Write;
        let _ = writeln!(std::io::stderr(), $($arg)*);
    }};
}
