use std::{path::Path, process::ExitCode};

use anyhow::Result;
use jarvis_autostart::{data_dir, safe_eprintln};

fn main() -> ExitCode {
    println!("Jarvis AI Assistant - autostart setup");

    let dir = data_dir::data_dir();
    match run(&dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            safe_eprintln!("setup failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(windows)]
fn run(dir: &Path) -> Result<()> {
    use std::{thread, time::Duration};

    use jarvis_autostart::{
        elevation, installer, runtime,
        scheduler_windows::SchtasksHost,
        task_spec::{self, Visibility},
        trace,
    };
    use serde_json::json;

    if !elevation::is_elevated() {
        // Advisory only: the registration call is the real privilege check.
        println!("Warning: not running elevated; the scheduler may reject the registration.");
    }

    let target = match runtime::resolve_execution_target() {
        Ok(t) => t,
        Err(e) => {
            trace::event(
                dir,
                "Setup",
                "SETUP.resolve_runtime",
                "err",
                Some(json!({"message": e.to_string()})),
            );
            return Err(e);
        }
    };
    trace::event(
        dir,
        "Setup",
        "SETUP.resolve_runtime",
        "ok",
        Some(json!({
            "path": target.path.display().to_string(),
            "visibility": target.visibility,
        })),
    );

    let home = jarvis_home()?;
    let script = home.join("main.py");
    let spec = task_spec::build_specification(&target, &script, &home)?;

    let host = SchtasksHost::new(dir);
    installer::install(&host, dir, &spec)?;

    match spec.visibility {
        Visibility::Hidden => println!("Registered task {:?} (hidden mode).", spec.name),
        Visibility::Visible => {
            println!("Registered task {:?} (visible mode).", spec.name);
            println!("Note: pythonw.exe was not found; the assistant will show a console window.");
        }
    }

    if confirm_start() {
        match installer::start_now(&host, dir, &spec.name) {
            Ok(()) => {
                // Cosmetic pause so the assistant is up before we claim it is.
                thread::sleep(Duration::from_secs(2));
                println!("Jarvis is running in the background.");
            }
            // Non-fatal: the task stays registered and fires at next logon.
            Err(e) => safe_eprintln!("{e:#}"),
        }
    } else {
        println!("Jarvis will start automatically at your next logon.");
    }

    Ok(())
}

#[cfg(not(windows))]
fn run(_dir: &Path) -> Result<()> {
    Err(anyhow::anyhow!(
        "E_UNSUPPORTED_PLATFORM: the task scheduler integration requires Windows"
    ))
}

/// Directory holding the assistant's `main.py`. `JARVIS_HOME` overrides; the
/// default is the directory the installer is run from.
#[cfg(windows)]
fn jarvis_home() -> Result<std::path::PathBuf> {
    use anyhow::Context;

    if let Ok(raw) = std::env::var("JARVIS_HOME") {
        let t = raw.trim();
        if !t.is_empty() {
            return Ok(std::path::PathBuf::from(t));
        }
    }
    std::env::current_dir().context("resolve current directory failed")
}

/// Blocking Y/N prompt. Only an explicit `y`/`Y` means yes; anything else,
/// including a read failure, is treated as "No".
#[cfg(windows)]
fn confirm_start() -> bool {
    use std::io::{self, BufRead, Write};

    print!("Start Jarvis now? (Y/N): ");
    let _ = io::stdout().flush();

    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    line.trim().eq_ignore_ascii_case("y")
}
