use std::fmt::Write as _;
use std::time::Duration;

use crate::task_spec::{RunLevel, TaskSpecification, Trigger, Visibility};

/// Renders a specification into the Task Scheduler task-definition XML that
/// `schtasks /Create /XML` consumes. Pure string construction so the mapping
/// is testable off-host.
pub fn render(spec: &TaskSpecification) -> String {
    let mut xml = String::with_capacity(2048);
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(
        "<Task version=\"1.2\" xmlns=\"http://schemas.microsoft.com/windows/2004/02/mit/task\">\n",
    );

    let _ = writeln!(
        xml,
        "  <RegistrationInfo>\n    <Description>{}</Description>\n  </RegistrationInfo>",
        escape_xml(&spec.description)
    );

    xml.push_str("  <Triggers>\n");
    match spec.trigger {
        Trigger::AtUserLogon => {
            // No <UserId>: fires for any user logon, matching the original
            // registration.
            xml.push_str("    <LogonTrigger>\n      <Enabled>true</Enabled>\n    </LogonTrigger>\n");
        }
    }
    xml.push_str("  </Triggers>\n");

    let run_level = match spec.run_level {
        RunLevel::Standard => "LeastPrivilege",
        RunLevel::Elevated => "HighestAvailable",
    };
    let _ = writeln!(
        xml,
        "  <Principals>\n    <Principal id=\"Author\">\n      <LogonType>InteractiveToken</LogonType>\n      <RunLevel>{run_level}</RunLevel>\n    </Principal>\n  </Principals>"
    );

    // Children follow the task-definition schema sequence; schtasks rejects
    // out-of-order settings.
    let hidden = spec.visibility == Visibility::Hidden;
    xml.push_str("  <Settings>\n");
    xml.push_str("    <MultipleInstancesPolicy>IgnoreNew</MultipleInstancesPolicy>\n");
    let _ = writeln!(
        xml,
        "    <DisallowStartIfOnBatteries>{}</DisallowStartIfOnBatteries>\n    <StopIfGoingOnBatteries>{}</StopIfGoingOnBatteries>",
        !spec.power_policy.run_on_battery,
        !spec.power_policy.continue_on_battery_transition,
    );
    xml.push_str("    <StartWhenAvailable>true</StartWhenAvailable>\n");
    xml.push_str("    <Enabled>true</Enabled>\n");
    let _ = writeln!(xml, "    <Hidden>{hidden}</Hidden>");
    // PT0S: the assistant is a resident process, never time-limited.
    xml.push_str("    <ExecutionTimeLimit>PT0S</ExecutionTimeLimit>\n");
    let _ = writeln!(
        xml,
        "    <RestartOnFailure>\n      <Interval>{}</Interval>\n      <Count>{}</Count>\n    </RestartOnFailure>",
        iso8601_interval(spec.restart_policy.restart_interval),
        spec.restart_policy.max_restarts,
    );
    xml.push_str("  </Settings>\n");

    xml.push_str("  <Actions Context=\"Author\">\n    <Exec>\n");
    let _ = writeln!(
        xml,
        "      <Command>{}</Command>",
        escape_xml(&spec.executable_path.display().to_string())
    );
    let _ = writeln!(
        xml,
        "      <Arguments>{}</Arguments>",
        escape_xml(&join_arguments(&spec.arguments))
    );
    let _ = writeln!(
        xml,
        "      <WorkingDirectory>{}</WorkingDirectory>",
        escape_xml(&spec.working_directory.display().to_string())
    );
    xml.push_str("    </Exec>\n  </Actions>\n");

    xml.push_str("</Task>\n");
    xml
}

fn join_arguments(args: &[String]) -> String {
    let quoted: Vec<String> = args
        .iter()
        .map(|a| {
            if a.contains(' ') {
                format!("\"{a}\"")
            } else {
                a.clone()
            }
        })
        .collect();
    quoted.join(" ")
}

fn iso8601_interval(d: Duration) -> String {
    let secs = d.as_secs().max(1);
    if secs % 60 == 0 {
        format!("PT{}M", secs / 60)
    } else {
        format!("PT{secs}S")
    }
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_spec::{PowerPolicy, RestartPolicy};
    use std::path::PathBuf;

    fn sample_spec() -> TaskSpecification {
        TaskSpecification {
            name: "Jarvis AI Assistant".to_string(),
            description: "Launches the Jarvis assistant in wake-word mode at user logon"
                .to_string(),
            executable_path: PathBuf::from(r"C:\Py\python.exe"),
            arguments: vec![r"C:\App\main.py".to_string(), "--wake".to_string()],
            working_directory: PathBuf::from(r"C:\App"),
            trigger: Trigger::AtUserLogon,
            visibility: Visibility::Visible,
            restart_policy: RestartPolicy {
                max_restarts: 3,
                restart_interval: Duration::from_secs(60),
            },
            run_level: RunLevel::Elevated,
            power_policy: PowerPolicy {
                run_on_battery: true,
                continue_on_battery_transition: true,
            },
        }
    }

    #[test]
    fn renders_exec_action_and_logon_trigger() {
        let xml = render(&sample_spec());
        assert!(xml.contains(r"<Command>C:\Py\python.exe</Command>"));
        assert!(xml.contains(r"<Arguments>C:\App\main.py --wake</Arguments>"));
        assert!(xml.contains(r"<WorkingDirectory>C:\App</WorkingDirectory>"));
        assert!(xml.contains("<LogonTrigger>"));
        assert!(xml.contains("<RunLevel>HighestAvailable</RunLevel>"));
    }

    #[test]
    fn renders_restart_and_power_policy() {
        let xml = render(&sample_spec());
        assert!(xml.contains("<Count>3</Count>"));
        assert!(xml.contains("<Interval>PT1M</Interval>"));
        assert!(xml.contains("<DisallowStartIfOnBatteries>false</DisallowStartIfOnBatteries>"));
        assert!(xml.contains("<StopIfGoingOnBatteries>false</StopIfGoingOnBatteries>"));
    }

    #[test]
    fn visibility_maps_to_hidden_flag() {
        let mut spec = sample_spec();
        assert!(render(&spec).contains("<Hidden>false</Hidden>"));
        spec.visibility = Visibility::Hidden;
        assert!(render(&spec).contains("<Hidden>true</Hidden>"));
    }

    #[test]
    fn standard_run_level_maps_to_least_privilege() {
        let mut spec = sample_spec();
        spec.run_level = RunLevel::Standard;
        assert!(render(&spec).contains("<RunLevel>LeastPrivilege</RunLevel>"));
    }

    #[test]
    fn quotes_arguments_with_spaces_and_escapes_markup() {
        let mut spec = sample_spec();
        spec.arguments = vec![r"C:\My App\main.py".to_string(), "--wake".to_string()];
        spec.description = "starts <Jarvis> & friends".to_string();
        let xml = render(&spec);
        assert!(xml.contains(r#"<Arguments>&quot;C:\My App\main.py&quot; --wake</Arguments>"#));
        assert!(xml.contains("<Description>starts &lt;Jarvis&gt; &amp; friends</Description>"));
    }

    #[test]
    fn odd_intervals_render_in_seconds() {
        let mut spec = sample_spec();
        spec.restart_policy.restart_interval = Duration::from_secs(90);
        assert!(render(&spec).contains("<Interval>PT90S</Interval>"));
    }
}
