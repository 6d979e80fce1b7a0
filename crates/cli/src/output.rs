//! Output formatting for run reports

use anyhow::Result;
use serde_json::{json, Value};
use std::time::Duration;

use lockpick_common::{RunOutcome, RunReport};

/// Print the final report in the requested format.
pub fn print_results(report: &RunReport, format: &str) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "json" | "j" => println!("{}", serde_json::to_string_pretty(&report_json(report))?),
        _ => print_text(report),
    }
    Ok(())
}

fn print_text(report: &RunReport) {
    let snap = report.progress;

    println!("\n{:-<60}", "");
    match &report.outcome {
        RunOutcome::Found(password) => println!("  Password found: {}", password),
        RunOutcome::NotFound => println!("  No valid password found"),
        RunOutcome::Stopped(reason) => println!("  Stopped early: {}", reason),
    }
    println!("{:-<60}", "");
    println!("  Tried:    {}/{} ({:.1}%)", snap.processed, snap.total, snap.percent());
    if snap.errors > 0 {
        println!("  Errors:   {}", snap.errors);
    }
    println!("  Duration: {}", format_duration(report.elapsed));
    println!();
}

fn report_json(report: &RunReport) -> Value {
    let (status, password, reason) = match &report.outcome {
        RunOutcome::Found(p) => ("found", Some(p.as_str()), None),
        RunOutcome::NotFound => ("not_found", None, None),
        RunOutcome::Stopped(r) => ("stopped", None, Some(r.as_str())),
    };

    json!({
        "run_id": report.run_id.to_string(),
        "status": status,
        "password": password,
        "stop_reason": reason,
        "progress": {
            "processed": report.progress.processed,
            "total": report.progress.total,
            "errors": report.progress.errors,
        },
        "duration_seconds": report.elapsed.as_secs_f64(),
        "duration_formatted": format_duration(report.elapsed),
        "finished_at": chrono::Utc::now().to_rfc3339(),
    })
}

/// Format duration in a human-readable way
fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs == 0 {
        format!("{}ms", millis)
    } else if total_secs < 60 {
        if millis > 0 {
            format!("{}.{:03}s", total_secs, millis)
        } else {
            format!("{}s", total_secs)
        }
    } else if total_secs < 3600 {
        let (mins, secs) = (total_secs / 60, total_secs % 60);
        if secs > 0 {
            format!("{}m {}s", mins, secs)
        } else {
            format!("{}m", mins)
        }
    } else {
        let (hours, mins) = (total_secs / 3600, (total_secs % 3600) / 60);
        format!("{}h {}m", hours, mins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockpick_common::{ProgressSnapshot, StopReason};
    use uuid::Uuid;

    fn report(outcome: RunOutcome) -> RunReport {
        RunReport {
            run_id: Uuid::nil(),
            outcome,
            progress: ProgressSnapshot { processed: 3, total: 10, errors: 1 },
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn json_for_found_password() {
        let value = report_json(&report(RunOutcome::Found("hunter2".into())));
        assert_eq!(value["status"], "found");
        assert_eq!(value["password"], "hunter2");
        assert!(value["stop_reason"].is_null());
        assert_eq!(value["progress"]["processed"], 3);
        assert_eq!(value["duration_formatted"], "1.500s");
    }

    #[test]
    fn json_for_stopped_run() {
        let value = report_json(&report(RunOutcome::Stopped(StopReason::Deadline)));
        assert_eq!(value["status"], "stopped");
        assert_eq!(value["stop_reason"], "deadline");
        assert!(value["password"].is_null());
    }

    #[test]
    fn text_output_does_not_fail() {
        assert!(print_results(&report(RunOutcome::NotFound), "text").is_ok());
        assert!(print_results(&report(RunOutcome::NotFound), "json").is_ok());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_secs(5)), "5s");
        assert_eq!(format_duration(Duration::from_millis(5500)), "5.500s");
        assert_eq!(format_duration(Duration::from_secs(65)), "1m 5s");
        assert_eq!(format_duration(Duration::from_secs(120)), "2m");
        assert_eq!(format_duration(Duration::from_secs(3720)), "1h 2m");
    }
}
