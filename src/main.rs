//! NewCrc: verifies files against a checksum manifest.
//!
//! Thin binary entry point. All verification logic lives in the
//! `newcrc-core` crate; this file only starts a run in the working
//! directory, prints its events, and renders the final report.

use anyhow::Context;
use newcrc_core::{
    CounterSnapshot, LogSeverity, RunSummary, VerifyConfig, VerifyEvent, VerifyHandle,
};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::atomic::Ordering;
use std::thread;

/// Optional settings file, read from the working directory.
const CONFIG_FILE: &str = "newcrc.json";

/// Width the transient progress line is padded to so shorter lines fully
/// overwrite longer ones.
const STATUS_WIDTH: usize = 78;

fn main() -> anyhow::Result<()> {
    // Diagnostics go to stderr; stdout carries the run output.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(io::stderr)
        .init();

    tracing::info!("NewCrc starting");

    let config = load_config()?;
    let mut handle = newcrc_core::start_verification(config);
    spawn_cancel_listener(&handle);

    println!("Press Enter to cancel.");
    let outcome = drain_events(&handle);
    handle.join();

    match outcome {
        Some(RunEnd::Complete(summary, counters)) => {
            print_report(&summary, &counters);
            Ok(())
        }
        Some(RunEnd::Failed(reason)) => anyhow::bail!(reason),
        None => anyhow::bail!("verification stopped without a result"),
    }
}

fn load_config() -> anyhow::Result<VerifyConfig> {
    let path = Path::new(CONFIG_FILE);
    if !path.exists() {
        return Ok(VerifyConfig::default());
    }
    let config = VerifyConfig::load_json(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!("Loaded settings from {}", path.display());
    Ok(config)
}

/// Cancel the run when the user presses Enter.
///
/// The thread is detached; if the run ends first it is still blocked on
/// stdin and simply exits with the process.
fn spawn_cancel_listener(handle: &VerifyHandle) {
    let cancel = handle.cancel_token();
    let spawned = thread::Builder::new()
        .name("newcrc-stdin".into())
        .spawn(move || {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line).unwrap_or(0) > 0 {
                cancel.store(true, Ordering::Relaxed);
            }
        });
    if let Err(err) = spawned {
        tracing::warn!("Cancel on Enter unavailable: {err}");
    }
}

enum RunEnd {
    Complete(RunSummary, CounterSnapshot),
    Failed(String),
}

/// Print events until the run ends or the channel closes.
fn drain_events(handle: &VerifyHandle) -> Option<RunEnd> {
    let mut status_visible = false;
    let mut files_done = 0;
    let mut files_total = 0;

    while let Ok(event) = handle.events_rx.recv() {
        match event {
            VerifyEvent::FileProgress {
                file_name,
                percent,
                speed_mbps,
            } => {
                let status = format!(
                    "[{files_done}/{files_total}] {file_name} {percent:>3}% {speed_mbps:.2} MB/s"
                );
                print!("\r{status:<STATUS_WIDTH$}");
                let _ = io::stdout().flush();
                status_visible = true;
            }
            VerifyEvent::GlobalProgress {
                files_done: done,
                files_total: total,
            } => {
                files_done = done;
                files_total = total;
            }
            VerifyEvent::LogLine { text, severity } => {
                if status_visible {
                    print!("\r{:<STATUS_WIDTH$}\r", "");
                    status_visible = false;
                }
                println!("{}", paint(&text, severity));
            }
            VerifyEvent::RunComplete { summary, counters } => {
                if status_visible {
                    println!();
                }
                return Some(RunEnd::Complete(summary, counters));
            }
            VerifyEvent::RunFailed { reason } => {
                if status_visible {
                    println!();
                }
                return Some(RunEnd::Failed(reason));
            }
        }
    }
    None
}

/// ANSI colour per severity.
fn paint(text: &str, severity: LogSeverity) -> String {
    let code = match severity {
        LogSeverity::Info => return text.to_string(),
        LogSeverity::Success => "32",
        LogSeverity::Warning => "33",
        LogSeverity::Error => "31",
    };
    format!("\x1b[{code}m{text}\x1b[0m")
}

fn print_report(summary: &RunSummary, counters: &CounterSnapshot) {
    print!("{}", render_report(summary, counters));
}

/// Final report. A cancelled run has no meaningful totals, so it gets only
/// the cancel notice.
fn render_report(summary: &RunSummary, counters: &CounterSnapshot) -> String {
    if summary.was_canceled {
        return "\nCanceled by user.\n".to_string();
    }

    let total = summary.total_files;
    let line = |label: &str, count: usize| {
        format!(
            "{label:<18}{count} ({:.2}%)\n",
            CounterSnapshot::percent_of(count, total)
        )
    };

    let mut out = String::from("\n");
    out.push_str(&format!("{:<18}{total}\n", "Files:"));
    out.push_str(&line("[OK] Valid:", counters.ok));
    out.push_str(&line("[ERR] Corrupted:", counters.corrupted));
    out.push_str(&line("[?] Missing:", counters.missing));
    out.push('\n');
    out.push_str(&format!("Completed ({} sec)\n", summary.elapsed_seconds));
    out
}
