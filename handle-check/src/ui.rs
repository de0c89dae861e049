//! Terminal display logic for the handle-check CLI.
//!
//! Colored result lines for interactive stdout, plus the header and summary
//! that verbose runs print on stderr so piped output stays clean.

use console::{style, Term};
use handle_check_lib::{CheckConfig, HandleResult, ResultSink, RunSummary};
use std::io;
use std::time::Duration;

// ── Result lines ─────────────────────────────────────────────────────────────

/// Result sink for an interactive terminal.
///
/// Prints the same lines as the plain reporter, colored by status.
pub struct ConsoleReporter {
    term: Term,
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            term: Term::stdout(),
            verbose,
        }
    }
}

impl ResultSink for ConsoleReporter {
    fn report(&mut self, result: &HandleResult) -> io::Result<()> {
        match styled_line(result, self.verbose) {
            Some(line) => self.term.write_line(&line),
            None => Ok(()),
        }
    }

    fn finish(&mut self) -> io::Result<()> {
        self.term.flush()
    }
}

fn styled_line(result: &HandleResult, verbose: bool) -> Option<String> {
    if verbose {
        let status = if result.available {
            style(result.status()).green().bold()
        } else {
            style(result.status()).red()
        };
        Some(format!(
            "{} {} is {}",
            style(format!("[{}]", result.worker_id)).dim(),
            style(&result.name).white(),
            status,
        ))
    } else if result.available {
        Some(style(&result.name).green().to_string())
    } else {
        None
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a verbose run.
pub fn print_header(seed: &str, candidate_count: usize, config: &CheckConfig) {
    eprintln!(
        "{} {} {}",
        style("handle-check").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- {} candidate{} from '{}'",
            candidate_count,
            if candidate_count == 1 { "" } else { "s" },
            seed
        ))
        .dim(),
    );

    let meta_parts = [
        format!("Workers: {}", config.workers),
        format!("Sleep: {}ms", config.delay.as_millis()),
        format!("Endpoint: {}", config.endpoint),
    ];
    eprintln!("{}", style(meta_parts.join(" | ")).dim());
    eprintln!();
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(summary: &RunSummary, duration: Duration) {
    eprintln!(
        "{}",
        style("────────────────────────────────────────────────────").dim()
    );
    eprintln!(
        "{} name{} in {}  {}  {}  {}  {}",
        style(summary.checked).bold(),
        if summary.checked == 1 { "" } else { "s" },
        format_duration(duration),
        style("|").dim(),
        style(format!("{} available", summary.available)).green(),
        style("|").dim(),
        style(format!("{} unavailable", summary.unavailable)).red(),
    );
}

/// Human-readable duration: `850ms`, `12.3s`, `4m 05s`.
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {:02}s", secs / 60, secs % 60)
    } else if secs >= 1 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
