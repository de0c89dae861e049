//! Result collection and line-oriented reporting.
//!
//! The collector is the single consumer of the result channel. It drains
//! exactly as many messages as there are candidates and hands each result
//! to a [`ResultSink`].

use crate::concurrent::{CancelFlag, WorkerMessage};
use crate::error::HandleCheckError;
use crate::types::{HandleResult, OutputFormat, RunSummary};
use std::io::{self, Write};
use tokio::sync::mpsc;

/// Destination for results as they arrive.
pub trait ResultSink {
    /// Called once per result, in arrival order.
    fn report(&mut self, result: &HandleResult) -> io::Result<()>;

    /// Called once after the last result.
    fn finish(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Format a result as a text line, or `None` when it should not be shown.
///
/// Verbose mode shows every result as `[worker] name is status`; terse mode
/// shows only available names.
pub fn format_line(result: &HandleResult, verbose: bool) -> Option<String> {
    if verbose {
        Some(format!(
            "[{}] {} is {}",
            result.worker_id,
            result.name,
            result.status()
        ))
    } else if result.available {
        Some(result.name.clone())
    } else {
        None
    }
}

/// Writes one line per displayed result to any `io::Write`.
#[derive(Debug)]
pub struct LineReporter<W: Write> {
    writer: W,
    verbose: bool,
    format: OutputFormat,
}

impl LineReporter<io::Stdout> {
    /// Reporter writing to standard output.
    pub fn stdout(verbose: bool, format: OutputFormat) -> Self {
        Self::new(io::stdout(), verbose, format)
    }
}

impl<W: Write> LineReporter<W> {
    pub fn new(writer: W, verbose: bool, format: OutputFormat) -> Self {
        Self {
            writer,
            verbose,
            format,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResultSink for LineReporter<W> {
    fn report(&mut self, result: &HandleResult) -> io::Result<()> {
        if !self.verbose && !result.available {
            return Ok(());
        }

        match self.format {
            OutputFormat::Text => {
                if let Some(line) = format_line(result, self.verbose) {
                    writeln!(self.writer, "{}", line)?;
                }
            }
            OutputFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, result)?;
                writeln!(self.writer)?;
            }
        }

        // Results stream to an interactive user
        self.writer.flush()
    }

    fn finish(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Drain exactly `total` messages from the result channel.
///
/// Returns as soon as the expected count has arrived, without waiting for
/// the workers to exit.
///
/// # Errors
///
/// - the first error a worker forwards (fatal oracle failure)
/// - `Cancelled` if the flag is raised while waiting
/// - `ConduitClosed` if every sender is gone before `total` results arrived
/// - I/O errors from the sink
pub async fn collect_results<S: ResultSink + ?Sized>(
    results: &mut mpsc::Receiver<WorkerMessage>,
    total: usize,
    sink: &mut S,
    cancel: &CancelFlag,
) -> Result<RunSummary, HandleCheckError> {
    let mut summary = RunSummary::default();

    for received in 0..total {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(HandleCheckError::Cancelled { received, expected: total });
            }
            message = results.recv() => message,
        };

        match message {
            Some(Ok(result)) => {
                summary.record(&result);
                sink.report(&result)?;
            }
            Some(Err(e)) => return Err(e),
            None => {
                return Err(HandleCheckError::ConduitClosed {
                    received,
                    expected: total,
                })
            }
        }
    }

    sink.finish()?;
    Ok(summary)
}
