// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-processing of the textual output of Frama-C's WP plugin.
//!
//! The output is read in two stages. The preamble is scanned until the `Proved goals: P / T`
//! summary; the body is then fed to the [`GoalCorrelator`], which pairs every goal definition
//! with the prover result that follows it. Every line of both stages is also checked for
//! kernel/WP diagnostics.

mod call_site;
mod correlator;
mod line;
mod preamble;

pub use correlator::{GoalCorrelator, GoalTotals};
pub use preamble::scan_preamble;

use crate::diagnostics::report_tool_line;
use crate::reporter::Reporter;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Fatal outcomes of processing one output stream. All but `ToolNotFound` and `Io` are only
/// raised once the stream has been drained, so the findings filed until then stay valid.
#[derive(Debug, Error)]
pub enum WpOutputError {
    #[error("the verifier could not be started: {0}")]
    ToolNotFound(String),
    #[error("failed to read verifier output")]
    Io(#[from] io::Error),
    #[error(
        "Number of goal definitions and goal proofs does not match ({definitions} <> {results})!"
    )]
    GoalMismatch { definitions: u64, results: u64 },
    #[error("Proof result is not recognized: {verdict} (prover {prover})")]
    UnrecognizedVerdict { prover: String, verdict: String },
    #[error("goal defined on output line {line} was followed by another goal before its result")]
    UnresolvedGoal { line: usize },
    #[error(
        "Number of total goals and number of proofs does not match ({proofs} <> {advertised})!"
    )]
    TotalMismatch { proofs: u64, advertised: u64 },
}

/// Reads one line at a time, copying the exact bytes read to an optional raw log.
pub struct LineSource<'w, R> {
    reader: R,
    raw_log: Option<&'w mut dyn Write>,
    buffer: Vec<u8>,
    lines_read: usize,
}

impl<'w, R: BufRead> LineSource<'w, R> {
    pub fn new(reader: R, raw_log: Option<&'w mut dyn Write>) -> Self {
        LineSource { reader, raw_log, buffer: Vec::new(), lines_read: 0 }
    }

    /// The next line without its line terminator, or `None` at the end of the stream.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            if let Some(log) = self.raw_log.as_mut() {
                log.flush()?;
            }
            return Ok(None);
        }
        if let Some(log) = self.raw_log.as_mut() {
            log.write_all(&self.buffer)?;
        }
        self.lines_read += 1;
        let text = String::from_utf8_lossy(&self.buffer);
        Ok(Some(text.trim_end_matches(['\n', '\r']).to_string()))
    }

    pub fn lines_read(&self) -> usize {
        self.lines_read
    }
}

/// Process a complete WP output stream, filing findings through `reporter`.
///
/// Returns the goal totals when the stream is consistent: every goal definition received
/// exactly one prover result, and the number of results matches the advertised total.
pub fn process_wp_output<R: BufRead>(
    input: R,
    raw_log: Option<&mut dyn Write>,
    reporter: &mut Reporter<'_>,
) -> Result<GoalTotals, WpOutputError> {
    let mut source = LineSource::new(input, raw_log);
    let checksum = scan_preamble(&mut source, reporter)?;
    let mut correlator = GoalCorrelator::new(checksum, source.lines_read());
    loop {
        let line = match source.next_line() {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                correlator.flush(reporter);
                return Err(error.into());
            }
        };
        correlator.consume(&line, reporter);
        report_tool_line(&line, reporter);
    }
    tracing::debug!(lines = source.lines_read(), "end of verifier output");
    correlator.finish(reporter)
}
