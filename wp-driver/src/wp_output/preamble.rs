// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use super::line::{is_command_not_found, proved_goals};
use super::{LineSource, WpOutputError};
use crate::diagnostics::report_tool_line;
use crate::reporter::Reporter;
use serde::Serialize;
use std::io::BufRead;
use tracing::debug;

/// The goal counts WP advertises in its `Proved goals: P / T` summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Checksum {
    pub proved: u64,
    pub total: u64,
}

/// Consume lines up to and including the summary line.
///
/// Every line is offered to the diagnostics classifier on the way. A stream that ends without
/// a summary advertises no goals at all.
pub fn scan_preamble<R: BufRead>(
    source: &mut LineSource<'_, R>,
    reporter: &mut Reporter<'_>,
) -> Result<Checksum, WpOutputError> {
    while let Some(line) = source.next_line()? {
        if is_command_not_found(&line) {
            return Err(WpOutputError::ToolNotFound(line.trim().to_string()));
        }
        report_tool_line(&line, reporter);
        if let Some((proved, total)) = proved_goals(&line) {
            debug!(proved, total, "found goal summary");
            return Ok(Checksum { proved, total });
        }
    }
    debug!("verifier output has no goal summary");
    Ok(Checksum::default())
}
