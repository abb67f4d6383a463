// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Post-processing of output produced by the Speedy front end.
//!
//! Speedy runs WP itself and prints one line per goal, so there is no goal/result pairing to
//! do here. Its lines come in three shapes: WP goal results tagged `(FramacWp)`, problems
//! relayed from the Frama-C kernel, and messages of Speedy's own syntax and type checker.

use crate::reporter::Reporter;
use crate::wp_output::{LineSource, WpOutputError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::debug;
use wp_metadata::FindingClass;

const FRAMAC_WP_MARKER: &str = "(FramacWp)";
const RESULT_PREFIX: &str = "result for goal for function";

static FILE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S+):(\d+):").unwrap());
static PROBLEM_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+):(\[wp\] warning|\[kernel\] warning):(.*)").unwrap());
static PROBLEM_ERROR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+):(\[kernel\] user error|\[kernel\] failure):(.*)").unwrap());
static CHECKER_MESSAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+):(\d+):(\d+)-(\d+):(.*)").unwrap());

/// Line counts of one processed Speedy stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpeedySummary {
    pub lines: usize,
    pub satisfied: usize,
    pub violations: usize,
    pub problems: usize,
    pub checker_messages: usize,
    pub unparsed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpeedyLine {
    Satisfied,
    Violation,
    Problem,
    CheckerMessage,
    Unparsed,
}

pub fn process_speedy_output<R: BufRead>(
    input: R,
    raw_log: Option<&mut dyn Write>,
    reporter: &mut Reporter<'_>,
) -> Result<SpeedySummary, WpOutputError> {
    let mut source = LineSource::new(input, raw_log);
    let mut summary = SpeedySummary::default();
    while let Some(line) = source.next_line()? {
        summary.lines += 1;
        match process_line(&line, reporter) {
            SpeedyLine::Satisfied => summary.satisfied += 1,
            SpeedyLine::Violation => summary.violations += 1,
            SpeedyLine::Problem => summary.problems += 1,
            SpeedyLine::CheckerMessage => summary.checker_messages += 1,
            SpeedyLine::Unparsed => {
                debug!(line = summary.lines, text = %line, "cannot parse Speedy output line");
                summary.unparsed += 1;
            }
        }
    }
    Ok(summary)
}

fn process_line(line: &str, reporter: &mut Reporter<'_>) -> SpeedyLine {
    if let Some(kind) = goal_result(line, reporter) {
        return kind;
    }
    if problem(line, reporter) {
        return SpeedyLine::Problem;
    }
    if let Some(captures) = CHECKER_MESSAGE.captures(line) {
        if let Ok(line_number) = captures[2].parse() {
            reporter.report(
                FindingClass::ToolError,
                None,
                &captures[1],
                line_number,
                captures[5].trim(),
            );
            return SpeedyLine::CheckerMessage;
        }
    }
    SpeedyLine::Unparsed
}

/// `<file>:<line>: ... (FramacWp) result for goal for function <fn>: <status>`
fn goal_result(line: &str, reporter: &mut Reporter<'_>) -> Option<SpeedyLine> {
    let (location, result) = line.split_once(FRAMAC_WP_MARKER)?;
    let result = result.trim();
    let mut parts = result.split(':');
    let head = parts.next().unwrap_or_default();
    let status = parts.next();
    if status.is_some_and(|s| s.trim().starts_with("Satisfied")) && parts.next().is_none() {
        return Some(SpeedyLine::Satisfied);
    }

    let (file, line_number) = file_line(location)?;
    let function = head.strip_prefix(RESULT_PREFIX).map(str::trim).filter(|f| !f.is_empty());
    reporter.report(FindingClass::SpecificationViolation, function, &file, line_number, result);
    Some(SpeedyLine::Violation)
}

/// `<file>:<line>:<tag>:<message>` relayed from the Frama-C kernel or WP.
fn problem(line: &str, reporter: &mut Reporter<'_>) -> bool {
    let (captures, class) = match PROBLEM_WARNING.captures(line) {
        Some(captures) => (captures, FindingClass::SpecificationWarning),
        None => match PROBLEM_ERROR.captures(line) {
            Some(captures) => (captures, FindingClass::SpecificationError),
            None => return false,
        },
    };
    // The location must be complete for the line to count as a problem.
    let Some((file, line_number)) = file_line(&format!("{}:", &captures[1])) else {
        return false;
    };
    reporter.report(class, None, &file, line_number, captures[3].trim());
    true
}

fn file_line(text: &str) -> Option<(String, u32)> {
    let captures = FILE_LINE.captures(text)?;
    Some((captures[1].to_string(), captures[2].parse().ok()?))
}
