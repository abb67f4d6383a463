// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pairing goal definitions with prover results.
//!
//! WP prints a goal definition, optionally some formula text, and then exactly one prover
//! result for that goal. The correlator keeps the contextual state needed to describe the goal
//! (the enclosing function section, the clause and topic of the goal) and files a violation for
//! every goal that was not proved.
//!
//! Inconsistencies in this protocol never abort the stream: the first one is remembered and
//! returned by [`GoalCorrelator::finish`], once every line has been seen.

use super::WpOutputError;
use super::call_site::parse_call_site;
use super::line::{ClauseKind, LineEvent, LocatedGoal, recognize};
use super::preamble::Checksum;
use crate::reporter::Reporter;
use serde::Serialize;
use std::mem;
use strum_macros::{Display, EnumString};
use tracing::{debug, trace};
use wp_metadata::FindingClass;

/// Goal counts of one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GoalTotals {
    /// Goal definitions seen, located or not.
    pub definitions: u64,
    /// Prover results seen, recognized or not.
    pub results: u64,
    pub proved: u64,
    pub unproved: u64,
    /// The counts from the `Proved goals: P / T` summary.
    pub advertised_proved: u64,
    pub advertised_total: u64,
}

/// Verdicts a prover can return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
enum Verdict {
    Valid,
    Invalid,
    Unknown,
    Failed,
    Timeout,
}

impl Verdict {
    fn is_proved(self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

/// Context carried across lines. The function survives goals; the rest describes the goal
/// currently being defined and is cleared by every prover result.
#[derive(Debug, Default)]
struct ParseContext {
    current_function: Option<String>,
    topic: Option<String>,
    pre_condition: bool,
    post_condition: bool,
}

impl ParseContext {
    fn clause(&self) -> Option<ClauseKind> {
        if self.pre_condition {
            Some(ClauseKind::Pre)
        } else if self.post_condition {
            Some(ClauseKind::Post)
        } else {
            None
        }
    }

    fn reset_goal(&mut self) {
        self.topic = None;
        self.pre_condition = false;
        self.post_condition = false;
    }
}

/// Where and what a goal is, as far as a finding needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
struct GoalDefinition {
    function: Option<String>,
    file: String,
    line: u32,
    info: String,
}

/// The call a goal was instantiated for. Findings for it are attached to the call.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CallSiteDefinition {
    callee: Option<String>,
    caller: Option<String>,
    file: String,
    line: u32,
    info: String,
}

#[derive(Debug)]
struct PendingGoal {
    definition: GoalDefinition,
    call_site: Option<CallSiteDefinition>,
}

#[derive(Debug, Default)]
enum GoalState {
    #[default]
    AwaitingGoal,
    /// `goal` is `None` for definitions that cannot be reported, such as lemmas.
    GoalOpen { opened_at: usize, goal: Option<PendingGoal> },
}

/// A violation held back until the next line shows whether the prover left an error message.
#[derive(Debug)]
struct StagedFinding {
    function: Option<String>,
    file: String,
    line: u32,
    message: String,
}

pub struct GoalCorrelator {
    context: ParseContext,
    state: GoalState,
    totals: GoalTotals,
    staged: Vec<StagedFinding>,
    error: Option<WpOutputError>,
    /// Number of the last line consumed, counted from the start of the stream.
    line_number: usize,
}

impl GoalCorrelator {
    /// A correlator for the lines following the preamble, which took `preamble_lines` lines.
    pub fn new(checksum: Checksum, preamble_lines: usize) -> Self {
        GoalCorrelator {
            context: ParseContext::default(),
            state: GoalState::AwaitingGoal,
            totals: GoalTotals {
                advertised_proved: checksum.proved,
                advertised_total: checksum.total,
                ..Default::default()
            },
            staged: Vec::new(),
            error: None,
            line_number: preamble_lines,
        }
    }

    pub fn consume(&mut self, line: &str, reporter: &mut Reporter<'_>) {
        self.line_number += 1;
        let detail = line.trim();
        self.flush_staged(detail.starts_with("Error:").then_some(detail), reporter);
        for event in recognize(line) {
            trace!(line = self.line_number, ?event, "apply line event");
            self.apply(event, reporter);
        }
    }

    /// Check the stream for consistency once the last line has been consumed.
    pub fn finish(mut self, reporter: &mut Reporter<'_>) -> Result<GoalTotals, WpOutputError> {
        self.flush_staged(None, reporter);
        if let GoalState::GoalOpen { opened_at, .. } = self.state {
            debug!(opened_at, "stream ended while a goal was open");
        }
        if let Some(error) = self.error {
            return Err(error);
        }
        let totals = self.totals;
        if totals.definitions != totals.results {
            return Err(WpOutputError::GoalMismatch {
                definitions: totals.definitions,
                results: totals.results,
            });
        }
        if totals.proved + totals.unproved != totals.advertised_total {
            return Err(WpOutputError::TotalMismatch {
                proofs: totals.proved + totals.unproved,
                advertised: totals.advertised_total,
            });
        }
        Ok(totals)
    }

    /// File the violations still waiting for a possible `Error:` line. Used when the stream
    /// ends without reaching [`GoalCorrelator::finish`].
    pub fn flush(&mut self, reporter: &mut Reporter<'_>) {
        self.flush_staged(None, reporter);
    }

    fn apply(&mut self, event: LineEvent, reporter: &mut Reporter<'_>) {
        match event {
            LineEvent::SectionHeader(function) => self.context.current_function = Some(function),
            LineEvent::ClauseMarker(ClauseKind::Pre) => self.context.pre_condition = true,
            LineEvent::ClauseMarker(ClauseKind::Post) => self.context.post_condition = true,
            LineEvent::GoalTopic(topic) => {
                if self.context.topic.is_none() {
                    self.context.topic = Some(topic);
                }
            }
            LineEvent::LocatedGoal(goal) => {
                let pending = self.pending_goal(goal);
                self.open_goal(Some(pending), reporter);
            }
            LineEvent::UnlocatedGoal(kind) => {
                debug!(kind = %kind.describe(), "goal without a reportable location");
                self.open_goal(None, reporter);
            }
            LineEvent::ProverResult { prover, verdict } => self.close_goal(prover, verdict),
        }
    }

    fn pending_goal(&self, goal: LocatedGoal) -> PendingGoal {
        let function = goal.function.or_else(|| self.context.current_function.clone());
        let clause = self.context.clause();

        let topic = match &self.context.topic {
            Some(topic) if !topic.is_empty() => topic.clone(),
            _ => goal.text,
        };
        let info = match clause {
            Some(kind)
                if !topic.contains(ClauseKind::Pre.label())
                    && !topic.contains(ClauseKind::Post.label()) =>
            {
                format!("{} {topic}", kind.label())
            }
            _ => topic,
        };

        let call_site = parse_call_site(&goal.trailer).map(|site| {
            let qualifier = clause.map_or("Goal", |kind| kind.label());
            let callee = function.clone();
            let mut info = format!("{qualifier} of {}", callee.as_deref().unwrap_or_default());
            if let Some(caller) = &site.caller {
                info.push_str(&format!(" in call from '{caller}'"));
            }
            CallSiteDefinition {
                callee,
                caller: site.caller,
                file: site.file,
                line: site.line,
                info,
            }
        });

        PendingGoal {
            definition: GoalDefinition { function, file: goal.file, line: goal.line, info },
            call_site,
        }
    }

    fn open_goal(&mut self, goal: Option<PendingGoal>, reporter: &mut Reporter<'_>) {
        if let GoalState::GoalOpen { opened_at, goal: stale } = mem::take(&mut self.state) {
            self.supersede(opened_at, stale, reporter);
        }
        self.totals.definitions += 1;
        self.state = GoalState::GoalOpen { opened_at: self.line_number, goal };
    }

    /// A goal was defined before the previous one received its result.
    fn supersede(
        &mut self,
        opened_at: usize,
        stale: Option<PendingGoal>,
        reporter: &mut Reporter<'_>,
    ) {
        debug!(opened_at, line = self.line_number, "goal superseded before its prover result");
        if let Some(PendingGoal { definition, .. }) = stale {
            let message = format!(
                "goal for function {} has no prover result: {}",
                definition.function.as_deref().unwrap_or_default(),
                definition.info
            );
            reporter.report(
                FindingClass::ToolError,
                definition.function.as_deref(),
                &definition.file,
                definition.line,
                &message,
            );
        }
        self.record(WpOutputError::UnresolvedGoal { line: opened_at });
    }

    fn close_goal(&mut self, prover: String, verdict: String) {
        self.totals.results += 1;
        let goal = match mem::take(&mut self.state) {
            GoalState::GoalOpen { goal, .. } => goal,
            GoalState::AwaitingGoal => None,
        };

        match verdict.parse::<Verdict>() {
            Ok(parsed) if parsed.is_proved() => self.totals.proved += 1,
            Ok(parsed) => {
                self.totals.unproved += 1;
                if let Some(goal) = goal {
                    self.stage(goal, parsed);
                }
            }
            Err(_) => {
                debug!(%prover, %verdict, "unrecognized prover verdict");
                self.record(WpOutputError::UnrecognizedVerdict { prover, verdict });
            }
        }

        if self.totals.results != self.totals.definitions {
            self.record(WpOutputError::GoalMismatch {
                definitions: self.totals.definitions,
                results: self.totals.results,
            });
        }
        self.context.reset_goal();
    }

    fn stage(&mut self, goal: PendingGoal, verdict: Verdict) {
        let PendingGoal { definition, call_site } = goal;
        self.staged.push(StagedFinding {
            message: format!(
                "result for goal for function {}: Violated {} - {verdict}",
                definition.function.as_deref().unwrap_or_default(),
                definition.info
            ),
            function: definition.function,
            file: definition.file,
            line: definition.line,
        });
        if let Some(site) = call_site {
            self.staged.push(StagedFinding {
                message: format!(
                    "result for goal for function {}: Violated {} - {verdict}",
                    site.callee.as_deref().unwrap_or_default(),
                    site.info
                ),
                function: site.caller.or(site.callee),
                file: site.file,
                line: site.line,
            });
        }
    }

    fn flush_staged(&mut self, detail: Option<&str>, reporter: &mut Reporter<'_>) {
        for staged in self.staged.drain(..) {
            let message = match detail {
                Some(detail) => format!("{} ({detail})", staged.message),
                None => staged.message,
            };
            reporter.report(
                FindingClass::SpecificationViolation,
                staged.function.as_deref(),
                &staged.file,
                staged.line,
                &message,
            );
        }
    }

    /// Remember a protocol inconsistency. Only the first one is reported.
    fn record(&mut self, error: WpOutputError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}
