// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use wp_metadata::Finding;

use crate::args::{InputFormat, is_stdin};
use crate::reporter::{FindingCollector, Reporter};
use crate::session::WpSession;
use crate::speedy_output::{SpeedySummary, process_speedy_output};
use crate::util::{info_operation, unit_name};
use crate::wp_output::{GoalTotals, process_wp_output};

/// A UnitRunner is responsible for processing the recorded output of every compilation unit.
pub(crate) struct UnitRunner<'sess> {
    /// The underlying session
    pub sess: &'sess WpSession,
}

/// The result of processing a single unit. Findings filed before a failure are kept.
#[derive(Debug, Serialize)]
pub(crate) struct UnitResult {
    pub unit: String,
    pub input: PathBuf,
    pub findings: Vec<Finding>,
    /// Findings dropped because their file is not in the source index.
    pub dropped: usize,
    pub outcome: UnitOutcome,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub(crate) enum UnitOutcome {
    Goals(GoalTotals),
    Speedy(SpeedySummary),
    Failed { error: String },
}

impl UnitResult {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, UnitOutcome::Failed { .. })
    }
}

impl<'sess> UnitRunner<'sess> {
    /// Process every input, in parallel when allowed. Results are in input order, and a unit that
    /// fails does not stop the others.
    pub(crate) fn check_all_units(&self, inputs: &[PathBuf]) -> Result<Vec<UnitResult>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.sess.args.jobs.unwrap_or(0))
            .build()
            .context("Failed to start the worker pool")?;
        Ok(pool.install(|| inputs.par_iter().map(|input| self.check_unit(input)).collect()))
    }

    fn check_unit(&self, input: &Path) -> UnitResult {
        let unit = unit_name(input);
        if self.sess.args.common_opts.verbose && !self.sess.args.common_opts.quiet {
            info_operation("Processing", &unit);
        }

        let mut collector = FindingCollector::default();
        let mut reporter = Reporter::new(&self.sess.index, &mut collector)
            .with_unlisted_files(self.sess.unlisted_files());
        let outcome = match self.process(input, &unit, &mut reporter) {
            Ok(outcome) => outcome,
            Err(error) => {
                debug!(?error, %unit, "unit failed");
                UnitOutcome::Failed { error: format!("{error:#}") }
            }
        };
        let dropped = reporter.dropped();
        debug!(%unit, filed = reporter.filed(), dropped, "unit done");
        UnitResult {
            unit,
            input: input.to_path_buf(),
            findings: collector.findings,
            dropped,
            outcome,
        }
    }

    fn process(
        &self,
        input: &Path,
        unit: &str,
        reporter: &mut Reporter<'_>,
    ) -> Result<UnitOutcome> {
        let reader: Box<dyn BufRead> = if is_stdin(input) {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(input)
                .with_context(|| format!("Failed to open verifier output {}", input.display()))?;
            Box::new(BufReader::new(file))
        };
        let mut raw_log = self.raw_log(unit)?;
        let raw_log = raw_log.as_mut().map(|log| log as &mut dyn Write);

        let outcome = match self.sess.args.input_format {
            InputFormat::Wp => process_wp_output(reader, raw_log, reporter).map(UnitOutcome::Goals),
            InputFormat::Speedy => {
                process_speedy_output(reader, raw_log, reporter).map(UnitOutcome::Speedy)
            }
        };
        outcome.with_context(|| format!("Failed to process the verifier output of {unit}"))
    }

    /// Where the verbatim copy of `unit` goes, if one was requested.
    fn raw_log(&self, unit: &str) -> Result<Option<BufWriter<File>>> {
        let Some(dir) = &self.sess.args.raw_log_dir else {
            return Ok(None);
        };
        let path = dir.join(format!("{}.log", unit.trim_matches(['<', '>'])));
        let file = File::create(&path)
            .with_context(|| format!("Failed to create raw log {}", path.display()))?;
        Ok(Some(BufWriter::new(file)))
    }
}
