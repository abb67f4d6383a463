// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Console and JSON reports of a run.

use anyhow::{Context, Result, bail};
use comfy_table::Table;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::Path;
use strum::IntoEnumIterator;
use wp_metadata::FindingClass;

use crate::args::OutputFormat;
use crate::session::WpSession;
use crate::unit_runner::{UnitOutcome, UnitResult};
use crate::util::{count_of, error, warning};

/// Set some defaults for how we format tables
fn summary_table_new() -> Table {
    use comfy_table::*;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
        .load_preset(comfy_table::presets::NOTHING)
        .set_style(TableComponent::BottomBorder, '=')
        .set_style(TableComponent::BottomBorderIntersections, '=')
        .set_style(TableComponent::TopBorder, '=')
        .set_style(TableComponent::TopBorderIntersections, '=')
        .set_style(TableComponent::HeaderLines, '-')
        .set_style(TableComponent::MiddleHeaderIntersections, '+')
        .set_style(TableComponent::VerticalLines, '|');
    table
}

/// One row per unit, with its goal counts and the number of findings of every class.
fn summary_table(results: &[UnitResult]) -> Table {
    use comfy_table::*;

    let mut table = summary_table_new();
    let mut header = vec!["Unit".to_string(), "Status".to_string(), "Goals\nproved".to_string()];
    header.extend(FindingClass::iter().map(|class| class.display_name().replace(' ', "\n")));
    header.push("Dropped".to_string());
    table.set_header(header);
    table.column_mut(0).unwrap().set_cell_alignment(CellAlignment::Left);
    table
        .column_mut(0)
        .unwrap()
        .set_constraint(ColumnConstraint::UpperBoundary(Width::Fixed(60)));
    for column in table.column_iter_mut().skip(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for result in results {
        let mut row = vec![result.unit.clone(), status(&result.outcome).to_string(), goals(result)];
        let counts = class_counts(std::slice::from_ref(result));
        row.extend(FindingClass::iter().map(|class| counts[&class].to_string()));
        row.push(result.dropped.to_string());
        table.add_row(row);
    }
    table
}

fn status(outcome: &UnitOutcome) -> &'static str {
    match outcome {
        UnitOutcome::Goals(_) | UnitOutcome::Speedy(_) => "done",
        UnitOutcome::Failed { .. } => "failed",
    }
}

fn goals(result: &UnitResult) -> String {
    match &result.outcome {
        UnitOutcome::Goals(totals) => format!("{} / {}", totals.proved, totals.results),
        UnitOutcome::Speedy(summary) => {
            format!("{} / {}", summary.satisfied, summary.satisfied + summary.violations)
        }
        UnitOutcome::Failed { .. } => "-".to_string(),
    }
}

/// Number of findings per class, with every class present.
fn class_counts(results: &[UnitResult]) -> BTreeMap<FindingClass, usize> {
    let mut counts: BTreeMap<FindingClass, usize> = FindingClass::iter().map(|c| (c, 0)).collect();
    for finding in results.iter().flat_map(|r| &r.findings) {
        *counts.entry(finding.class).or_default() += 1;
    }
    counts
}

/// The per-unit line of the regular report.
fn unit_line(result: &UnitResult) -> String {
    let findings = count_of(result.findings.len(), "finding");
    match &result.outcome {
        UnitOutcome::Goals(totals) => format!(
            "{}: {} proved, {} unproved, {findings}",
            result.unit,
            count_of(totals.proved as usize, "goal"),
            totals.unproved
        ),
        UnitOutcome::Speedy(summary) => format!(
            "{}: {} satisfied, {} violated, {findings}",
            result.unit,
            count_of(summary.satisfied, "goal"),
            summary.violations
        ),
        UnitOutcome::Failed { .. } => format!("{}: failed, {findings}", result.unit),
    }
}

/// Every finding and total of the run, as exported to `--json-output`.
fn json_report(results: &[UnitResult]) -> Result<Value> {
    let by_class: BTreeMap<String, usize> =
        class_counts(results).into_iter().map(|(class, n)| (class.to_string(), n)).collect();
    let classes: Vec<Value> = FindingClass::iter()
        .map(|class| {
            json!({
                "name": class.display_name(),
                "priority": class.priority(),
                "significance": class.significance().to_string(),
            })
        })
        .collect();
    Ok(json!({
        "classes": classes,
        "units": serde_json::to_value(results)?,
        "findings-by-class": by_class,
        "failed-units": results.iter().filter(|r| r.failed()).count(),
    }))
}

fn export_json(path: &Path, results: &[UnitResult]) -> Result<()> {
    let report = json_report(results)?;
    std::fs::write(path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write JSON report {}", path.display()))
}

impl WpSession {
    /// Concludes a session by printing the report of every unit, exporting the JSON report if
    /// requested, and failing if any unit could not be processed.
    pub(crate) fn print_final_summary(&self, results: &[UnitResult]) -> Result<()> {
        if !self.args.common_opts.quiet {
            if self.args.output_format == OutputFormat::Regular {
                for result in results {
                    for finding in &result.findings {
                        println!("{finding}");
                    }
                    if let UnitOutcome::Failed { error: message } = &result.outcome {
                        error(message);
                    }
                    println!("{}", unit_line(result));
                }
            }
            println!("{}", summary_table(results));

            let dropped: usize = results.iter().map(|r| r.dropped).sum();
            if dropped > 0 {
                warning(&format!(
                    "{} dropped because their file is not in the source index",
                    count_of(dropped, "finding")
                ));
            }
        }

        if let Some(path) = &self.args.json_output {
            export_json(path, results)?;
        }

        let failing = results.iter().filter(|r| r.failed()).count();
        if failing > 0 {
            bail!("{failing} of {} units could not be processed", results.len());
        }
        Ok(())
    }
}
