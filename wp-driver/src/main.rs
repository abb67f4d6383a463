// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
use std::ffi::OsString;
use std::process::ExitCode;

use anyhow::Result;

use args::check_is_valid;
use args_toml::join_args;

use crate::session::WpSession;
use crate::unit_runner::UnitRunner;
use clap::Parser;
use tracing::debug;

mod args;
mod args_toml;
mod diagnostics;
mod render;
mod reporter;
mod session;
mod source_index;
mod speedy_output;
mod unit_runner;
mod util;
mod wp_output;

/// The main function for the `wp-driver`.
/// Every input is the recorded output of the verifier for one compilation unit. Findings are
/// printed, and exported if requested; the exit code only reports units that failed to process.
fn main() -> ExitCode {
    let result = wp_driver_main(Vec::from_iter(std::env::args_os()));

    if let Err(error) = result {
        debug!(?error, "main_failure");
        util::error(&format!("{error:#}"));
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn wp_driver_main(input_args: Vec<OsString>) -> Result<()> {
    let input_args = join_args(input_args)?;
    let args = args::WpDriverArgs::parse_from(input_args);
    check_is_valid(&args);
    let session = WpSession::new(args)?;

    let runner = UnitRunner { sess: &session };
    let results = runner.check_all_units(&session.args.inputs)?;
    debug!(units = results.len(), "processed all units");

    session.print_final_summary(&results)
}
