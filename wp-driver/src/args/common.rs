// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Arguments controlling how much the driver tells about itself.
use crate::args::ValidateArgs;
use clap::error::{Error, ErrorKind};

#[derive(Debug, clap::Args)]
pub struct CommonArgs {
    /// Produce full debug information
    #[arg(long)]
    pub debug: bool,
    /// Produces no output, just an exit code and requested artifacts; overrides --verbose
    #[arg(long, short)]
    pub quiet: bool,
    /// Output processing stages, along with minor debug information
    #[arg(long, short, default_value_if("debug", "true", Some("true")))]
    pub verbose: bool,
    /// Emit log records as JSON lines on standard error
    #[arg(long)]
    pub json_logs: bool,
}

impl ValidateArgs for CommonArgs {
    fn validate(&self) -> Result<(), Error> {
        if self.quiet && self.debug {
            return Err(Error::raw(
                ErrorKind::ArgumentConflict,
                "The `--quiet` and `--debug` options cannot be used together.",
            ));
        }
        Ok(())
    }
}
