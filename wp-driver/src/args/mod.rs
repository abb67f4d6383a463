// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Module that defines the command line interface of `wp-driver`.

pub mod common;

use self::common::*;
use clap::{ValueEnum, error::Error, error::ErrorKind};
use std::path::{Path, PathBuf};

/// The input name that stands for standard input.
pub const STDIN_INPUT: &str = "-";

/// Trait used to perform extra validation after parsing.
pub trait ValidateArgs {
    /// Perform post-parsing validation but do not abort.
    fn validate(&self) -> Result<(), Error>;
}

/// Validate a set of arguments and ensure they are in a valid state.
/// This method will abort execution with a user friendly error message if the state is invalid.
pub fn check_is_valid<T>(command: &T)
where
    T: clap::Parser + ValidateArgs,
{
    if let Err(error) = command.validate() {
        error.format(&mut T::command()).exit()
    }
}

#[derive(Debug, clap::Parser)]
#[command(
    version,
    name = "wp-driver",
    about = "Turn recorded Frama-C/WP output into findings attached to source files and procedures",
    args_override_self = true
)]
pub struct WpDriverArgs {
    /// Recorded verifier output, one file per compilation unit. Use `-` for standard input
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// TOML source index listing the files and procedures findings can be attached to
    #[arg(long)]
    pub index: Option<PathBuf>,
    /// Directory the verifier ran in. Relative paths in its output are resolved against it.
    /// Defaults to the current directory
    #[arg(long)]
    pub working_dir: Option<PathBuf>,
    /// Which tool produced the inputs
    #[arg(long, default_value = "wp", ignore_case = true, value_enum)]
    pub input_format: InputFormat,
    /// Keep a verbatim copy of every input in this directory
    #[arg(long)]
    pub raw_log_dir: Option<PathBuf>,

    /// Format of the console report
    #[arg(long, default_value = "regular", ignore_case = true, value_enum)]
    pub output_format: OutputFormat,
    /// Also write all findings and goal totals to this file, as JSON
    #[arg(long)]
    pub json_output: Option<PathBuf>,
    /// Keep findings in files missing from the source index instead of dropping them
    #[arg(long, overrides_with = "no_keep_unlisted_files")]
    pub keep_unlisted_files: bool,
    #[arg(long, hide = true, overrides_with = "keep_unlisted_files")]
    pub no_keep_unlisted_files: bool,

    /// Number of inputs processed in parallel. Defaults to the number of available cores
    #[arg(short, long)]
    pub jobs: Option<usize>,
    /// Read default flags from the `[wp-driver.flags]` table of this TOML file.
    /// Without it, `wp-driver.toml` in the current directory is used when present
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub common_opts: CommonArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum InputFormat {
    /// Output of `frama-c -wp` itself.
    Wp,
    /// Output of the Speedy front end.
    Speedy,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum OutputFormat {
    /// Every finding, one line per unit, and the summary table.
    Regular,
    /// Only the summary table.
    Terse,
}

pub fn is_stdin(input: &Path) -> bool {
    input.as_os_str() == STDIN_INPUT
}

impl ValidateArgs for WpDriverArgs {
    fn validate(&self) -> Result<(), Error> {
        self.common_opts.validate()?;
        if self.inputs.iter().filter(|input| is_stdin(input)).count() > 1 {
            return Err(Error::raw(
                ErrorKind::ArgumentConflict,
                "Standard input (`-`) can only be given once.",
            ));
        }
        if self.jobs == Some(0) {
            return Err(Error::raw(
                ErrorKind::ValueValidation,
                "The number of jobs must be at least 1.",
            ));
        }
        if let Some(input) = self.inputs.iter().find(|input| !is_stdin(input) && input.is_dir()) {
            return Err(Error::raw(
                ErrorKind::InvalidValue,
                format!("Invalid input: `{}` is a directory.", input.display()),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(args: &str) -> Result<WpDriverArgs, Error> {
        WpDriverArgs::try_parse_from(format!("wp-driver {args}").split_whitespace())
    }

    #[test]
    fn check_arg_parsing() {
        let args = parse("a.log b.log --index wp-index.toml -j 2 --input-format speedy").unwrap();
        assert_eq!(args.inputs, vec![PathBuf::from("a.log"), PathBuf::from("b.log")]);
        assert_eq!(args.index, Some(PathBuf::from("wp-index.toml")));
        assert_eq!(args.jobs, Some(2));
        assert_eq!(args.input_format, InputFormat::Speedy);
        assert_eq!(args.output_format, OutputFormat::Regular);
        assert!(!args.keep_unlisted_files);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn check_inputs_are_required() {
        let err = parse("--index wp-index.toml").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn check_debug_implies_verbose() {
        let args = parse("a.log --debug").unwrap();
        assert!(args.common_opts.verbose);
        let err = parse("a.log --debug --quiet").unwrap().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn check_stdin_only_once() {
        assert!(parse("- a.log").unwrap().validate().is_ok());
        let err = parse("- a.log -").unwrap().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn check_zero_jobs_fails() {
        let err = parse("a.log --jobs 0").unwrap().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn check_directory_input_fails() {
        let err = parse(".").unwrap().validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn check_later_flag_wins() {
        let args = parse("a.log --keep-unlisted-files --no-keep-unlisted-files").unwrap();
        assert!(!args.keep_unlisted_files);
        let args = parse("a.log --no-keep-unlisted-files --keep-unlisted-files").unwrap();
        assert!(args.keep_unlisted_files);
        let args = parse("a.log --output-format terse --output-format regular").unwrap();
        assert_eq!(args.output_format, OutputFormat::Regular);
    }
}
