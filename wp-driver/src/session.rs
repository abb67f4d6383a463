// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Module used to configure a driver session.

use crate::args::WpDriverArgs;
use crate::args::common::CommonArgs;
use crate::reporter::UnlistedFiles;
use crate::source_index::{ManifestIndex, SourceIndex};
use crate::util::warning;
use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::{EnvFilter, Registry, filter::Directive, layer::SubscriberExt};

/// Environment variable used to control this session log tracing.
const LOG_ENV_VAR: &str = "WP_DRIVER_LOG";

/// Contains information about the execution environment and arguments that affect operations
pub struct WpSession {
    /// The command-line arguments
    pub args: WpDriverArgs,
    /// Where findings are anchored
    pub index: ManifestIndex,
}

impl WpSession {
    pub fn new(args: WpDriverArgs) -> Result<Self> {
        init_logger(&args.common_opts)?;
        debug!(config = ?args.config, inputs = args.inputs.len(), "start session");

        let working_dir = match &args.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("Failed to determine the current directory")?,
        };
        let index = match &args.index {
            Some(path) => ManifestIndex::from_file(path, &working_dir)?,
            None => {
                if !args.common_opts.quiet && !args.keep_unlisted_files {
                    warning(
                        "No source index was given (`--index`). Findings will be dropped unless \
                        `--keep-unlisted-files` is used",
                    );
                }
                ManifestIndex::empty(&working_dir.to_string_lossy())
            }
        };
        debug!(files = index.len(), working_dir = index.working_dir(), "source index");
        if args.index.is_some() && index.is_empty() && !args.common_opts.quiet {
            warning("The source index lists no files");
        }

        if let Some(dir) = &args.raw_log_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create raw log directory {}", dir.display()))?;
        }

        Ok(WpSession { args, index })
    }

    pub fn unlisted_files(&self) -> UnlistedFiles {
        if self.args.keep_unlisted_files && !self.args.no_keep_unlisted_files {
            UnlistedFiles::Keep
        } else {
            UnlistedFiles::Drop
        }
    }
}

/// Initialize the logger using the WP_DRIVER_LOG environment variable and the verbosity flags.
/// Logs always go to standard error, so they never mix with the report.
fn init_logger(args: &CommonArgs) -> Result<()> {
    let filter = EnvFilter::from_env(LOG_ENV_VAR);
    let filter = if args.debug {
        filter.add_directive("wp_driver=debug".parse::<Directive>()?)
    } else if args.verbose && !args.quiet {
        filter.add_directive("wp_driver=info".parse::<Directive>()?)
    } else {
        filter
    };

    if args.json_logs { json_logs(filter) } else { fmt_logs(filter) }
}

/// Configure global logger to use a json logger.
fn json_logs(filter: EnvFilter) -> Result<()> {
    use tracing_subscriber::fmt::layer;
    let subscriber =
        Registry::default().with(filter).with(layer().json().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Configure global logger to use the human readable formatter.
fn fmt_logs(filter: EnvFilter) -> Result<()> {
    use tracing_subscriber::fmt::layer;
    let subscriber = Registry::default()
        .with(filter)
        .with(layer().with_writer(std::io::stderr).with_target(true));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
