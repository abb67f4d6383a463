// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use toml::Value;
use toml::value::Table;

/// The configuration file picked up from the current directory when `--config` is not given.
const DEFAULT_CONFIG: &str = "wp-driver.toml";
const FLAGS_TABLE: &str = "wp-driver.flags";

/// Insert the flags from the configuration file right after the executable name, so that flags
/// given on the command line take precedence.
pub fn join_args(input_args: Vec<OsString>) -> Result<Vec<OsString>> {
    let Some(config) = config_path(&input_args) else {
        return Ok(input_args);
    };
    let file = std::fs::read_to_string(&config)
        .with_context(|| format!("Failed to read configuration file {}", config.display()))?;
    let toml_args = toml_to_args(&file)
        .with_context(|| format!("Invalid configuration file {}", config.display()))?;
    tracing::debug!(?config, ?toml_args, "configured flags");

    let mut input_args = input_args.into_iter();
    let mut args: Vec<OsString> = input_args.next().into_iter().collect();
    args.extend(toml_args);
    args.extend(input_args);
    Ok(args)
}

/// The configuration requested with `--config <file>` or `--config=<file>`, else the default
/// one if it exists.
fn config_path(args: &[OsString]) -> Option<PathBuf> {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let arg = arg.to_string_lossy();
        if arg == "--config" {
            return iter.next().map(PathBuf::from);
        }
        if let Some(path) = arg.strip_prefix("--config=") {
            return Some(PathBuf::from(path));
        }
    }
    let default = Path::new(DEFAULT_CONFIG);
    default.is_file().then(|| default.to_path_buf())
}

/// Parse a config toml string and extract the arguments we should try injecting
fn toml_to_args(tomldata: &str) -> Result<Vec<OsString>> {
    let config = Value::Table(toml::from_str::<Table>(tomldata)?);
    // Flags come out in a stable order for a given input.
    let mut map: BTreeMap<String, Value> = BTreeMap::new();
    if let Some(val) = get_table(&config, FLAGS_TABLE) {
        map.extend(val.iter().map(|(x, y)| (x.to_owned(), y.to_owned())));
    }

    let mut args = Vec::new();
    for (flag, value) in map {
        if flag == "config" {
            bail!("`config` cannot be set from a configuration file");
        }
        insert_arg_from_toml(&flag, &value, &mut args)?;
    }
    Ok(args)
}

/// Translates one toml entry (flag, value) into arguments and inserts it into `args`
fn insert_arg_from_toml(flag: &str, value: &Value, args: &mut Vec<OsString>) -> Result<()> {
    match value {
        Value::Boolean(b) => {
            if *b {
                args.push(format!("--{flag}").into());
            } else if flag.starts_with("no-") {
                bail!("{flag} disables a disabling flag. Just enable the flag instead.");
            } else {
                args.push(format!("--no-{flag}").into());
            }
        }
        Value::Array(a) => {
            args.push(format!("--{flag}").into());
            for arg in a {
                let Some(arg) = arg.as_str() else {
                    bail!("flag {flag} contains non-string values");
                };
                args.push(arg.into());
            }
        }
        Value::String(s) => {
            args.push(format!("--{flag}").into());
            args.push(s.into());
        }
        Value::Integer(i) => {
            args.push(format!("--{flag}").into());
            args.push(i.to_string().into());
        }
        _ => {
            bail!("Unknown key type {flag}");
        }
    }
    Ok(())
}

/// Take 'a.b.c' and turn it into 'start['a']['b']['c']' reliably, and interpret the result as a table
fn get_table<'a>(start: &'a Value, table: &str) -> Option<&'a Table> {
    let mut current = start;
    for key in table.split('.') {
        current = current.get(key)?;
    }
    current.as_table()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn os(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn check_toml_parsing() {
        let a = "[wp-driver]
                 flags = { keep-unlisted-files = false, index = \"wp-index.toml\", jobs = 4 }";
        let b = toml_to_args(a).unwrap();
        // btree ordering
        assert_eq!(
            b,
            os(&["--index", "wp-index.toml", "--jobs", "4", "--no-keep-unlisted-files"])
        );
    }

    #[test]
    fn check_toml_arrays_and_errors() {
        let args = toml_to_args("[wp-driver.flags]\nindex = [\"a.toml\"]\nquiet = true").unwrap();
        assert_eq!(args, os(&["--index", "a.toml", "--quiet"]));
        assert!(toml_to_args("[wp-driver.flags]\nno-quiet = false").is_err());
        assert!(toml_to_args("[wp-driver.flags]\njobs = 1.5").is_err());
        assert!(toml_to_args("[wp-driver.flags]\nconfig = \"other.toml\"").is_err());
        // Other tables are ignored.
        assert!(toml_to_args("[package]\nname = \"x\"").unwrap().is_empty());
    }

    #[test]
    fn check_join_args() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("custom.toml");
        std::fs::write(&config, "[wp-driver.flags]\noutput-format = \"terse\"\n").unwrap();
        let config = config.to_string_lossy().to_string();

        let joined = join_args(os(&["wp-driver", "a.log", "--config", &config])).unwrap();
        assert_eq!(
            joined,
            os(&["wp-driver", "--output-format", "terse", "a.log", "--config", &config])
        );
        let flag = format!("--config={config}");
        let joined = join_args(os(&["wp-driver", &flag, "a.log"])).unwrap();
        assert_eq!(joined, os(&["wp-driver", "--output-format", "terse", &flag, "a.log"]));

        let missing = dir.path().join("missing.toml").to_string_lossy().to_string();
        assert!(join_args(os(&["wp-driver", "a.log", "--config", &missing])).is_err());
    }
}
