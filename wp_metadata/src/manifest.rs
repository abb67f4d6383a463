// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The on-disk format describing which source files and procedures findings may be attached to.

use serde::{Deserialize, Serialize};

/// The structure of a source index manifest (usually `wp-index.toml`).
///
/// ```toml
/// working-dir = "/tmp/wp/src"
///
/// [[files]]
/// path = "4051.c"
/// source = "src/parse.c"
/// procedures = [{ name = "parse", start-line = 3, end-line = 40 }]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SourceManifest {
    /// The directory the verifier ran in. Relative paths in the verifier output, and in
    /// `files`, are resolved against it.
    pub working_dir: Option<String>,
    #[serde(default)]
    pub files: Vec<FileEntry>,
}

/// A file the verifier may mention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FileEntry {
    /// The path as the verifier sees it.
    pub path: String,
    /// The file instance findings are anchored to. Defaults to `path`.
    pub source: Option<String>,
    /// Procedures defined in this file, in source order.
    #[serde(default)]
    pub procedures: Vec<ProcedureEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProcedureEntry {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}
