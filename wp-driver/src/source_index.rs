// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lookup of the source files and procedures findings can be attached to.
//!
//! The verifier reports locations inside the files it was handed, which may live in a scratch
//! directory and may be reported relative to the verifier's working directory. Every path that
//! goes in or out of an index is therefore passed through [`normalize_reported_path`] first.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use wp_metadata::{FileEntry, SourceManifest};

/// A source file known to the index.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    /// Normalized path, as the verifier refers to the file.
    pub path: String,
    instance: String,
    procedures: Vec<Procedure>,
}

/// A procedure known to the index, spanning `start_line..=end_line` of its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Procedure {
    pub name: String,
    pub start_line: u32,
    pub end_line: u32,
}

impl IndexedFile {
    /// Procedures whose span contains `line`, in source order.
    pub fn procedures_on_line(&self, line: u32) -> Vec<&Procedure> {
        self.procedures.iter().filter(|p| p.start_line <= line && line <= p.end_line).collect()
    }

    /// The instance findings in this file are anchored to.
    pub fn arbitrary_instance(&self) -> &str {
        &self.instance
    }
}

/// Where file and function identities come from.
pub trait SourceIndex {
    /// Look up a file by its normalized path.
    fn file(&self, normalized_path: &str) -> Option<&IndexedFile>;
    /// Look up a procedure by name, regardless of the file it is defined in.
    fn procedure_named(&self, name: &str) -> Option<&Procedure>;
    /// The directory relative paths reported by the verifier are resolved against.
    fn working_dir(&self) -> &str;
}

/// A [`SourceIndex`] built from a [`SourceManifest`].
#[derive(Debug, Default)]
pub struct ManifestIndex {
    working_dir: String,
    files: HashMap<String, IndexedFile>,
    /// Name -> (normalized file path, position in that file's procedure list)
    procedures: HashMap<String, (String, usize)>,
}

impl ManifestIndex {
    /// Load a manifest file. A `working-dir` in the manifest wins over `default_working_dir`.
    pub fn from_file(path: &Path, default_working_dir: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read source index {}", path.display()))?;
        let manifest: SourceManifest = toml::from_str(&text)
            .with_context(|| format!("Failed to parse source index {}", path.display()))?;
        Ok(Self::new(manifest, &default_working_dir.to_string_lossy()))
    }

    pub fn new(manifest: SourceManifest, default_working_dir: &str) -> Self {
        let working_dir = manifest
            .working_dir
            .map(|dir| normalize_reported_path(&dir, default_working_dir))
            .unwrap_or_else(|| normalize_reported_path(default_working_dir, "/"));
        let mut index =
            ManifestIndex { working_dir, files: HashMap::new(), procedures: HashMap::new() };
        for entry in manifest.files {
            index.insert(entry);
        }
        index
    }

    /// An index that knows no files at all.
    pub fn empty(working_dir: &str) -> Self {
        Self::new(SourceManifest::default(), working_dir)
    }

    fn insert(&mut self, entry: FileEntry) {
        let path = normalize_reported_path(&entry.path, &self.working_dir);
        if self.files.contains_key(&path) {
            tracing::warn!(%path, "source index lists the same file twice, keeping the first");
            return;
        }
        let instance = entry.source.unwrap_or_else(|| path.clone());
        let procedures: Vec<Procedure> = entry
            .procedures
            .into_iter()
            .map(|p| Procedure { name: p.name, start_line: p.start_line, end_line: p.end_line })
            .collect();
        for (position, procedure) in procedures.iter().enumerate() {
            self.procedures.entry(procedure.name.clone()).or_insert((path.clone(), position));
        }
        self.files.insert(path.clone(), IndexedFile { path, instance, procedures });
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl SourceIndex for ManifestIndex {
    fn file(&self, normalized_path: &str) -> Option<&IndexedFile> {
        self.files.get(normalized_path)
    }

    fn procedure_named(&self, name: &str) -> Option<&Procedure> {
        let (path, position) = self.procedures.get(name)?;
        self.files.get(path)?.procedures.get(*position)
    }

    fn working_dir(&self) -> &str {
        &self.working_dir
    }
}

/// Bring a path reported by the verifier into the form used as index key: forward slashes,
/// absolute (relative paths are taken relative to `working_dir`), and no `.`/`..` segments.
pub fn normalize_reported_path(raw: &str, working_dir: &str) -> String {
    let slashed = raw.trim().replace('\\', "/");
    let slashed = if cfg!(windows) { canonicalize_drive_prefix(&slashed) } else { slashed };
    let joined = if is_absolute(&slashed) {
        slashed
    } else {
        let base = working_dir.trim().replace('\\', "/");
        format!("{}/{}", base.trim_end_matches('/'), slashed)
    };
    collapse_segments(&joined)
}

/// Restore the `:` of a drive-letter prefix that some tools drop (`c/work/a.c` becomes
/// `c:/work/a.c`). Paths that already carry a drive letter are left untouched.
pub fn canonicalize_drive_prefix(path: &str) -> String {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' {
        return path.to_string();
    }
    if bytes.len() >= 2 && matches!(bytes[0], b'c' | b'C') && bytes[1] == b'/' {
        return format!("{}:{}", &path[..1], &path[1..]);
    }
    path.to_string()
}

fn is_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    path.starts_with('/') || (bytes.len() >= 3 && bytes[1] == b':' && bytes[2] == b'/')
}

fn collapse_segments(path: &str) -> String {
    let (root, rest) = match path.find('/') {
        Some(0) => ("/", &path[1..]),
        Some(pos) if path[..pos].ends_with(':') => (&path[..=pos], &path[pos + 1..]),
        _ => ("", path),
    };
    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if root.is_empty() {
                    segments.push(segment);
                }
            }
            _ => segments.push(segment),
        }
    }
    format!("{root}{}", segments.join("/"))
}

/// Build an index from an inline TOML manifest, rooted at `/work`.
#[cfg(test)]
pub fn mock_index(manifest: &str) -> ManifestIndex {
    ManifestIndex::new(toml::from_str(manifest).unwrap(), "/work")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_normalize_reported_path() {
        assert_eq!(normalize_reported_path("a.c", "/work"), "/work/a.c");
        assert_eq!(normalize_reported_path("./src/a.c", "/work/"), "/work/src/a.c");
        assert_eq!(normalize_reported_path("../inc/a.h", "/work/src"), "/work/inc/a.h");
        assert_eq!(normalize_reported_path("/abs//x/./a.c", "/work"), "/abs/x/a.c");
        assert_eq!(normalize_reported_path("src\\a.c", "/work"), "/work/src/a.c");
        assert_eq!(normalize_reported_path("C:\\work\\a.c", "/ignored"), "C:/work/a.c");
    }

    #[test]
    fn check_canonicalize_drive_prefix() {
        assert_eq!(canonicalize_drive_prefix("C:/work/a.c"), "C:/work/a.c");
        assert_eq!(canonicalize_drive_prefix("c/work/a.c"), "c:/work/a.c");
        assert_eq!(canonicalize_drive_prefix("C/work/a.c"), "C:/work/a.c");
        assert_eq!(canonicalize_drive_prefix("/work/a.c"), "/work/a.c");
        assert_eq!(canonicalize_drive_prefix("core/a.c"), "core/a.c");
    }

    #[test]
    fn check_manifest_lookup() {
        let index = mock_index(
            r#"
            [[files]]
            path = "4051.c"
            source = "src/parse.c"
            procedures = [
                { name = "outer", start-line = 1, end-line = 30 },
                { name = "inner", start-line = 10, end-line = 20 },
            ]

            [[files]]
            path = "sub/4052.c"
            procedures = [{ name = "inner", start-line = 5, end-line = 6 }]
            "#,
        );
        assert_eq!(index.len(), 2);
        assert_eq!(index.working_dir(), "/work");

        let file = index.file("/work/4051.c").unwrap();
        assert_eq!(file.arbitrary_instance(), "src/parse.c");
        let names: Vec<_> = file.procedures_on_line(15).iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["outer", "inner"]);
        assert_eq!(file.procedures_on_line(30).len(), 1);
        assert!(file.procedures_on_line(31).is_empty());

        // Without a `source`, the normalized path is the anchor.
        let other = index.file("/work/sub/4052.c").unwrap();
        assert_eq!(other.arbitrary_instance(), "/work/sub/4052.c");

        // The first definition in manifest order wins.
        assert_eq!(index.procedure_named("inner").unwrap().start_line, 10);
        assert!(index.procedure_named("missing").is_none());
        assert!(index.file("4051.c").is_none());
    }

    #[test]
    fn check_manifest_working_dir_wins() {
        let manifest: SourceManifest = toml::from_str(
            r#"
            working-dir = "/tmp/wp/src"
            [[files]]
            path = "a.c"
            "#,
        )
        .unwrap();
        let index = ManifestIndex::new(manifest, "/elsewhere");
        assert_eq!(index.working_dir(), "/tmp/wp/src");
        assert!(index.file("/tmp/wp/src/a.c").is_some());
    }
}
