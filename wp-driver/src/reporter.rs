// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Filing findings: resolving a reported `(file, line, function)` against the source index and
//! handing the result to a [`FindingSink`].

use crate::source_index::{Procedure, SourceIndex, normalize_reported_path};
use tracing::{debug, warn};
use wp_metadata::{Finding, FindingClass};

/// Accepts resolved findings.
pub trait FindingSink {
    fn report(
        &mut self,
        anchor: &str,
        line: u32,
        procedure: Option<&Procedure>,
        class: FindingClass,
        message: &str,
    );
}

/// A sink that keeps every finding, in the order they were filed.
#[derive(Debug, Default)]
pub struct FindingCollector {
    pub findings: Vec<Finding>,
}

impl FindingSink for FindingCollector {
    fn report(
        &mut self,
        anchor: &str,
        line: u32,
        procedure: Option<&Procedure>,
        class: FindingClass,
        message: &str,
    ) {
        self.findings.push(Finding {
            class,
            anchor: anchor.to_string(),
            line,
            procedure: procedure.map(|p| p.name.clone()),
            message: message.to_string(),
        });
    }
}

/// What to do with a finding whose file is not in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnlistedFiles {
    /// Drop the finding, leaving only a log notice.
    #[default]
    Drop,
    /// Anchor the finding at the normalized path anyway.
    Keep,
}

pub struct Reporter<'a> {
    index: &'a dyn SourceIndex,
    sink: &'a mut dyn FindingSink,
    unlisted: UnlistedFiles,
    filed: usize,
    dropped: usize,
}

impl<'a> Reporter<'a> {
    pub fn new(index: &'a dyn SourceIndex, sink: &'a mut dyn FindingSink) -> Self {
        Reporter { index, sink, unlisted: UnlistedFiles::Drop, filed: 0, dropped: 0 }
    }

    pub fn with_unlisted_files(mut self, unlisted: UnlistedFiles) -> Self {
        self.unlisted = unlisted;
        self
    }

    /// File a finding reported by the verifier at `file:line`.
    ///
    /// The procedure is the first one enclosing `line`; when the line is outside every
    /// procedure (e.g. a contract written before a prototype) the procedure named `function`
    /// is used instead, wherever it is defined. Returns whether the finding was filed.
    pub fn report(
        &mut self,
        class: FindingClass,
        function: Option<&str>,
        file: &str,
        line: u32,
        message: &str,
    ) -> bool {
        let path = normalize_reported_path(file, self.index.working_dir());
        let named =
            || function.filter(|f| !f.is_empty()).and_then(|f| self.index.procedure_named(f));
        match self.index.file(&path) {
            Some(indexed) => {
                let on_line = indexed.procedures_on_line(line);
                let procedure = on_line.first().copied().or_else(named);
                debug!(%class, file = %indexed.path, line, "file finding");
                self.sink.report(indexed.arbitrary_instance(), line, procedure, class, message);
            }
            None if self.unlisted == UnlistedFiles::Keep => {
                debug!(%class, anchor = %path, line, "file finding in unlisted file");
                self.sink.report(&path, line, named(), class, message);
            }
            None => {
                warn!(%path, line, %class, "cannot file finding: file is not in the source index");
                self.dropped += 1;
                return false;
            }
        }
        self.filed += 1;
        true
    }

    /// Number of findings handed to the sink so far.
    pub fn filed(&self) -> usize {
        self.filed
    }

    /// Number of findings dropped because their file is unknown.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_index::mock_index;

    const MANIFEST: &str = r#"
        [[files]]
        path = "a.c"
        source = "src/a.c"
        procedures = [{ name = "f", start-line = 5, end-line = 12 }]

        [[files]]
        path = "a.h"
        procedures = [{ name = "g", start-line = 1, end-line = 3 }]
    "#;

    #[test]
    fn check_procedure_resolution() {
        let index = mock_index(MANIFEST);
        let mut sink = FindingCollector::default();
        let mut reporter = Reporter::new(&index, &mut sink);

        assert!(reporter.report(FindingClass::SpecificationViolation, Some("g"), "a.c", 7, "m1"));
        // Outside every procedure: fall back to the named one, even from another file.
        assert!(reporter.report(FindingClass::SpecificationViolation, Some("g"), "a.c", 2, "m2"));
        assert!(reporter.report(FindingClass::SpecificationWarning, None, "./a.c", 2, "m3"));
        assert!(reporter.report(FindingClass::SpecificationWarning, Some(""), "a.c", 2, "m4"));
        assert_eq!(reporter.filed(), 4);
        assert_eq!(reporter.dropped(), 0);

        let procedures: Vec<_> = sink.findings.iter().map(|f| f.procedure.as_deref()).collect();
        assert_eq!(procedures, vec![Some("f"), Some("g"), None, None]);
        assert!(sink.findings.iter().all(|f| f.anchor == "src/a.c"));
    }

    #[test]
    fn check_unknown_file_is_dropped() {
        let index = mock_index(MANIFEST);
        let mut sink = FindingCollector::default();
        let mut reporter = Reporter::new(&index, &mut sink);
        assert!(!reporter.report(FindingClass::SpecificationError, None, "b.c", 3, "msg"));
        assert_eq!(reporter.dropped(), 1);
        assert!(sink.findings.is_empty());
    }

    #[test]
    fn check_unknown_file_is_kept_on_request() {
        let index = mock_index(MANIFEST);
        let mut sink = FindingCollector::default();
        let mut reporter =
            Reporter::new(&index, &mut sink).with_unlisted_files(UnlistedFiles::Keep);
        assert!(reporter.report(FindingClass::SpecificationError, Some("f"), "b.c", 3, "msg"));
        assert_eq!(sink.findings[0].anchor, "/work/b.c");
        assert_eq!(sink.findings[0].procedure.as_deref(), Some("f"));
    }
}
