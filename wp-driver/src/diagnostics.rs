// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Kernel and WP diagnostics of the form `<file>:<line>:<tag>:<message>`.

use crate::reporter::Reporter;
use once_cell::sync::Lazy;
use regex::Regex;
use strum_macros::Display;
use wp_metadata::FindingClass;

static KERNEL_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\S*):(\d+)\s*:\s*(\[kernel\] user error|\[kernel\] failure)\s*:(.*)$").unwrap()
});
static KERNEL_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S*):(\d+)\s*:\s*(\[kernel\] warning)\s*:(.*)$").unwrap());
static WP_WARNING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S*):(\d+)\s*:\s*(\[wp\] warning)\s*:(.*)$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum DiagnosticKind {
    KernelError,
    KernelWarning,
    WpWarning,
}

impl DiagnosticKind {
    pub fn finding_class(&self) -> FindingClass {
        match self {
            DiagnosticKind::KernelError => FindingClass::SpecificationError,
            DiagnosticKind::KernelWarning | DiagnosticKind::WpWarning => {
                FindingClass::SpecificationWarning
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDiagnostic {
    pub kind: DiagnosticKind,
    pub file: String,
    pub line: u32,
    /// `<tag>:<message>`, e.g. `[kernel] user error:bad type`.
    pub message: String,
}

/// Recognize a diagnostic line. Errors take precedence over warnings.
pub fn classify_tool_line(line: &str) -> Option<ToolDiagnostic> {
    [
        (&*KERNEL_ERROR, DiagnosticKind::KernelError),
        (&*KERNEL_WARNING, DiagnosticKind::KernelWarning),
        (&*WP_WARNING, DiagnosticKind::WpWarning),
    ]
    .into_iter()
    .find_map(|(regex, kind)| {
        let captures = regex.captures(line)?;
        Some(ToolDiagnostic {
            kind,
            file: captures[1].to_string(),
            line: captures[2].parse().ok()?,
            message: format!("{}:{}", &captures[3], &captures[4]),
        })
    })
}

/// File the diagnostic carried by `line`, if any. Returns whether `line` was a diagnostic.
pub fn report_tool_line(line: &str, reporter: &mut Reporter<'_>) -> bool {
    let Some(diagnostic) = classify_tool_line(line) else {
        return false;
    };
    tracing::debug!(kind = %diagnostic.kind, file = %diagnostic.file, "tool diagnostic");
    reporter.report(
        diagnostic.kind.finding_class(),
        None,
        &diagnostic.file,
        diagnostic.line,
        &diagnostic.message,
    );
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::FindingCollector;
    use crate::source_index::mock_index;

    #[test]
    fn check_classify_tool_line() {
        let diagnostic = classify_tool_line("foo.c:12:[kernel] user error:bad type").unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::KernelError);
        assert_eq!((diagnostic.file.as_str(), diagnostic.line), ("foo.c", 12));
        assert_eq!(diagnostic.message, "[kernel] user error:bad type");

        let diagnostic =
            classify_tool_line("[kernel] src/a.c:3: [kernel] failure: cannot load").unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::KernelError);
        assert_eq!(diagnostic.file, "src/a.c");
        assert_eq!(diagnostic.message, "[kernel] failure: cannot load");

        let kind = |line| classify_tool_line(line).map(|d| d.kind);
        assert_eq!(kind("a.c:4:[kernel] warning:unused"), Some(DiagnosticKind::KernelWarning));
        assert_eq!(kind("a.c:4:[wp] warning:Missing RTE"), Some(DiagnosticKind::WpWarning));
        assert_eq!(kind("[wp] warning: Missing RTE guards"), None);
        assert_eq!(kind("Prover Alt-Ergo returns Valid (Qed:1ms)"), None);
    }

    #[test]
    fn check_report_tool_line() {
        let index = mock_index(
            r#"
            [[files]]
            path = "foo.c"
            procedures = [{ name = "parse", start-line = 10, end-line = 14 }]
            "#,
        );
        let mut sink = FindingCollector::default();
        let mut reporter = Reporter::new(&index, &mut sink);
        assert!(report_tool_line("foo.c:12:[kernel] user error:bad type", &mut reporter));
        assert!(report_tool_line("bar.c:12:[kernel] user error:bad type", &mut reporter));
        assert!(!report_tool_line("[kernel] Parsing foo.c", &mut reporter));
        assert_eq!((reporter.filed(), reporter.dropped()), (1, 1));

        assert_eq!(sink.findings.len(), 1);
        let finding = &sink.findings[0];
        assert_eq!(finding.class, FindingClass::SpecificationError);
        assert_eq!(finding.line, 12);
        assert_eq!(finding.procedure.as_deref(), Some("parse"));
        assert!(finding.message.contains("bad type"));
    }
}
