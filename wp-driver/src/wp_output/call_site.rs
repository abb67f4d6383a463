// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Parsing of the call-site clause that may trail a goal location, as in
//! `... (file a.c, line 3) in 'f'' in 'main' at call 'f' (file a.c, line 12):`.

use once_cell::sync::Lazy;
use regex::Regex;

static CALL_SITE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(.*?)\(file\s*([^\s,]+)\s*,\s*line\s*(\d+)\s*\)[^:]*:?\s*$").unwrap()
});

/// The program point a goal is checked at, when it is not the goal's own location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    /// The function containing the call, when the clause names it (`in '<caller>'`).
    pub caller: Option<String>,
}

/// Parse the text following a goal location. Returns `None` when it does not describe a call
/// site.
pub fn parse_call_site(trailer: &str) -> Option<CallSite> {
    let captures = CALL_SITE.captures(trailer)?;
    let line = captures[3].parse().ok()?;
    Some(CallSite { caller: caller_name(&captures[1]), file: captures[2].to_string(), line })
}

/// `in 'main' at call 'f'` names `main` as the caller. Anything else leaves it unknown.
fn caller_name(text: &str) -> Option<String> {
    let mut pieces = text.split('\'');
    let head = pieces.next()?;
    if !head.trim().ends_with("in") {
        return None;
    }
    pieces.next().map(str::trim).filter(|name| !name.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_call_site_with_caller() {
        let site = parse_call_site(" in 'main' at call 'f' (file b.c, line 12):").unwrap();
        assert_eq!(site.file, "b.c");
        assert_eq!(site.line, 12);
        assert_eq!(site.caller.as_deref(), Some("main"));
    }

    #[test]
    fn check_call_site_without_caller() {
        let site = parse_call_site(" at call 'f' (file b.c, line 12)").unwrap();
        assert_eq!(site.line, 12);
        assert_eq!(site.caller, None);

        // The quoted name is missing altogether.
        let site = parse_call_site(" in (file b.c, line 7):").unwrap();
        assert_eq!(site.caller, None);
    }

    #[test]
    fn check_no_call_site() {
        assert_eq!(parse_call_site(":"), None);
        assert_eq!(parse_call_site(""), None);
        assert_eq!(parse_call_site(" (file b.c, line x):"), None);
    }
}
