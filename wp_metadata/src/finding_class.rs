// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// The predefined classes findings are filed under. Each class carries a fixed display name,
/// priority weight and significance.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    Serialize,
    Deserialize
)]
pub enum FindingClass {
    /// A goal the prover could not discharge.
    #[strum(serialize = "Specification Violation")]
    SpecificationViolation,
    /// A kernel or WP warning about the specification or the analyzed code.
    #[strum(serialize = "Specification Warning")]
    SpecificationWarning,
    /// A kernel user error or failure.
    #[strum(serialize = "Specification Error")]
    SpecificationError,
    /// A message produced by the tooling around the verifier itself.
    #[strum(serialize = "Tool Error")]
    ToolError,
}

/// How much a finding of a given class should weigh in a build verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Significance {
    /// Informs, but never fails a build by itself.
    Diagnostic,
}

impl FindingClass {
    pub fn display_name(&self) -> &'static str {
        match self {
            FindingClass::SpecificationViolation => "Specification Violation",
            FindingClass::SpecificationWarning => "Specification Warning",
            FindingClass::SpecificationError => "Specification Error",
            FindingClass::ToolError => "Tool Error",
        }
    }

    pub fn priority(&self) -> f64 {
        10.0
    }

    /// Every class only informs; none fails a build by itself.
    pub fn significance(&self) -> Significance {
        Significance::Diagnostic
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn check_class_names_round_trip() {
        for class in FindingClass::iter() {
            assert_eq!(class.to_string(), class.display_name());
            assert_eq!(FindingClass::from_str(class.display_name()).unwrap(), class);
            assert_eq!(class.significance(), Significance::Diagnostic);
        }
        assert!(FindingClass::from_str("Speedy Error").is_err());
    }
}
