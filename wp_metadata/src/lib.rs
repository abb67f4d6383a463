// Copyright Kani Contributors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use serde::{Deserialize, Serialize};

pub use finding_class::{FindingClass, Significance};
pub use manifest::*;

mod finding_class;
mod manifest;

/// One structured result of post-processing verifier output. Findings are emitted once and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    /// The class this finding is filed under.
    pub class: FindingClass,
    /// The file instance the finding is anchored to (as registered in the source index).
    pub anchor: String,
    /// 1-based line inside `anchor`.
    pub line: u32,
    /// The enclosing or named procedure, if one could be resolved.
    pub procedure: Option<String>,
    pub message: String,
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}: ", self.anchor, self.line, self.class)?;
        if let Some(procedure) = &self.procedure {
            write!(f, "[{procedure}] ")?;
        }
        write!(f, "{}", self.message)
    }
}
