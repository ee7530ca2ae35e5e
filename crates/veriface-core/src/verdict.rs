//! Final verdict fusion.
//!
//! A fixed decision table over the two boolean pipeline signals: descriptor
//! match and liveness.

use serde::{Deserialize, Serialize};

/// Status severity attached to a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

/// Categorical verification outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    MatchedReal,
    MatchedFake,
    NotMatched,
}

impl Verdict {
    /// Fuse the match and liveness booleans.
    ///
    /// | matched | is_live | verdict                | status  |
    /// |---------|---------|------------------------|---------|
    /// | true    | true    | Matched + Real         | success |
    /// | true    | false   | Matched but seems Fake | warning |
    /// | false   | any     | Not Matched            | error   |
    pub fn from_signals(matched: bool, is_live: bool) -> Self {
        match (matched, is_live) {
            (true, true) => Verdict::MatchedReal,
            (true, false) => Verdict::MatchedFake,
            (false, _) => Verdict::NotMatched,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::MatchedReal => "Matched + Real",
            Verdict::MatchedFake => "Matched but seems Fake",
            Verdict::NotMatched => "Not Matched",
        }
    }

    pub fn status(&self) -> Severity {
        match self {
            Verdict::MatchedReal => Severity::Success,
            Verdict::MatchedFake => Severity::Warning,
            Verdict::NotMatched => Severity::Error,
        }
    }
}
