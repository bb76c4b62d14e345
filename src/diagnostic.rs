//! Diagnostic types and the per-scan collector.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a diagnostic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Position of a finding: the token position plus its line/column, so
/// external reporters need no access to the token sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Token position (index into the scanned sequence).
    pub position: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based byte column within the line.
    pub column: usize,
}

impl Location {
    pub fn new(position: usize, line: usize, column: usize) -> Self {
        Self {
            position,
            line,
            column,
        }
    }
}

/// A single reported finding.
///
/// `code` is the stable identifier external tooling filters by (for example
/// `NotUsed` or `EmptyStatement`). `rule_id` names the rule that produced the
/// finding; engine-internal findings (structural recovery, rule faults) may
/// leave it unset or use it to name the failing rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub location: Location,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self {
            rule_id: None,
            severity,
            code: code.into(),
            message: message.into(),
            location,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Self::new(Severity::Error, code, message, location)
    }

    pub fn warning(
        code: impl Into<String>,
        message: impl Into<String>,
        location: Location,
    ) -> Self {
        Self::new(Severity::Warning, code, message, location)
    }

    pub fn with_rule(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }
}

/// Per-severity totals for summary reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub errors: usize,
    pub warnings: usize,
}

impl SeverityCounts {
    pub fn total(&self) -> usize {
        self.errors + self.warnings
    }
}

/// Append-only sink for diagnostics produced during one scan.
///
/// Emission order is preserved exactly; nothing is deduplicated. The
/// collector is consumed once per scan via [`DiagnosticCollector::drain`].
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    entries: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a diagnostic. Order of emission is the order of retrieval.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Take every collected diagnostic in emission order, leaving the
    /// collector empty.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.entries)
    }

    pub fn count_by_severity(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for entry in &self.entries {
            match entry.severity {
                Severity::Error => counts.errors += 1,
                Severity::Warning => counts.warnings += 1,
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
