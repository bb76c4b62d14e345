//! The rule plugin seam: what a rule declares and what it sees at dispatch.

use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticCollector, Location, Severity};
use crate::scope::{ScopeId, ScopeIndex, ScopeSpan};
use crate::token::{Token, TokenKind};

/// Failure returned by a rule callback.
///
/// The dispatcher converts it into a `RuleFault` diagnostic naming the rule;
/// it never aborts the scan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RuleError {
    message: String,
}

impl RuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A pluggable check against the token stream.
///
/// A rule declares the token kinds that trigger it and, optionally, the
/// scope kinds it must be inside; the engine invokes [`Rule::check`] once per
/// matching token. Implementations must be thread-safe: one registry is
/// shared by concurrent scans (registration finishes before scanning starts).
pub trait Rule: Send + Sync {
    /// Stable identifier, unique within a registry.
    fn id(&self) -> &str;

    /// Human-readable summary for listings.
    fn description(&self) -> &str {
        ""
    }

    /// Scope kinds this rule must be inside to fire. Empty means the rule
    /// fires anywhere.
    fn scope_kinds(&self) -> &[TokenKind] {
        &[]
    }

    /// Token kinds that trigger the rule.
    fn trigger_kinds(&self) -> &[TokenKind];

    /// Inspect the matched token and report findings through the sink.
    fn check(&self, ctx: &RuleContext<'_>, sink: &mut DiagnosticSink<'_>) -> Result<(), RuleError>;
}

/// Read-only view handed to a rule for one matched token.
pub struct RuleContext<'a> {
    tokens: &'a [Token],
    scopes: &'a ScopeIndex,
    position: usize,
    scope: Option<ScopeId>,
}

impl<'a> RuleContext<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        scopes: &'a ScopeIndex,
        position: usize,
        scope: Option<ScopeId>,
    ) -> Self {
        Self {
            tokens,
            scopes,
            position,
            scope,
        }
    }

    /// The full token sequence.
    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }

    /// Position of the matched token.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The matched token.
    pub fn token(&self) -> &'a Token {
        &self.tokens[self.position]
    }

    /// The scope index for the whole sequence.
    pub fn scopes(&self) -> &'a ScopeIndex {
        self.scopes
    }

    /// The closest enclosing scope that satisfied the rule's scope
    /// requirement; `None` for rules without one.
    pub fn scope(&self) -> Option<ScopeId> {
        self.scope
    }

    pub fn scope_span(&self, id: ScopeId) -> &'a ScopeSpan {
        self.scopes.span(id)
    }

    /// Declared name of a class-like or function scope.
    pub fn declaration_name(&self, id: ScopeId) -> Option<&'a str> {
        self.scopes.declaration_name(self.tokens, id)
    }

    /// Whether the matched token sits inside a scope of the given kind.
    pub fn in_scope_kind(&self, kind: TokenKind) -> bool {
        self.scopes.contains_kind(self.position, kind)
    }
}

/// Write-only sink a rule reports through.
///
/// Fills in line/column from the token at the reported position and stamps
/// the reporting rule's id, so rules only choose severity, position, code and
/// message.
pub struct DiagnosticSink<'a> {
    tokens: &'a [Token],
    rule_id: &'a str,
    collector: &'a mut DiagnosticCollector,
}

impl<'a> DiagnosticSink<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        rule_id: &'a str,
        collector: &'a mut DiagnosticCollector,
    ) -> Self {
        Self {
            tokens,
            rule_id,
            collector,
        }
    }

    pub fn emit(
        &mut self,
        severity: Severity,
        position: usize,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        let (line, column) = self
            .tokens
            .get(position)
            .map(|t| (t.line, t.column))
            .unwrap_or((0, 0));
        self.collector.emit(
            Diagnostic::new(severity, code, message, Location::new(position, line, column))
                .with_rule(self.rule_id),
        );
    }

    pub fn error(&mut self, position: usize, code: impl Into<String>, message: impl Into<String>) {
        self.emit(Severity::Error, position, code, message);
    }

    pub fn warning(
        &mut self,
        position: usize,
        code: impl Into<String>,
        message: impl Into<String>,
    ) {
        self.emit(Severity::Warning, position, code, message);
    }
}
