//! Flags control structures whose bodies contain nothing but whitespace and
//! comments.
//!
//! The rule is parameterized by a `TokenKind -> Severity` map: the map's keys
//! are the trigger kinds, and each finding takes its severity from the map.
//! The default configuration reports every control keyword as an error.

use std::collections::HashMap;

use crate::diagnostic::Severity;
use crate::rule::{DiagnosticSink, Rule, RuleContext, RuleError};
use crate::token::{Token, TokenKind};

const CHECKED_KINDS: [TokenKind; 8] = [
    TokenKind::Do,
    TokenKind::Else,
    TokenKind::ElseIf,
    TokenKind::For,
    TokenKind::Foreach,
    TokenKind::If,
    TokenKind::Switch,
    TokenKind::While,
];

#[derive(Debug)]
pub struct EmptyStatementRule {
    severities: HashMap<TokenKind, Severity>,
    triggers: Vec<TokenKind>,
}

impl EmptyStatementRule {
    /// Check exactly the kinds in the map, each at its mapped severity.
    pub fn new(severities: HashMap<TokenKind, Severity>) -> Self {
        let triggers = severities.keys().copied().collect();
        Self {
            severities,
            triggers,
        }
    }

    /// Every control keyword reported as an error.
    pub fn all_errors() -> Self {
        Self::new(
            CHECKED_KINDS
                .iter()
                .map(|&kind| (kind, Severity::Error))
                .collect(),
        )
    }
}

impl Rule for EmptyStatementRule {
    fn id(&self) -> &str {
        "empty-statement"
    }

    fn description(&self) -> &str {
        "Flags control structures with empty bodies"
    }

    fn trigger_kinds(&self) -> &[TokenKind] {
        &self.triggers
    }

    fn check(&self, ctx: &RuleContext<'_>, sink: &mut DiagnosticSink<'_>) -> Result<(), RuleError> {
        let token = ctx.token();

        // Keywords that govern no braced body (braceless if, the while of a
        // do-while) are skipped.
        let Some(scope_id) = ctx.scopes().span_governed_by(ctx.position()) else {
            return Ok(());
        };
        let span = ctx.scope_span(scope_id);

        let body: &[Token] = if span.closer > span.opener {
            &ctx.tokens()[span.opener + 1..span.closer]
        } else {
            &[]
        };
        if body.iter().any(|t| !t.is_trivia()) {
            return Ok(());
        }

        let Some(&severity) = self.severities.get(&token.kind) else {
            return Ok(());
        };
        sink.emit(
            severity,
            ctx.position(),
            "EmptyStatement",
            format!("Empty {} statement detected", token.text.to_uppercase()),
        );
        Ok(())
    }
}
