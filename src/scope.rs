//! Scope tracking over the token stream.
//!
//! [`build_scopes`] makes one left-to-right pass, maintaining a stack of open
//! spans. A `{` opens a span whose kind is attributed to the governing
//! keyword (the most recent classifying keyword of the current statement),
//! not to the brace itself; a bare `{` opens a [`TokenKind::OpenBrace`]
//! block. Malformed nesting never fails the pass: unmatched closers are
//! ignored and unmatched openers are force-closed at end of input, each with
//! a structural diagnostic.

use std::collections::HashMap;

use crate::diagnostic::{Diagnostic, Location};
use crate::token::{Token, TokenKind};

/// Identifier for a scope span inside a [`ScopeIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub usize);

/// One nesting region, bounded by brace tokens.
///
/// `condition` is the position of the governing keyword (`None` for bare
/// blocks); `opener`/`closer` are the brace token positions. `closer` is
/// always greater than `opener` except for the one recovery corner where the
/// opener is the final token of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeSpan {
    pub kind: TokenKind,
    pub condition: Option<usize>,
    pub opener: usize,
    pub closer: usize,
    pub parent: Option<ScopeId>,
}

/// Position-indexed view of the scope tree: built once, read-only afterward.
///
/// Spans live in an arena; each token records only its innermost enclosing
/// span, and full chains are walked through parent links in O(depth).
#[derive(Debug, Default)]
pub struct ScopeIndex {
    spans: Vec<ScopeSpan>,
    innermost: Vec<Option<ScopeId>>,
    governed: HashMap<usize, ScopeId>,
}

impl ScopeIndex {
    pub fn span(&self, id: ScopeId) -> &ScopeSpan {
        &self.spans[id.0]
    }

    pub fn spans(&self) -> &[ScopeSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Innermost span enclosing the token at `position`, if any. The brace
    /// tokens of a span are not inside it; its condition keyword is not
    /// either.
    pub fn innermost(&self, position: usize) -> Option<ScopeId> {
        self.innermost.get(position).copied().flatten()
    }

    /// Enclosing spans of the token at `position`, innermost first.
    pub fn chain(&self, position: usize) -> ScopeChain<'_> {
        ScopeChain {
            index: self,
            current: self.innermost(position),
        }
    }

    /// Closest enclosing span whose kind is in `kinds`.
    pub fn enclosing_matching(&self, position: usize, kinds: &[TokenKind]) -> Option<ScopeId> {
        self.chain(position)
            .find(|id| kinds.contains(&self.span(*id).kind))
    }

    /// Whether any enclosing span of `position` has the given kind.
    pub fn contains_kind(&self, position: usize, kind: TokenKind) -> bool {
        self.chain(position).any(|id| self.span(id).kind == kind)
    }

    /// The span whose governing keyword sits at `condition_position`.
    pub fn span_governed_by(&self, condition_position: usize) -> Option<ScopeId> {
        self.governed.get(&condition_position).copied()
    }

    /// Declared name of a class-like or function span: the identifier
    /// following its condition keyword. `None` for bare blocks and anonymous
    /// functions.
    pub fn declaration_name<'t>(&self, tokens: &'t [Token], id: ScopeId) -> Option<&'t str> {
        let condition = self.span(id).condition?;
        tokens
            .get(condition + 1..)?
            .iter()
            .find(|t| !t.is_trivia())
            .filter(|t| t.kind == TokenKind::Identifier)
            .map(|t| t.text.as_str())
    }
}

/// Iterator over enclosing spans, innermost first.
pub struct ScopeChain<'a> {
    index: &'a ScopeIndex,
    current: Option<ScopeId>,
}

impl Iterator for ScopeChain<'_> {
    type Item = ScopeId;

    fn next(&mut self) -> Option<ScopeId> {
        let id = self.current?;
        self.current = self.index.span(id).parent;
        Some(id)
    }
}

/// Build the scope index for a token sequence.
///
/// Returns the index plus the structural diagnostics produced by recovery
/// (codes `UnmatchedCloser` and `UnmatchedOpener`, both warnings).
pub fn build_scopes(tokens: &[Token]) -> (ScopeIndex, Vec<Diagnostic>) {
    let mut spans: Vec<ScopeSpan> = Vec::new();
    let mut innermost: Vec<Option<ScopeId>> = Vec::with_capacity(tokens.len());
    let mut governed: HashMap<usize, ScopeId> = HashMap::new();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    // Open spans, each with the paren depth saved at its opener so that
    // semicolon handling is relative to the scope it happens in.
    let mut stack: Vec<(ScopeId, usize)> = Vec::new();
    let mut pending: Option<usize> = None;
    let mut paren_depth: usize = 0;

    for (position, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::OpenBrace => {
                innermost.push(stack.last().map(|(id, _)| *id));
                let parent = stack.last().map(|(id, _)| *id);
                let (kind, condition) = match pending.take() {
                    Some(cond) => (attributed_kind(tokens, cond), Some(cond)),
                    None => (TokenKind::OpenBrace, None),
                };
                let id = ScopeId(spans.len());
                spans.push(ScopeSpan {
                    kind,
                    condition,
                    opener: position,
                    closer: position,
                    parent,
                });
                if let Some(cond) = condition {
                    governed.insert(cond, id);
                }
                stack.push((id, paren_depth));
                paren_depth = 0;
            }
            TokenKind::CloseBrace => {
                match stack.pop() {
                    Some((id, saved)) => {
                        spans[id.0].closer = position;
                        paren_depth = saved;
                    }
                    None => {
                        log::debug!(
                            "unmatched closing brace at line {}, column {}",
                            token.line,
                            token.column
                        );
                        diagnostics.push(Diagnostic::warning(
                            "UnmatchedCloser",
                            "Closing brace does not match any open scope",
                            Location::new(position, token.line, token.column),
                        ));
                    }
                }
                innermost.push(stack.last().map(|(id, _)| *id));
                pending = None;
            }
            kind => {
                innermost.push(stack.last().map(|(id, _)| *id));
                match kind {
                    TokenKind::OpenParen => paren_depth += 1,
                    TokenKind::CloseParen => paren_depth = paren_depth.saturating_sub(1),
                    TokenKind::Semicolon if paren_depth == 0 => pending = None,
                    kind if kind.is_scope_classifier() => pending = Some(position),
                    _ => {}
                }
            }
        }
    }

    // Force-close whatever is still open, outermost first.
    let last = tokens.len().saturating_sub(1);
    for (id, _) in stack.drain(..) {
        spans[id.0].closer = last;
        let opener = spans[id.0].opener;
        let token = &tokens[opener];
        log::debug!(
            "force-closing scope opened at line {}, column {}",
            token.line,
            token.column
        );
        diagnostics.push(Diagnostic::warning(
            "UnmatchedOpener",
            "Scope is never closed; recovered at end of input",
            Location::new(opener, token.line, token.column),
        ));
    }

    (
        ScopeIndex {
            spans,
            innermost,
            governed,
        },
        diagnostics,
    )
}

/// A `function` keyword directly followed by `(` governs an anonymous
/// function; its span kind becomes [`TokenKind::Closure`].
fn attributed_kind(tokens: &[Token], condition: usize) -> TokenKind {
    let kind = tokens[condition].kind;
    if kind == TokenKind::Function && is_anonymous_function(tokens, condition) {
        TokenKind::Closure
    } else {
        kind
    }
}

fn is_anonymous_function(tokens: &[Token], condition: usize) -> bool {
    tokens[condition + 1..]
        .iter()
        .find(|t| !t.is_trivia())
        .map(|t| t.kind)
        == Some(TokenKind::OpenParen)
}
