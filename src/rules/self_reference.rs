//! Checks that local static member references use `self::`.
//!
//! Fires on `::` tokens inside class scopes. `IncorrectCase` reports a
//! `self` keyword written in the wrong letter case; `NotUsed` reports the
//! class referencing itself by name. Both return early. Only when neither
//! applies does the rule check for whitespace around the `::` and report
//! `SpaceBefore`/`SpaceAfter`.

use crate::rule::{DiagnosticSink, Rule, RuleContext, RuleError};
use crate::scope::ScopeId;
use crate::token::{Token, TokenKind};

#[derive(Debug, Default)]
pub struct SelfReferenceRule;

impl SelfReferenceRule {
    pub fn new() -> Self {
        Self
    }
}

impl Rule for SelfReferenceRule {
    fn id(&self) -> &str {
        "self-member-reference"
    }

    fn description(&self) -> &str {
        "Checks that local static member references use self::"
    }

    fn scope_kinds(&self) -> &[TokenKind] {
        &[TokenKind::Class]
    }

    fn trigger_kinds(&self) -> &[TokenKind] {
        &[TokenKind::DoubleColon]
    }

    fn check(&self, ctx: &RuleContext<'_>, sink: &mut DiagnosticSink<'_>) -> Result<(), RuleError> {
        let tokens = ctx.tokens();
        let position = ctx.position();
        let Some(prev) = position.checked_sub(1) else {
            return Ok(());
        };

        match tokens[prev].kind {
            TokenKind::SelfKw => {
                let text = &tokens[prev].text;
                if *text != text.to_ascii_lowercase() {
                    sink.error(
                        prev,
                        "IncorrectCase",
                        format!(
                            "Must use \"self::\" for local static member reference; \
                             found \"{text}::\""
                        ),
                    );
                    return Ok(());
                }
            }
            TokenKind::Identifier => {
                if let Some(scope) = ctx.scope() {
                    if references_own_class(ctx, prev, scope)
                        && !ctx.in_scope_kind(TokenKind::Closure)
                    {
                        sink.error(
                            prev,
                            "NotUsed",
                            "Must use \"self::\" for local static member reference",
                        );
                        return Ok(());
                    }
                }
            }
            _ => {}
        }

        if tokens[prev].kind == TokenKind::Whitespace {
            sink.error(
                prev,
                "SpaceBefore",
                format!(
                    "Expected 0 spaces before double colon; {} found",
                    tokens[prev].text.len()
                ),
            );
        }
        if let Some(next) = tokens.get(position + 1) {
            if next.kind == TokenKind::Whitespace {
                sink.error(
                    prev,
                    "SpaceAfter",
                    format!(
                        "Expected 0 spaces after double colon; {} found",
                        next.text.len()
                    ),
                );
            }
        }

        Ok(())
    }
}

/// Whether the name ending at `name_end` resolves to the enclosing class.
fn references_own_class(ctx: &RuleContext<'_>, name_end: usize, scope: ScopeId) -> bool {
    let tokens = ctx.tokens();

    let mut name_start = name_end;
    while name_start > 0
        && matches!(
            tokens[name_start - 1].kind,
            TokenKind::Identifier | TokenKind::NsSeparator
        )
    {
        name_start -= 1;
    }
    let written: String = tokens[name_start..=name_end]
        .iter()
        .map(|t| t.text.as_str())
        .collect();

    let Some(class_name) = ctx.declaration_name(scope) else {
        return false;
    };
    let namespace = ctx
        .scope_span(scope)
        .condition
        .map(|condition| namespace_of(tokens, condition))
        .unwrap_or_default();

    qualify(&written, &namespace) == qualify(class_name, &namespace)
}

/// Namespace governing the declaration at `before`: the name of the nearest
/// preceding `namespace` declaration, or empty for the global namespace.
/// Handles both `namespace A\B;` and `namespace A\B { … }`.
fn namespace_of(tokens: &[Token], before: usize) -> String {
    let Some(keyword) = tokens[..before]
        .iter()
        .rposition(|t| t.kind == TokenKind::Namespace)
    else {
        return String::new();
    };

    let mut name = String::new();
    for token in &tokens[keyword + 1..] {
        match token.kind {
            TokenKind::Whitespace | TokenKind::Comment if name.is_empty() => {}
            TokenKind::Identifier | TokenKind::NsSeparator => name.push_str(&token.text),
            _ => break,
        }
    }
    name
}

/// Normalize to a leading-`\` fully-qualified name. A written name that
/// already starts with `\` is absolute; anything else resolves relative to
/// the current namespace.
fn qualify(name: &str, namespace: &str) -> String {
    if name.starts_with('\\') {
        name.to_string()
    } else if namespace.is_empty() {
        format!("\\{name}")
    } else {
        format!("\\{namespace}\\{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, Severity};
    use crate::engine::Engine;
    use crate::registry::RuleRegistry;
    use std::sync::Arc;

    fn scan(source: &str) -> Vec<Diagnostic> {
        let mut registry = RuleRegistry::new();
        registry.register(Arc::new(SelfReferenceRule::new())).unwrap();
        Engine::new(registry).scan(source, "test").diagnostics
    }

    #[test]
    fn test_correct_usage_is_clean() {
        let diagnostics = scan("class Foo { function go() { return self::bar(); } }");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_incorrect_case() {
        let diagnostics = scan("class Foo { function go() { return Self::bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "IncorrectCase");
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(
            diagnostics[0].message,
            "Must use \"self::\" for local static member reference; found \"Self::\""
        );
    }

    #[test]
    fn test_own_class_name_not_used() {
        let diagnostics = scan("class Foo { function go() { return Foo::bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "NotUsed");
        assert_eq!(
            diagnostics[0].message,
            "Must use \"self::\" for local static member reference"
        );
    }

    #[test]
    fn test_not_used_reports_at_class_name_token() {
        let source = "class Foo { function go() { return Foo::bar(); } }";
        let diagnostics = scan(source);
        let tokens = crate::lexer::tokenize(source);
        let name_position = tokens
            .iter()
            .rposition(|t| t.text == "Foo")
            .unwrap();
        assert_eq!(diagnostics[0].location.position, name_position);
    }

    #[test]
    fn test_other_class_reference_is_clean() {
        let diagnostics = scan("class Foo { function go() { return Bar::bar(); } }");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_namespace_qualified_reference() {
        let diagnostics = scan(
            "namespace My\\Space;\nclass Foo { function go() { return \\My\\Space\\Foo::bar(); } }",
        );
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "NotUsed");
    }

    #[test]
    fn test_relative_reference_in_namespace() {
        let diagnostics =
            scan("namespace My\\Space;\nclass Foo { function go() { return Foo::bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "NotUsed");
    }

    #[test]
    fn test_same_name_other_namespace_is_clean() {
        let diagnostics = scan(
            "namespace My\\Space;\nclass Foo { function go() { return \\Other\\Foo::bar(); } }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_closure_exemption() {
        let diagnostics = scan(
            "class Foo { function go() { $f = function () { return Foo::bar(); }; } }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_space_before() {
        let diagnostics = scan("class Foo { function go() { return self ::bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "SpaceBefore");
        assert_eq!(
            diagnostics[0].message,
            "Expected 0 spaces before double colon; 1 found"
        );
    }

    #[test]
    fn test_space_after() {
        let diagnostics = scan("class Foo { function go() { return self:: bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "SpaceAfter");
        assert_eq!(
            diagnostics[0].message,
            "Expected 0 spaces after double colon; 1 found"
        );
    }

    #[test]
    fn test_space_both_sides() {
        let diagnostics = scan("class Foo { function go() { return self :: bar(); } }");
        let codes: Vec<&str> = diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["SpaceBefore", "SpaceAfter"]);
    }

    #[test]
    fn test_wide_gap_counts_length() {
        let diagnostics = scan("class Foo { function go() { return self   ::bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "Expected 0 spaces before double colon; 3 found"
        );
    }

    #[test]
    fn test_incorrect_case_short_circuits_spacing() {
        // Space after the :: would normally be reported, but the case
        // finding returns first.
        let diagnostics = scan("class Foo { function go() { return Self:: bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "IncorrectCase");
    }

    #[test]
    fn test_not_used_short_circuits_spacing() {
        let diagnostics = scan("class Foo { function go() { return Foo:: bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "NotUsed");
    }

    #[test]
    fn test_outside_class_scope_is_ignored() {
        let diagnostics = scan("function go() { return Foo ::bar(); }");
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_variable_callee_spacing_still_checked() {
        let diagnostics = scan("class Foo { function go() { return $c:: bar(); } }");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code, "SpaceAfter");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("Foo", ""), "\\Foo");
        assert_eq!(qualify("Foo", "My\\Space"), "\\My\\Space\\Foo");
        assert_eq!(qualify("\\My\\Space\\Foo", "My\\Space"), "\\My\\Space\\Foo");
        assert_eq!(qualify("Space\\Foo", "My"), "\\My\\Space\\Foo");
    }

    #[test]
    fn test_namespace_of_forms() {
        let tokens = crate::lexer::tokenize("namespace A\\B;\nclass Foo { }");
        let class_pos = tokens.iter().position(|t| t.text == "class").unwrap();
        assert_eq!(namespace_of(&tokens, class_pos), "A\\B");

        let tokens = crate::lexer::tokenize("namespace A { class Foo { } }");
        let class_pos = tokens.iter().position(|t| t.text == "class").unwrap();
        assert_eq!(namespace_of(&tokens, class_pos), "A");

        let tokens = crate::lexer::tokenize("class Foo { }");
        assert_eq!(namespace_of(&tokens, 0), "");
    }
}
