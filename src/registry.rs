//! Rule registration and trigger indexing.
//!
//! A registry is populated once, before any scan, and is read-only
//! afterwards; the engine shares it across concurrent scans.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::rule::Rule;
use crate::token::TokenKind;

/// Setup-time registration failures. These surface before any scan runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A different rule is already registered under this id.
    #[error("rule `{id}` is already registered with a different definition")]
    DuplicateRule { id: String },
}

/// Holds registered rules and an index from trigger kind to the rules that
/// asked for it, in registration order.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Arc<dyn Rule>>,
    by_id: HashMap<String, usize>,
    by_trigger: HashMap<TokenKind, Vec<usize>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule.
    ///
    /// Idempotent for the same rule instance: registering the same `Arc`
    /// again is a no-op. Registering a different instance under an id that is
    /// already taken fails with [`RegistryError::DuplicateRule`].
    pub fn register(&mut self, rule: Arc<dyn Rule>) -> Result<(), RegistryError> {
        if let Some(&existing) = self.by_id.get(rule.id()) {
            if Arc::ptr_eq(&self.rules[existing], &rule) {
                return Ok(());
            }
            return Err(RegistryError::DuplicateRule {
                id: rule.id().to_string(),
            });
        }

        log::debug!("registering rule `{}`", rule.id());
        let index = self.rules.len();
        self.by_id.insert(rule.id().to_string(), index);
        for &kind in rule.trigger_kinds() {
            self.by_trigger.entry(kind).or_default().push(index);
        }
        self.rules.push(rule);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Rule>> {
        self.by_id.get(id).map(|&index| &self.rules[index])
    }

    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules triggered by the given token kind, in registration order.
    pub fn candidates(&self, kind: TokenKind) -> impl Iterator<Item = &dyn Rule> {
        self.by_trigger
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|&index| self.rules[index].as_ref())
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.rules.iter().map(|r| r.id()).collect();
        f.debug_struct("RuleRegistry").field("rules", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{DiagnosticSink, RuleContext, RuleError};

    struct FakeRule {
        id: &'static str,
        triggers: Vec<TokenKind>,
    }

    impl Rule for FakeRule {
        fn id(&self) -> &str {
            self.id
        }

        fn trigger_kinds(&self) -> &[TokenKind] {
            &self.triggers
        }

        fn check(
            &self,
            _ctx: &RuleContext<'_>,
            _sink: &mut DiagnosticSink<'_>,
        ) -> Result<(), RuleError> {
            Ok(())
        }
    }

    fn fake(id: &'static str, triggers: Vec<TokenKind>) -> Arc<dyn Rule> {
        Arc::new(FakeRule { id, triggers })
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = RuleRegistry::new();
        registry.register(fake("a", vec![TokenKind::If])).unwrap();
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_some());
        assert!(registry.get("b").is_none());
    }

    #[test]
    fn test_same_instance_twice_is_noop() {
        let mut registry = RuleRegistry::new();
        let rule = fake("a", vec![TokenKind::If]);
        registry.register(Arc::clone(&rule)).unwrap();
        registry.register(rule).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.candidates(TokenKind::If).count(), 1);
    }

    #[test]
    fn test_conflicting_registration_fails() {
        let mut registry = RuleRegistry::new();
        registry.register(fake("a", vec![TokenKind::If])).unwrap();
        let err = registry
            .register(fake("a", vec![TokenKind::While]))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRule {
                id: "a".to_string()
            }
        );
        // The original registration is untouched.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.candidates(TokenKind::While).count(), 0);
    }

    #[test]
    fn test_candidates_in_registration_order() {
        let mut registry = RuleRegistry::new();
        registry
            .register(fake("second", vec![TokenKind::If, TokenKind::While]))
            .unwrap();
        registry.register(fake("first", vec![TokenKind::If])).unwrap();

        let ids: Vec<&str> = registry
            .candidates(TokenKind::If)
            .map(|rule| rule.id())
            .collect();
        assert_eq!(ids, vec!["second", "first"]);

        let ids: Vec<&str> = registry
            .candidates(TokenKind::While)
            .map(|rule| rule.id())
            .collect();
        assert_eq!(ids, vec!["second"]);
    }

    #[test]
    fn test_candidates_for_unregistered_kind_empty() {
        let registry = RuleRegistry::new();
        assert_eq!(registry.candidates(TokenKind::Do).count(), 0);
    }
}
