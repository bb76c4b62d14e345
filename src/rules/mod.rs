//! Bundled rules.

pub mod empty_statement;
pub mod self_reference;

pub use empty_statement::EmptyStatementRule;
pub use self_reference::SelfReferenceRule;

use std::sync::Arc;

use crate::rule::Rule;

/// The bundled rule set in its default configuration.
pub fn builtin_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(SelfReferenceRule::new()),
        Arc::new(EmptyStatementRule::all_errors()),
    ]
}
