//! Tokenlint - A token-level static analysis engine
//!
//! A small, fast engine for sniff-style source checks: it lexes source text
//! into a positioned token stream, tracks brace scopes in a single pass, and
//! dispatches matching tokens to registered rules, collecting ordered
//! diagnostics for an external reporter.
//!
//! # Architecture
//!
//! ```text
//! source text -> Lexer -> Scope Tracker -> Dispatcher -> Rules
//!                                              |
//!                                              v
//!                                     Diagnostic Collector
//! ```
//!
//! Data flows strictly forward; rules see read-only views and report through
//! a sink. One registry, populated before scanning, serves any number of
//! concurrent scans.
//!
//! # Example
//!
//! ```
//! use tokenlint::{Engine, RuleRegistry};
//!
//! let mut registry = RuleRegistry::new();
//! for rule in tokenlint::rules::builtin_rules() {
//!     registry.register(rule).unwrap();
//! }
//!
//! let engine = Engine::new(registry);
//! let result = engine.scan("class Foo { function go() { return Foo::bar(); } }", "demo.php");
//! assert_eq!(result.diagnostics.len(), 1);
//! assert_eq!(result.diagnostics[0].code, "NotUsed");
//! ```

pub mod diagnostic;
pub mod engine;
pub mod lexer;
pub mod registry;
pub mod rule;
pub mod scope;
pub mod token;

// Re-export main types
pub use diagnostic::{Diagnostic, DiagnosticCollector, Location, Severity, SeverityCounts};
pub use engine::{Engine, EngineConfig, ScanError, ScanResult, SourceUnit};
pub use lexer::tokenize;
pub use registry::{RegistryError, RuleRegistry};
pub use rule::{DiagnosticSink, Rule, RuleContext, RuleError};
pub use scope::{build_scopes, ScopeId, ScopeIndex, ScopeSpan};
pub use token::{Token, TokenKind};

// Bundled rules
pub mod rules;
