//! The scan engine: lex, build scopes, dispatch rules, collect diagnostics.
//!
//! One scan owns its token sequence, scope index and collector, and runs to
//! completion on the calling thread. [`Engine::scan_many`] parallelizes at
//! whole-scan granularity; the registry is shared read-only.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostic::{Diagnostic, DiagnosticCollector, Location};
use crate::lexer;
use crate::registry::RuleRegistry;
use crate::rule::{DiagnosticSink, RuleContext};
use crate::scope::{self, ScopeIndex};
use crate::token::Token;

/// Fatal input failures: no token model can be produced at all. Everything
/// recoverable becomes a diagnostic instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("source for `{unit}` is not valid UTF-8")]
    InvalidEncoding {
        unit: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Engine tuning. `jobs == 0` means use the detected CPU count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub parallel: bool,
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// One in-memory input for [`Engine::scan_many`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub id: String,
    pub text: String,
}

impl SourceUnit {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Outcome of scanning one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub unit: String,
    pub diagnostics: Vec<Diagnostic>,
    pub error_count: usize,
    pub warning_count: usize,
    pub tokens_scanned: usize,
    pub duration: Duration,
}

impl ScanResult {
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// The scanning engine. Construction takes ownership of a populated
/// registry; registration is closed from that point on, and any number
/// of concurrent scans may share the engine.
pub struct Engine {
    registry: Arc<RuleRegistry>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: RuleRegistry, config: EngineConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scan one unit of source text.
    ///
    /// Never fails: lexing is total and everything downstream reports
    /// through diagnostics.
    pub fn scan(&self, source: &str, unit: &str) -> ScanResult {
        let start = Instant::now();

        let tokens = lexer::tokenize(source);
        let (scopes, structural) = scope::build_scopes(&tokens);

        let mut collector = DiagnosticCollector::new();
        for diagnostic in structural {
            collector.emit(diagnostic);
        }

        self.dispatch(&tokens, &scopes, &mut collector);

        let counts = collector.count_by_severity();
        let result = ScanResult {
            unit: unit.to_string(),
            diagnostics: collector.drain(),
            error_count: counts.errors,
            warning_count: counts.warnings,
            tokens_scanned: tokens.len(),
            duration: start.elapsed(),
        };
        log::debug!(
            "scanned `{}`: {} tokens, {} errors, {} warnings",
            result.unit,
            result.tokens_scanned,
            result.error_count,
            result.warning_count
        );
        result
    }

    /// Scan raw bytes, failing only when they are not valid UTF-8.
    pub fn scan_bytes(&self, bytes: &[u8], unit: &str) -> Result<ScanResult, ScanError> {
        let source = std::str::from_utf8(bytes).map_err(|source| ScanError::InvalidEncoding {
            unit: unit.to_string(),
            source,
        })?;
        Ok(self.scan(source, unit))
    }

    /// Scan several units, in parallel when configured. Results come back in
    /// input order regardless of scheduling.
    pub fn scan_many(&self, units: &[SourceUnit]) -> Vec<ScanResult> {
        if self.config.parallel {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(if self.config.jobs > 0 {
                    self.config.jobs
                } else {
                    num_cpus::get()
                })
                .build()
                .unwrap_or_else(|_| rayon::ThreadPoolBuilder::new().build().unwrap());

            pool.install(|| units.par_iter().map(|u| self.scan(&u.text, &u.id)).collect())
        } else {
            units.iter().map(|u| self.scan(&u.text, &u.id)).collect()
        }
    }

    /// Single pass over the tokens, routing each to the rules triggered by
    /// its kind, gated by their scope requirements.
    fn dispatch(&self, tokens: &[Token], scopes: &ScopeIndex, collector: &mut DiagnosticCollector) {
        for (position, token) in tokens.iter().enumerate() {
            for rule in self.registry.candidates(token.kind) {
                let required = rule.scope_kinds();
                let scope = if required.is_empty() {
                    None
                } else {
                    match scopes.enclosing_matching(position, required) {
                        Some(id) => Some(id),
                        None => continue,
                    }
                };

                let ctx = RuleContext::new(tokens, scopes, position, scope);
                let mut sink = DiagnosticSink::new(tokens, rule.id(), collector);
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    rule.check(&ctx, &mut sink)
                }));

                match outcome {
                    Ok(Ok(())) => {}
                    Ok(Err(error)) => {
                        emit_rule_fault(collector, tokens, position, rule.id(), &error.to_string());
                    }
                    Err(payload) => {
                        emit_rule_fault(
                            collector,
                            tokens,
                            position,
                            rule.id(),
                            &panic_message(payload.as_ref()),
                        );
                    }
                }
            }
        }
    }
}

fn emit_rule_fault(
    collector: &mut DiagnosticCollector,
    tokens: &[Token],
    position: usize,
    rule_id: &str,
    message: &str,
) {
    log::warn!("rule `{rule_id}` failed at token {position}: {message}");
    let (line, column) = tokens
        .get(position)
        .map(|t| (t.line, t.column))
        .unwrap_or((0, 0));
    collector.emit(
        Diagnostic::error(
            "RuleFault",
            format!("Rule `{rule_id}` failed: {message}"),
            Location::new(position, line, column),
        )
        .with_rule(rule_id),
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "rule panicked".to_string()
    }
}
