// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Rule validator: runs every rule and collects the violations.

use std::sync::Arc;

use gatehouse_constitution::ConstitutionSource;
use gatehouse_core::Request;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ValidatorConfig;
use crate::rules::{self, RULES};

/// A single rule failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub rule_id: String,
    /// 1 = highest.
    pub priority: u8,
    pub description: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[P{}] {}: {}", self.priority, self.rule_id, self.description)
    }
}

/// Result of [`RuleValidator::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub compliant: bool,
    /// Ordered by priority, then rule order.
    pub violations: Vec<Violation>,
}

/// Returned by [`RuleValidator::enforce`] when a request breaks one or more
/// rules. The message lists every violation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("constitution violation: {}", join(.violations))]
pub struct ConstitutionViolation {
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ConstitutionViolation {
    /// Highest priority (lowest number) among the violations.
    pub fn top_priority(&self) -> Option<u8> {
        self.violations.iter().map(|v| v.priority).min()
    }
}

/// Stateless evaluator over the rule set.
///
/// When built with a constitution source, violation descriptions use the
/// document's rule wording.
#[derive(Debug, Clone)]
pub struct RuleValidator {
    config: ValidatorConfig,
    source: Option<Arc<ConstitutionSource>>,
}

impl RuleValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            config,
            source: None,
        }
    }

    /// Validator that reads rule descriptions from `source`.
    pub fn with_constitution(config: ValidatorConfig, source: Arc<ConstitutionSource>) -> Self {
        Self {
            config,
            source: Some(source),
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// See [`rules::is_destructive_operation`].
    pub fn is_destructive_operation(&self, request: &Request) -> bool {
        rules::is_destructive_operation(request, &self.config)
    }

    /// See [`rules::is_ai_actor`].
    pub fn is_ai_actor(&self, actor: &str) -> bool {
        rules::is_ai_actor(actor, &self.config)
    }

    /// Run every rule; never short-circuits.
    pub fn validate(&self, request: &Request) -> ValidationReport {
        let snapshot = self.source.as_ref().map(|s| s.snapshot());

        let mut violations: Vec<Violation> = RULES
            .iter()
            .filter_map(|rule| {
                let detail = (rule.check)(request, &self.config)?;
                let summary = snapshot
                    .as_ref()
                    .and_then(|c| c.rule(rule.id))
                    .map(|meta| meta.description.as_str())
                    .unwrap_or(rule.summary);
                Some(Violation {
                    rule_id: rule.id.to_string(),
                    priority: rule.priority,
                    description: format!("{} ({})", summary, detail),
                })
            })
            .collect();
        violations.sort_by_key(|v| v.priority);

        debug!(
            actor = %request.actor,
            action = %request.action,
            violations = violations.len(),
            "rule validation"
        );

        ValidationReport {
            compliant: violations.is_empty(),
            violations,
        }
    }

    /// Validate and fail with every violation if the request is not compliant.
    pub fn enforce(&self, request: &Request) -> Result<(), ConstitutionViolation> {
        let report = self.validate(request);
        if report.compliant {
            Ok(())
        } else {
            Err(ConstitutionViolation {
                violations: report.violations,
            })
        }
    }
}

impl Default for RuleValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}
