// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Gatehouse rule validator.
//!
//! Governance rules that apply to a request regardless of who sends it:
//! confirmation of destructive actions, candidate and guard-rule payload
//! requirements, and limits on what automated actors may do. Validation
//! collects every violation instead of stopping at the first.

pub mod config;
pub mod rules;
pub mod validator;

pub use config::ValidatorConfig;
pub use rules::{Rule, RULES};
pub use validator::{ConstitutionViolation, RuleValidator, ValidationReport, Violation};
