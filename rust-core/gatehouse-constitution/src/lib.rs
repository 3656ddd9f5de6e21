// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
//! Gatehouse constitution
//!
//! The constitution is the declarative document the gateway governs by:
//!
//! - **Priorities**: ordered rule groups (1 = data integrity, 2 = human
//!   oversight, 3 = AI transparency).
//! - **Rules**: descriptive metadata (id, description). Enforcement logic
//!   lives in `gatehouse-rules`; the document only names and describes.
//! - **Roles**: permission strings and constraints per actor.
//!
//! A [`ConstitutionSource`] owns the loaded document. It is constructed
//! explicitly and shared by `Arc` with the permission engine and rule
//! validator; hot reload is a method on that one object.

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod source;

pub use error::ConstitutionError;
pub use loader::DocumentFormat;
pub use model::{Constitution, Priority, Role, RuleMeta};
pub use source::ConstitutionSource;
