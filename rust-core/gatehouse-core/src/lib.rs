// SPDX-License-Identifier: PMPL-1.0-or-later
//! Gatehouse core vocabulary
//!
//! Types every stage of the gateway pipeline agrees on:
//!
//! - [`Request`]: one inbound call (actor, action, resource, payload, session).
//! - [`Resource`]: the target of a call, either a `/type/id` path or a
//!   `{type, id}` object.
//! - [`action`]: normalization of free-form action strings into the
//!   `verb:resourceType` form used by permission strings.

pub mod action;
pub mod request;
pub mod resource;

pub use action::{normalize_action, required_permission, ActionParts};
pub use request::Request;
pub use resource::{Resource, UNKNOWN_RESOURCE_TYPE};
