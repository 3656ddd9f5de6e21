// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Handler and plugin contracts.
//
// Handlers own one action each. Plugins wrap every dispatch: `pre` hooks run
// after the permission and rule checks pass, `post` hooks after the handler
// succeeds. A failing hook aborts the call like a failing handler.

use std::future::Future;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::RequestContext;
use crate::error::HandlerError;

/// Business operation bound to an action name.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: &RequestContext) -> Result<Value, HandlerError>;
}

/// Handler built from an async closure. See [`handler_fn`].
pub struct FnHandler<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`]. The closure receives its own copy
/// of the context.
pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    FnHandler { f }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, HandlerError>> + Send + 'static,
{
    async fn handle(&self, ctx: &RequestContext) -> Result<Value, HandlerError> {
        (self.f)(ctx.clone()).await
    }
}

/// Cross-cutting hook around every dispatch.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Runs before the handler.
    async fn pre(&self, _ctx: &RequestContext) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Runs after a successful handler call; may amend the result.
    async fn post(&self, _ctx: &RequestContext, _result: &mut Value) -> Result<(), HandlerError> {
        Ok(())
    }
}
