//! Role agents: President, Project Manager and Engineer.
//!
//! All three share one shape, captured by [`RoleAgent`]: render the role's
//! instruction pair, invoke the model, optionally strip code fences. The
//! role modules add only their inputs and side effects.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::core::sanitize::sanitize;
use crate::core::types::Role;
use crate::io::config::{ModelChoice, RoleModels};
use crate::io::invoke::ModelInvoker;
use crate::io::prompt::PromptEngine;
use crate::io::transport::Transport;

pub mod engineer;
pub mod president;
pub mod project_manager;

/// Shared collaborators for every agent turn.
pub struct AgentContext<'a, T> {
    pub invoker: &'a ModelInvoker<T>,
    pub prompts: &'a PromptEngine,
    pub models: &'a RoleModels,
}

impl<'a, T: Transport> AgentContext<'a, T> {
    pub fn agent(&self, role: Role) -> RoleAgent<'a, T> {
        RoleAgent {
            role,
            model: self.models.for_role(role),
            invoker: self.invoker,
            prompts: self.prompts,
        }
    }
}

/// One role bound to its model and collaborators.
pub struct RoleAgent<'a, T> {
    role: Role,
    model: &'a ModelChoice,
    invoker: &'a ModelInvoker<T>,
    prompts: &'a PromptEngine,
}

impl<T: Transport> RoleAgent<'_, T> {
    /// Render, invoke and (for sanitizing roles) unwrap the reply.
    ///
    /// An exhausted invocation surfaces as
    /// [`OrchestraError::Transport`](crate::core::error::OrchestraError) inside
    /// the returned error.
    #[instrument(skip_all, fields(role = %self.role, model = %self.model.id))]
    pub fn run<S: Serialize>(&self, input: &S) -> Result<String> {
        let prompt = self.prompts.render(self.role, input)?;
        let reply = self
            .invoker
            .invoke(&prompt.system, &prompt.user, self.model)?;
        let content = if self.role.sanitizes_output() {
            sanitize(&reply).to_string()
        } else {
            reply
        };
        debug!(bytes = content.len(), "agent produced output");
        Ok(content)
    }
}
