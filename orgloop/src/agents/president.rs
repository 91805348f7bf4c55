//! President: turns the request into a directive for the Project Manager.

use anyhow::Result;
use tracing::info;

use crate::core::types::Role;
use crate::io::prompt::PresidentInput;
use crate::io::transport::Transport;

use super::AgentContext;

/// Issue the directive for `request`. The reply is kept as prose.
pub fn issue_directive<T: Transport>(ctx: &AgentContext<'_, T>, request: &str) -> Result<String> {
    info!("president's turn");
    let directive = ctx
        .agent(Role::President)
        .run(&PresidentInput { request })?;
    info!(bytes = directive.len(), "directive issued");
    Ok(directive)
}
