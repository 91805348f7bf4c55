//! Multi-role code generation loop.
//!
//! A free-text request passes through three model roles: a President that
//! issues a directive, a Project Manager that turns it into a markdown
//! checklist, and a small pool of Engineers that complete the checklist one
//! task at a time by rewriting files in a project workspace.
//!
//! - **[`core`]**: Pure logic (checklist grammar, sanitizing, task routing).
//!   No I/O.
//! - **[`io`]**: Side effects (config, transports, prompts, filesystem).
//! - **[`agents`]**: The role agent and its three role wrappers.
//! - **[`pipeline`]**: The state machine that drives a run to `Done` or a halt.

pub mod agents;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod pipeline;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
