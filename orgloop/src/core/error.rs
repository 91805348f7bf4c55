//! Domain failure kinds surfaced by the pipeline.
//!
//! Infrastructure problems (unreadable workspace, bad config) travel as
//! `anyhow::Error`. The variants here are the failures a run is expected to
//! report and halt on.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestraError {
    /// The generation call errored on every attempt.
    #[error("model `{model}` failed after {attempts} attempt(s): {last_error}")]
    Transport {
        model: String,
        attempts: u32,
        last_error: String,
    },

    /// The project manager produced nothing that can drive the task loop.
    #[error("no usable checklist: {reason}")]
    Planning { reason: String },

    /// A task could not be routed to a workspace file.
    #[error("cannot route task `{task}`: {reason}")]
    Routing { task: String, reason: String },

    /// A pending line that was just parsed could not be found again.
    #[error("checklist has no pending line for `{description}`")]
    Consistency { description: String },

    /// The request document was missing or blank.
    #[error("request is empty")]
    EmptyRequest,
}
