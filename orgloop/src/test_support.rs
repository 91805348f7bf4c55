//! Test-only helpers: scripted transports and scratch workspaces.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

use anyhow::{Result, anyhow};

use crate::io::invoke::{GenerationSettings, ModelInvoker, RetryPolicy};
use crate::io::transport::{GenerationRequest, Transport};
use crate::io::workspace::Workspace;
use crate::pipeline::PipelineConfig;

/// One queued transport outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Ok(String),
    Err(String),
}

impl ScriptedReply {
    pub fn ok(text: impl Into<String>) -> Self {
        Self::Ok(text.into())
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self::Err(message.into())
    }
}

/// Transport that replays queued replies and records every request.
///
/// Running past the end of the script is an error, like a dead backend.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<ScriptedReply>>,
    requests: RefCell<Vec<GenerationRequest>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.borrow().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(ScriptedReply::Ok(text)) => Ok(text),
            Some(ScriptedReply::Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted transport exhausted")),
        }
    }
}

/// Invoker over a scripted transport with 3 attempts and no backoff.
pub fn scripted_invoker(replies: Vec<ScriptedReply>) -> ModelInvoker<ScriptedTransport> {
    ModelInvoker::new(
        ScriptedTransport::new(replies),
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::ZERO,
        },
        GenerationSettings::default(),
    )
}

/// Pipeline settings with no pauses, for fast tests.
pub fn quick_pipeline_config() -> PipelineConfig {
    PipelineConfig {
        task_pause: Duration::ZERO,
        ..PipelineConfig::default()
    }
}

/// A workspace inside a temporary directory that is removed on drop.
pub struct TestWorkspace {
    _temp: tempfile::TempDir,
    workspace: Workspace,
}

impl TestWorkspace {
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let workspace = Workspace::new(temp.path().join("Project"));
        Ok(Self {
            _temp: temp,
            workspace,
        })
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }
}
