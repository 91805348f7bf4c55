//! Shared deterministic types for the orchestration core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of engineer identities the rota cycles through.
pub const ENGINEER_POOL: u32 = 2;

/// Pipeline stage a run is in (or halted at).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    President,
    Planning,
    Engineering,
    Done,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::President => "president",
            Stage::Planning => "planning",
            Stage::Engineering => "engineering",
            Stage::Done => "done",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model role driven by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    President,
    ProjectManager,
    Engineer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::President => "president",
            Role::ProjectManager => "project_manager",
            Role::Engineer => "engineer",
        }
    }

    /// Whether replies from this role are stripped of code fences.
    pub fn sanitizes_output(self) -> bool {
        !matches!(self, Role::President)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engineer label for the `sequence`-th task (1-indexed): 1, 2, 1, 2, ...
pub fn engineer_id(sequence: u32) -> u32 {
    (sequence.saturating_sub(1)) % ENGINEER_POOL + 1
}

/// One engineer turn: who works on which task and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineerAssignment {
    pub engineer_id: u32,
    pub task: String,
    pub target_file: String,
}
