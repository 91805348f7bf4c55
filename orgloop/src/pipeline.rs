//! The orchestration state machine.
//!
//! ```text
//! Start -> President -> Planning -> Engineering (loop) -> Done
//!   \__________\___________\______________\____________-> Halted
//! ```
//!
//! Everything runs on the calling thread, one model call at a time. The
//! checklist on disk is the only record of progress; each completion is a
//! full read-modify-write of that document.

use std::fmt;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::agents::{AgentContext, engineer, president, project_manager};
use crate::core::checklist::Checklist;
use crate::core::error::OrchestraError;
use crate::core::target::{
    InferenceOrder, TargetSource, infer_main_file, resolve_target, validate_relative,
};
use crate::core::types::{EngineerAssignment, Stage, engineer_id};
use crate::io::checklist_store::ChecklistStore;
use crate::io::config::{OrgloopConfig, RoleModels};
use crate::io::invoke::ModelInvoker;
use crate::io::prompt::PromptEngine;
use crate::io::transport::Transport;
use crate::io::workspace::Workspace;

/// Settings for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub models: RoleModels,
    /// Checklist file name, relative to the workspace.
    pub checklist_file: String,
    pub inference_order: InferenceOrder,
    /// Pause after each completed task.
    pub task_pause: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            models: RoleModels::default(),
            checklist_file: "README.md".to_string(),
            inference_order: InferenceOrder::default(),
            task_pause: Duration::from_secs(1),
        }
    }
}

impl PipelineConfig {
    pub fn from_config(config: &OrgloopConfig) -> Self {
        Self {
            models: config.models.clone(),
            checklist_file: config.checklist_file.clone(),
            inference_order: InferenceOrder::default(),
            task_pause: config.task_pause(),
        }
    }
}

/// Progress notifications, in the order they happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent<'a> {
    DirectiveIssued(&'a str),
    ChecklistWritten { tasks: usize },
    MainFileInferred(&'a str),
    TaskStarted(&'a EngineerAssignment),
    TaskCompleted(&'a EngineerAssignment),
}

/// Where and why a run stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HaltReport {
    pub stage: Stage,
    /// The task being worked on, for engineering-stage failures.
    pub task: Option<String>,
    pub error: OrchestraError,
}

impl fmt::Display for HaltReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.task {
            Some(task) => write!(
                f,
                "halted at {} stage on task `{}`: {}",
                self.stage, task, self.error
            ),
            None => write!(f, "halted at {} stage: {}", self.stage, self.error),
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every task completed; `files` lists the workspace.
    Done {
        tasks_completed: u32,
        files: Vec<String>,
    },
    Halted {
        tasks_completed: u32,
        report: HaltReport,
    },
}

/// Run bookkeeping owned by the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub stage: Stage,
    /// First file name seen in the checklist; fixed once set.
    pub main_file: Option<String>,
    /// Engineer turns started so far; drives the engineer rota.
    pub task_counter: u32,
    pub tasks_completed: u32,
}

impl Default for RunState {
    fn default() -> Self {
        Self {
            stage: Stage::Start,
            main_file: None,
            task_counter: 0,
            tasks_completed: 0,
        }
    }
}

impl RunState {
    fn halt(&self, task: Option<&str>, error: OrchestraError) -> RunOutcome {
        let report = HaltReport {
            stage: self.stage,
            task: task.map(str::to_string),
            error,
        };
        error!(stage = %report.stage, task = ?report.task, error = %report.error, "run halted");
        RunOutcome::Halted {
            tasks_completed: self.tasks_completed,
            report,
        }
    }

    /// Turn a stage error into a halt; non-domain errors propagate.
    fn halt_on(&self, task: Option<&str>, err: anyhow::Error) -> Result<RunOutcome> {
        match err.downcast::<OrchestraError>() {
            Ok(domain) => Ok(self.halt(task, domain)),
            Err(other) => Err(other),
        }
    }
}

/// Drive `request` through every stage against `workspace`.
///
/// Domain failures (see [`OrchestraError`]) end in [`RunOutcome::Halted`];
/// only infrastructure errors such as an unwritable workspace are returned as
/// `Err`.
pub fn run_pipeline<T: Transport, F: FnMut(&PipelineEvent<'_>)>(
    workspace: &Workspace,
    request: &str,
    invoker: &ModelInvoker<T>,
    config: &PipelineConfig,
    mut on_event: F,
) -> Result<RunOutcome> {
    let mut state = RunState::default();
    if request.trim().is_empty() {
        return Ok(state.halt(None, OrchestraError::EmptyRequest));
    }

    workspace.ensure()?;
    let prompts = PromptEngine::new()?;
    let ctx = AgentContext {
        invoker,
        prompts: &prompts,
        models: &config.models,
    };
    let store = ChecklistStore::new(workspace, config.checklist_file.clone());

    state.stage = Stage::President;
    let directive = match president::issue_directive(&ctx, request) {
        Ok(directive) => directive,
        Err(err) => return state.halt_on(None, err),
    };
    on_event(&PipelineEvent::DirectiveIssued(&directive));

    state.stage = Stage::Planning;
    let checklist = match project_manager::plan(&ctx, &store, &directive) {
        Ok(checklist) => checklist,
        Err(err) => return state.halt_on(None, err),
    };
    on_event(&PipelineEvent::ChecklistWritten {
        tasks: checklist.len(),
    });

    state.stage = Stage::Engineering;
    loop {
        let document = store.load()?;
        let checklist = Checklist::parse(&document);
        let Some(task) = checklist.first_pending() else {
            break;
        };
        let description = task.description.clone();

        if state.main_file.is_none() {
            state.main_file = infer_main_file(checklist.items(), config.inference_order);
            if let Some(main_file) = &state.main_file {
                info!(main_file = %main_file, "inferred project main file");
                on_event(&PipelineEvent::MainFileInferred(main_file));
            }
        }

        let target = match resolve_target(&description, state.main_file.as_deref()) {
            Ok(target) => target,
            Err(err) => return Ok(state.halt(Some(&description), err)),
        };
        if let Err(err) = validate_relative(&description, &target.path) {
            return Ok(state.halt(Some(&description), err));
        }
        if target.source == TargetSource::Inferred {
            warn!(task = %description, fallback = %target.path, "task names no file, using main file");
        }
        if target.path == store.file() {
            warn!(task = %description, "task targets the checklist file; the plan is written back after it");
        }

        state.task_counter += 1;
        let assignment = EngineerAssignment {
            engineer_id: engineer_id(state.task_counter),
            task: description,
            target_file: target.path,
        };
        on_event(&PipelineEvent::TaskStarted(&assignment));

        if let Err(err) = engineer::execute(&ctx, workspace, &assignment, &document) {
            return state.halt_on(Some(&assignment.task), err);
        }
        if let Err(err) = store.complete(&document, &assignment.task) {
            return state.halt_on(Some(&assignment.task), err);
        }
        state.tasks_completed += 1;
        info!(
            engineer = assignment.engineer_id,
            task = %assignment.task,
            completed = state.tasks_completed,
            "task marked complete"
        );
        on_event(&PipelineEvent::TaskCompleted(&assignment));

        if !config.task_pause.is_zero() {
            thread::sleep(config.task_pause);
        }
    }

    state.stage = Stage::Done;
    info!(tasks_completed = state.tasks_completed, "all tasks complete");
    Ok(RunOutcome::Done {
        tasks_completed: state.tasks_completed,
        files: workspace.list_files()?,
    })
}
