//! Deterministic instruction pairs for each role.

use anyhow::{Context, Result};
use minijinja::Environment;
use serde::Serialize;

use crate::core::types::Role;

const PRESIDENT_SYSTEM: &str = include_str!("prompts/president_system.md");
const PRESIDENT_USER: &str = include_str!("prompts/president.md");
const PROJECT_MANAGER_SYSTEM: &str = include_str!("prompts/project_manager_system.md");
const PROJECT_MANAGER_USER: &str = include_str!("prompts/project_manager.md");
const ENGINEER_SYSTEM: &str = include_str!("prompts/engineer_system.md");
const ENGINEER_USER: &str = include_str!("prompts/engineer.md");

/// Inputs for the President turn.
#[derive(Debug, Clone, Serialize)]
pub struct PresidentInput<'a> {
    pub request: &'a str,
}

/// Inputs for the Project Manager turn.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectManagerInput<'a> {
    pub directive: &'a str,
    pub checklist_file: &'a str,
}

/// Inputs for one Engineer turn.
#[derive(Debug, Clone, Serialize)]
pub struct EngineerInput<'a> {
    pub engineer_id: u32,
    pub task: &'a str,
    pub target_file: &'a str,
    pub checklist: &'a str,
    /// Current file contents; empty when the file does not exist yet.
    pub existing_content: &'a str,
    pub fence_tag: &'a str,
}

/// A rendered system/user instruction pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            ("president_system", PRESIDENT_SYSTEM),
            ("president", PRESIDENT_USER),
            ("project_manager_system", PROJECT_MANAGER_SYSTEM),
            ("project_manager", PROJECT_MANAGER_USER),
            ("engineer_system", ENGINEER_SYSTEM),
            ("engineer", ENGINEER_USER),
        ] {
            env.add_template(name, source)
                .with_context(|| format!("load {name} template"))?;
        }
        Ok(Self { env })
    }

    /// Render the instruction pair for `role` from `input`.
    pub fn render<S: Serialize>(&self, role: Role, input: &S) -> Result<RenderedPrompt> {
        let system_name = format!("{}_system", role.as_str());
        let system = self
            .env
            .get_template(&system_name)?
            .render(input)
            .with_context(|| format!("render {system_name} template"))?;
        let user = self
            .env
            .get_template(role.as_str())?
            .render(input)
            .with_context(|| format!("render {} template", role.as_str()))?;
        Ok(RenderedPrompt { system, user })
    }
}

/// Code-fence language hint for a target file, from its extension.
pub fn fence_tag(target_file: &str) -> &str {
    let ext = std::path::Path::new(target_file)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("");
    match ext {
        "py" => "python",
        "rs" => "rust",
        "js" | "mjs" => "javascript",
        "ts" => "typescript",
        "md" => "markdown",
        "sh" => "bash",
        "yml" => "yaml",
        other => other,
    }
}
