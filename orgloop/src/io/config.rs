//! Orgloop configuration stored in `orgloop.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::target::validate_relative;
use crate::core::types::Role;

/// Default model for every role.
pub const DEFAULT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

/// Orgloop configuration (TOML).
///
/// Intended to be edited by humans. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OrgloopConfig {
    /// File holding the free-text development request.
    pub request_path: PathBuf,

    /// Directory the generated project is written into.
    pub workspace_dir: PathBuf,

    /// Checklist file name, relative to the workspace.
    pub checklist_file: String,

    /// Attempts per model call before the stage fails.
    pub max_attempts: u32,

    /// Pause between failed attempts, in seconds.
    pub backoff_secs: u64,

    /// Pause after each completed task, in milliseconds.
    pub task_pause_ms: u64,

    pub generation: GenerationConfig,
    pub models: RoleModels,
    pub transport: TransportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout unless the model carries its own override.
    pub timeout_secs: u64,
}

/// A model id plus an optional per-call timeout for slow models.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelChoice {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ModelChoice {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timeout_secs: None,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn timeout_override(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Model assignment for each role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoleModels {
    pub president: ModelChoice,
    pub project_manager: ModelChoice,
    pub engineer: ModelChoice,
}

impl RoleModels {
    pub fn uniform(model: ModelChoice) -> Self {
        Self {
            president: model.clone(),
            project_manager: model.clone(),
            engineer: model,
        }
    }

    pub fn for_role(&self, role: Role) -> &ModelChoice {
        match role {
            Role::President => &self.president,
            Role::ProjectManager => &self.project_manager,
            Role::Engineer => &self.engineer,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// OpenAI-compatible chat completions over HTTPS.
    Http,
    /// A local CLI that reads the conversation on stdin.
    Command,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransportConfig {
    pub kind: TransportKind,
    /// Chat-completions endpoint for the HTTP backend.
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// argv for the command backend; `{model}` is replaced by the model id.
    pub command: Vec<String>,
    /// Truncate command backend stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 4096,
            timeout_secs: 120,
        }
    }
}

impl Default for RoleModels {
    fn default() -> Self {
        Self::uniform(ModelChoice::new(DEFAULT_MODEL))
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            kind: TransportKind::Http,
            base_url: "https://router.huggingface.co/v1/chat/completions".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            command: vec!["llm".to_string(), "-m".to_string(), "{model}".to_string()],
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for OrgloopConfig {
    fn default() -> Self {
        Self {
            request_path: PathBuf::from("request.txt"),
            workspace_dir: PathBuf::from("Project"),
            checklist_file: "README.md".to_string(),
            max_attempts: 3,
            backoff_secs: 10,
            task_pause_ms: 1000,
            generation: GenerationConfig::default(),
            models: RoleModels::default(),
            transport: TransportConfig::default(),
        }
    }
}

impl OrgloopConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be > 0"));
        }
        if self.checklist_file.trim().is_empty() {
            return Err(anyhow!("checklist_file must not be empty"));
        }
        validate_relative("checklist", &self.checklist_file)
            .map_err(|_| anyhow!("checklist_file must be a file path inside the workspace"))?;
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(anyhow!("generation.temperature must be within 0.0..=2.0"));
        }
        if self.generation.max_tokens == 0 {
            return Err(anyhow!("generation.max_tokens must be > 0"));
        }
        if self.generation.timeout_secs == 0 {
            return Err(anyhow!("generation.timeout_secs must be > 0"));
        }
        for role in [Role::President, Role::ProjectManager, Role::Engineer] {
            let model = self.models.for_role(role);
            if model.id.trim().is_empty() {
                return Err(anyhow!("models.{role}.id must not be empty"));
            }
            if model.timeout_secs == Some(0) {
                return Err(anyhow!("models.{role}.timeout_secs must be > 0"));
            }
        }
        match self.transport.kind {
            TransportKind::Http => {
                if self.transport.base_url.trim().is_empty() {
                    return Err(anyhow!("transport.base_url must not be empty"));
                }
            }
            TransportKind::Command => {
                if self.transport.command.is_empty() || self.transport.command[0].trim().is_empty()
                {
                    return Err(anyhow!("transport.command must be a non-empty array"));
                }
                if self.transport.output_limit_bytes == 0 {
                    return Err(anyhow!("transport.output_limit_bytes must be > 0"));
                }
            }
        }
        Ok(())
    }

    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn task_pause(&self) -> Duration {
        Duration::from_millis(self.task_pause_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `OrgloopConfig::default()`.
pub fn load_config(path: &Path) -> Result<OrgloopConfig> {
    if !path.exists() {
        let cfg = OrgloopConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: OrgloopConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("invalid {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &OrgloopConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, OrgloopConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("orgloop.toml");
        let mut cfg = OrgloopConfig::default();
        cfg.models.engineer = ModelChoice::new("big/model").with_timeout(600);
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("orgloop.toml");
        fs::write(
            &path,
            "max_attempts = 5\n\n[models.engineer]\nid = \"coder/model\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.models.engineer.id, "coder/model");
        assert_eq!(cfg.models.president.id, DEFAULT_MODEL);
        assert_eq!(cfg.checklist_file, "README.md");
    }

    #[test]
    fn zero_attempts_is_rejected() {
        let cfg = OrgloopConfig {
            max_attempts: 0,
            ..OrgloopConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn checklist_file_must_stay_in_workspace() {
        for bad in ["../plan.md", "/tmp/plan.md", "docs/"] {
            let cfg = OrgloopConfig {
                checklist_file: bad.to_string(),
                ..OrgloopConfig::default()
            };
            let err = cfg.validate().unwrap_err();
            assert!(err.to_string().contains("inside the workspace"), "{bad}: {err}");
        }
        let nested = OrgloopConfig {
            checklist_file: "docs/TODO.md".to_string(),
            ..OrgloopConfig::default()
        };
        assert!(nested.validate().is_ok());
    }
}
