//! Operator-facing choices: model presets and yes/no confirmation.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, anyhow};

use crate::io::config::{DEFAULT_MODEL, ModelChoice, RoleModels};

/// A named per-role model assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preset {
    pub name: &'static str,
    pub summary: &'static str,
    pub models: RoleModels,
}

/// Curated presets, `default` first.
pub fn presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "default",
            summary: "Mixtral for every role",
            models: RoleModels::uniform(ModelChoice::new(DEFAULT_MODEL)),
        },
        Preset {
            name: "balanced",
            summary: "Llama 3.1 70B plans, Qwen2.5 Coder writes code",
            models: RoleModels {
                president: ModelChoice::new("meta-llama/Llama-3.1-70B-Instruct"),
                project_manager: ModelChoice::new("meta-llama/Llama-3.1-70B-Instruct"),
                engineer: ModelChoice::new("Qwen/Qwen2.5-Coder-32B-Instruct"),
            },
        },
        Preset {
            name: "fast",
            summary: "small models, quick turns",
            models: RoleModels {
                president: ModelChoice::new("meta-llama/Llama-3.1-8B-Instruct"),
                project_manager: ModelChoice::new("meta-llama/Llama-3.1-8B-Instruct"),
                engineer: ModelChoice::new("Qwen/Qwen2.5-Coder-7B-Instruct"),
            },
        },
        Preset {
            name: "large",
            summary: "largest models, long per-call timeout",
            models: RoleModels {
                president: ModelChoice::new("meta-llama/Llama-3.3-70B-Instruct").with_timeout(600),
                project_manager: ModelChoice::new("meta-llama/Llama-3.3-70B-Instruct")
                    .with_timeout(600),
                engineer: ModelChoice::new("Qwen/Qwen3-Coder-480B-A35B-Instruct").with_timeout(900),
            },
        },
    ]
}

pub fn find_preset(name: &str) -> Result<Preset> {
    presets()
        .into_iter()
        .find(|preset| preset.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| {
            let names: Vec<&str> = presets().iter().map(|p| p.name).collect();
            anyhow!("unknown preset '{name}' (available: {})", names.join(", "))
        })
}

/// Ask `question` until the operator answers yes or no.
///
/// End of input counts as "no".
pub fn confirm<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<bool> {
    loop {
        write!(output, "{question} (y/n): ").context("write prompt")?;
        output.flush().context("flush prompt")?;

        let mut line = String::new();
        if input.read_line(&mut line).context("read answer")? == 0 {
            writeln!(output).context("write prompt")?;
            return Ok(false);
        }
        match line.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => writeln!(output, "Please answer 'y' or 'n'.").context("write prompt")?,
        }
    }
}
