//! Multi-role code generation loop.
//!
//! Reads a request file, asks a President model for a directive, a Project
//! Manager model for a checklist, then lets Engineer models complete the
//! checklist task by task inside the project workspace.

use std::fs;
use std::io::{self as stdio, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use orgloop::core::target::{InferenceOrder, infer_main_file, resolve_target};
use orgloop::exit_codes;
use orgloop::io::checklist_store::ChecklistStore;
use orgloop::io::config::{OrgloopConfig, load_config, write_config};
use orgloop::io::invoke::ModelInvoker;
use orgloop::io::operator::{confirm, find_preset, presets};
use orgloop::io::transport::transport_from_config;
use orgloop::io::workspace::Workspace;
use orgloop::logging;
use orgloop::pipeline::{PipelineConfig, PipelineEvent, RunOutcome, run_pipeline};

#[derive(Parser)]
#[command(
    name = "orgloop",
    version,
    about = "Turn a request into a project via president, project manager and engineer models"
)]
struct Cli {
    /// Config file.
    #[arg(long, global = true, default_value = "orgloop.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config and an empty request file if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Run the pipeline against the request file.
    Run(RunArgs),
    /// Print the pending tasks of the persisted checklist.
    Pending {
        /// Workspace directory (defaults to the configured one).
        #[arg(long)]
        workspace: Option<PathBuf>,
    },
    /// List the model presets.
    Presets,
}

#[derive(Args)]
struct RunArgs {
    /// Request file (defaults to the configured one).
    #[arg(long)]
    request: Option<PathBuf>,

    /// Workspace directory (defaults to the configured one).
    #[arg(long)]
    workspace: Option<PathBuf>,

    /// Model preset to use instead of the configured models.
    #[arg(long)]
    preset: Option<String>,

    /// Clear a non-empty workspace without asking.
    #[arg(short, long, conflicts_with = "keep")]
    yes: bool,

    /// Keep a non-empty workspace without asking.
    #[arg(long)]
    keep: bool,
}

fn main() {
    dotenvy::dotenv().ok();
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Run(args) => cmd_run(&cli.config, args),
        Command::Pending { workspace } => cmd_pending(&cli.config, workspace),
        Command::Presets => cmd_presets(),
    }
}

fn cmd_init(config_path: &Path, force: bool) -> Result<i32> {
    let cfg = if force || !config_path.exists() {
        let cfg = OrgloopConfig::default();
        write_config(config_path, &cfg)?;
        println!("wrote {}", config_path.display());
        cfg
    } else {
        load_config(config_path)?
    };

    if !cfg.request_path.exists() {
        fs::write(&cfg.request_path, "")
            .with_context(|| format!("write {}", cfg.request_path.display()))?;
        println!("wrote {}", cfg.request_path.display());
    }
    Ok(exit_codes::OK)
}

fn cmd_run(config_path: &Path, args: RunArgs) -> Result<i32> {
    let mut cfg = load_config(config_path)?;
    if let Some(name) = &args.preset {
        cfg.models = find_preset(name)?.models;
    }
    if let Some(request) = args.request {
        cfg.request_path = request;
    }
    if let Some(workspace) = args.workspace {
        cfg.workspace_dir = workspace;
    }
    cfg.validate()?;

    let request = read_request(&cfg.request_path)?;
    let workspace = Workspace::new(&cfg.workspace_dir);
    // A blank request halts at start; never clear the workspace for it.
    if !request.trim().is_empty() && workspace.is_non_empty()? {
        let clean = if args.yes {
            true
        } else if args.keep {
            false
        } else {
            let question = format!(
                "Workspace {} is not empty. Delete its contents?",
                workspace.root().display()
            );
            confirm(&mut stdio::stdin().lock(), &mut stdio::stdout(), &question)?
        };
        if clean {
            workspace.clean()?;
            println!("cleared {}", workspace.root().display());
        }
    }

    let transport = transport_from_config(&cfg.transport)?;
    let invoker = ModelInvoker::from_config(transport, &cfg);
    let pipeline = PipelineConfig::from_config(&cfg);
    let outcome = run_pipeline(&workspace, &request, &invoker, &pipeline, print_event)?;

    match outcome {
        RunOutcome::Done {
            tasks_completed,
            files,
        } => {
            println!("done: {tasks_completed} task(s) completed");
            println!("files in {}:", workspace.root().display());
            for file in files {
                println!("  {file}");
            }
            Ok(exit_codes::OK)
        }
        RunOutcome::Halted {
            tasks_completed,
            report,
        } => {
            println!("{report}");
            println!("{tasks_completed} task(s) completed before the halt");
            Ok(exit_codes::HALTED)
        }
    }
}

fn print_event(event: &PipelineEvent<'_>) {
    match event {
        PipelineEvent::DirectiveIssued(_) => println!("president: directive issued"),
        PipelineEvent::ChecklistWritten { tasks } => {
            println!("project manager: checklist with {tasks} task(s)");
        }
        PipelineEvent::MainFileInferred(file) => println!("main file: {file}"),
        PipelineEvent::TaskStarted(assignment) => println!(
            "engineer #{} -> {}: {}",
            assignment.engineer_id, assignment.target_file, assignment.task
        ),
        PipelineEvent::TaskCompleted(_) => {}
    }
}

/// Read the request; a missing file reads as empty and halts the run.
fn read_request(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(request) => Ok(request),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "request file not found");
            Ok(String::new())
        }
        Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
    }
}

fn cmd_pending(config_path: &Path, workspace: Option<PathBuf>) -> Result<i32> {
    let cfg = load_config(config_path)?;
    let workspace = Workspace::new(workspace.unwrap_or(cfg.workspace_dir));
    let store = ChecklistStore::new(&workspace, cfg.checklist_file);
    if !store.exists() {
        bail!(
            "no checklist at {}",
            workspace.path(store.file()).display()
        );
    }

    let checklist = store.load_parsed()?;
    let main_file = infer_main_file(checklist.items(), InferenceOrder::default());
    let mut pending = 0;
    for item in checklist.pending() {
        pending += 1;
        match resolve_target(&item.description, main_file.as_deref()) {
            Ok(target) => println!("{}\t{}", item.description, target.path),
            Err(_) => println!("{}\t<unroutable>", item.description),
        }
    }
    if pending == 0 {
        return Ok(exit_codes::COMPLETE);
    }
    Ok(exit_codes::OK)
}

fn cmd_presets() -> Result<i32> {
    for preset in presets() {
        println!("{:<10} {}", preset.name, preset.summary);
        println!("    president:       {}", preset.models.president.id);
        println!("    project_manager: {}", preset.models.project_manager.id);
        println!("    engineer:        {}", preset.models.engineer.id);
    }
    Ok(exit_codes::OK)
}
