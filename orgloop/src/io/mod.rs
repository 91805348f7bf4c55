//! I/O helpers: config, model transports, prompts and the workspace.

pub mod checklist_store;
pub mod config;
pub mod invoke;
pub mod operator;
pub mod process;
pub mod prompt;
pub mod transport;
pub mod workspace;
