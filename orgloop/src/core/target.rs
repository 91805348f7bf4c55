//! Routing a task to the workspace file it should overwrite.

use std::path::{Component, Path};

use super::checklist::{TaskItem, TaskStatus};
use super::error::OrchestraError;

/// Where a resolved target came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetSource {
    /// Named in the task description.
    Explicit,
    /// Fell back to the inferred main file.
    Inferred,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub path: String,
    pub source: TargetSource,
}

/// Order in which checklist items are scanned when inferring the main file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InferenceOrder {
    /// Every item in document order, regardless of status.
    #[default]
    Document,
    /// Pending items first, then completed ones, each in document order.
    PendingFirst,
}

/// First non-empty backtick-delimited token in `text`.
pub fn extract_file_token(text: &str) -> Option<&str> {
    let mut rest = text;
    while let Some(open) = rest.find('`') {
        let after = &rest[open + 1..];
        let close = after.find('`')?;
        let token = &after[..close];
        if !token.is_empty() {
            return Some(token);
        }
        rest = &after[close + 1..];
    }
    None
}

/// Resolve the target file for a task description.
pub fn resolve_target(
    description: &str,
    cached_main_file: Option<&str>,
) -> Result<ResolvedTarget, OrchestraError> {
    if let Some(token) = extract_file_token(description) {
        return Ok(ResolvedTarget {
            path: token.to_string(),
            source: TargetSource::Explicit,
        });
    }
    match cached_main_file {
        Some(main) => Ok(ResolvedTarget {
            path: main.to_string(),
            source: TargetSource::Inferred,
        }),
        None => Err(OrchestraError::Routing {
            task: description.to_string(),
            reason: "no file named in backticks and no main file inferred".to_string(),
        }),
    }
}

/// First file name carried by any item, scanned in `order`.
pub fn infer_main_file(items: &[TaskItem], order: InferenceOrder) -> Option<String> {
    let first_in = |status: Option<TaskStatus>| {
        items
            .iter()
            .filter(|item| status.is_none_or(|s| item.status == s))
            .find_map(|item| item.target_file.clone())
    };
    match order {
        InferenceOrder::Document => first_in(None),
        InferenceOrder::PendingFirst => {
            first_in(Some(TaskStatus::Pending)).or_else(|| first_in(Some(TaskStatus::Complete)))
        }
    }
}

/// Reject targets that are absolute or climb out of the workspace.
pub fn validate_relative(task: &str, target: &str) -> Result<(), OrchestraError> {
    let reject = |reason: &str| OrchestraError::Routing {
        task: task.to_string(),
        reason: format!("target `{target}` {reason}"),
    };
    if target.trim().is_empty() {
        return Err(reject("is empty"));
    }
    if target.ends_with('/') || target.ends_with('\\') {
        return Err(reject("names a directory"));
    }
    let path = Path::new(target);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return Err(reject("escapes the workspace")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject("must be relative to the workspace"));
            }
        }
    }
    if path.components().all(|c| c == Component::CurDir) {
        return Err(reject("does not name a file"));
    }
    Ok(())
}
