//! Project Manager: turns the directive into the persisted checklist.

use anyhow::Result;
use tracing::{info, warn};

use crate::core::checklist::Checklist;
use crate::core::error::OrchestraError;
use crate::core::types::Role;
use crate::io::checklist_store::ChecklistStore;
use crate::io::prompt::ProjectManagerInput;
use crate::io::transport::Transport;

use super::AgentContext;

/// Plan the work for `directive` and persist the checklist.
///
/// Every task is asked to name its file in backticks, but that is only an
/// instruction; items without one fall back to the inferred main file later.
/// A reply with no task items is a [`OrchestraError::Planning`] failure and
/// nothing is persisted.
pub fn plan<T: Transport>(
    ctx: &AgentContext<'_, T>,
    store: &ChecklistStore,
    directive: &str,
) -> Result<Checklist> {
    info!("project manager's turn");
    let document = ctx.agent(Role::ProjectManager).run(&ProjectManagerInput {
        directive,
        checklist_file: store.file(),
    })?;

    let checklist = Checklist::parse(&document);
    if checklist.is_empty() {
        return Err(OrchestraError::Planning {
            reason: "reply contains no `- [ ]` task items".to_string(),
        }
        .into());
    }
    let unrouted = checklist
        .items()
        .iter()
        .filter(|item| item.target_file.is_none())
        .count();
    if unrouted > 0 {
        warn!(unrouted, "some tasks name no file and will use the main file");
    }

    store.save(&document)?;
    info!(
        file = store.file(),
        tasks = checklist.len(),
        "checklist written"
    );
    Ok(checklist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::RoleModels;
    use crate::io::prompt::PromptEngine;
    use crate::io::workspace::Workspace;
    use crate::test_support::{ScriptedReply, scripted_invoker};

    #[test]
    fn persists_sanitized_checklist() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let store = ChecklistStore::new(&ws, "README.md");
        let invoker = scripted_invoker(vec![ScriptedReply::ok(
            "```markdown\n# Tasks\n- [ ] Create `main.py`\n- [ ] Add logging\n```",
        )]);
        let prompts = PromptEngine::new().expect("prompts");
        let models = RoleModels::default();
        let ctx = AgentContext {
            invoker: &invoker,
            prompts: &prompts,
            models: &models,
        };

        let checklist = plan(&ctx, &store, "directive").expect("plan");
        assert_eq!(checklist.len(), 2);
        assert_eq!(
            store.load().expect("load"),
            "# Tasks\n- [ ] Create `main.py`\n- [ ] Add logging"
        );
    }

    #[test]
    fn reply_without_items_is_planning_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let store = ChecklistStore::new(&ws, "README.md");
        let invoker = scripted_invoker(vec![ScriptedReply::ok("Sure! Here is my plan.")]);
        let prompts = PromptEngine::new().expect("prompts");
        let models = RoleModels::default();
        let ctx = AgentContext {
            invoker: &invoker,
            prompts: &prompts,
            models: &models,
        };

        let err = plan(&ctx, &store, "directive").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestraError>(),
            Some(OrchestraError::Planning { .. })
        ));
        assert!(!store.exists());
    }
}
