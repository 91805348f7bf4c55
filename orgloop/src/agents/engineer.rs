//! Engineer: rewrites one workspace file to complete one task.

use anyhow::Result;
use tracing::info;

use crate::core::error::OrchestraError;
use crate::core::types::{EngineerAssignment, Role};
use crate::io::prompt::{EngineerInput, fence_tag};
use crate::io::transport::Transport;
use crate::io::workspace::Workspace;

use super::AgentContext;

/// Run one engineer turn and overwrite the target file with the reply.
///
/// `checklist` is the current checklist document, passed for context. A
/// target that cannot be read or written (a directory, or a path under an
/// existing file) is a [`OrchestraError::Routing`] failure.
pub fn execute<T: Transport>(
    ctx: &AgentContext<'_, T>,
    workspace: &Workspace,
    assignment: &EngineerAssignment,
    checklist: &str,
) -> Result<()> {
    info!(
        engineer = assignment.engineer_id,
        target = %assignment.target_file,
        task = %assignment.task,
        "engineer's turn"
    );
    let existing = workspace
        .read_file(&assignment.target_file)
        .map_err(|err| unusable_target(assignment, &err))?;
    let content = ctx.agent(Role::Engineer).run(&EngineerInput {
        engineer_id: assignment.engineer_id,
        task: &assignment.task,
        target_file: &assignment.target_file,
        checklist,
        existing_content: &existing,
        fence_tag: fence_tag(&assignment.target_file),
    })?;

    workspace
        .write_file(&assignment.target_file, &content)
        .map_err(|err| unusable_target(assignment, &err))?;
    info!(
        engineer = assignment.engineer_id,
        target = %assignment.target_file,
        "file updated"
    );
    Ok(())
}

fn unusable_target(assignment: &EngineerAssignment, err: &anyhow::Error) -> OrchestraError {
    OrchestraError::Routing {
        task: assignment.task.clone(),
        reason: format!("target `{}` is unusable: {err:#}", assignment.target_file),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::config::RoleModels;
    use crate::io::prompt::PromptEngine;
    use crate::test_support::{ScriptedReply, scripted_invoker};

    fn assignment() -> EngineerAssignment {
        EngineerAssignment {
            engineer_id: 2,
            task: "Add a `--name` flag to `app/cli.py`".to_string(),
            target_file: "app/cli.py".to_string(),
        }
    }

    #[test]
    fn overwrites_target_with_sanitized_reply() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        ws.write_file("app/cli.py", "print('old')").expect("seed");
        let invoker = scripted_invoker(vec![ScriptedReply::ok("```python\nprint('new')\n```")]);
        let prompts = PromptEngine::new().expect("prompts");
        let models = RoleModels::default();
        let ctx = AgentContext {
            invoker: &invoker,
            prompts: &prompts,
            models: &models,
        };

        execute(&ctx, &ws, &assignment(), "- [ ] checklist").expect("execute");

        assert_eq!(ws.read_file("app/cli.py").expect("read"), "print('new')");
        let prompt = &invoker.transport().requests()[0].messages[1].content;
        assert!(prompt.contains("Engineer #2"));
        assert!(prompt.contains("print('old')"));
        assert!(prompt.contains("- [ ] checklist"));
    }

    #[test]
    fn failed_invocation_leaves_file_untouched() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let invoker = scripted_invoker(vec![
            ScriptedReply::err("503"),
            ScriptedReply::err("503"),
            ScriptedReply::err("503"),
        ]);
        let prompts = PromptEngine::new().expect("prompts");
        let models = RoleModels::default();
        let ctx = AgentContext {
            invoker: &invoker,
            prompts: &prompts,
            models: &models,
        };

        let err = execute(&ctx, &ws, &assignment(), "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestraError>(),
            Some(OrchestraError::Transport { .. })
        ));
        assert!(ws.list_files().expect("list").is_empty());
    }

    #[test]
    fn target_under_existing_file_is_routing_failure() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        ws.write_file("app.py", "x = 1").expect("seed");
        let invoker = scripted_invoker(vec![ScriptedReply::ok("y = 2")]);
        let prompts = PromptEngine::new().expect("prompts");
        let models = RoleModels::default();
        let ctx = AgentContext {
            invoker: &invoker,
            prompts: &prompts,
            models: &models,
        };
        let assignment = EngineerAssignment {
            engineer_id: 1,
            task: "Extend `app.py/extra.py`".to_string(),
            target_file: "app.py/extra.py".to_string(),
        };

        let err = execute(&ctx, &ws, &assignment, "").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestraError>(),
            Some(OrchestraError::Routing { task, .. }) if task == "Extend `app.py/extra.py`"
        ));
        assert_eq!(ws.read_file("app.py").expect("read"), "x = 1");
    }
}
