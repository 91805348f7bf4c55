//! Checklist load/save helpers.

use anyhow::Result;
use tracing::debug;

use crate::core::checklist::{Checklist, complete_first};
use crate::core::error::OrchestraError;
use crate::io::workspace::Workspace;

/// The persisted checklist document at a fixed workspace-relative path.
#[derive(Debug, Clone)]
pub struct ChecklistStore {
    workspace: Workspace,
    file: String,
}

impl ChecklistStore {
    pub fn new(workspace: &Workspace, file: impl Into<String>) -> Self {
        Self {
            workspace: workspace.clone(),
            file: file.into(),
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn exists(&self) -> bool {
        self.workspace.path(&self.file).is_file()
    }

    /// Raw document; empty when nothing has been persisted yet.
    pub fn load(&self) -> Result<String> {
        self.workspace.read_file(&self.file)
    }

    pub fn load_parsed(&self) -> Result<Checklist> {
        Ok(Checklist::parse(&self.load()?))
    }

    pub fn save(&self, document: &str) -> Result<()> {
        debug!(file = %self.file, "saving checklist");
        self.workspace.write_file_atomic(&self.file, document)
    }

    /// Flip `description` in `document` and write the result back.
    ///
    /// `document` is the checklist as read before the task ran, so the plan
    /// survives even when the task itself rewrote the checklist file. A
    /// missing pending line surfaces as [`OrchestraError::Consistency`] inside
    /// the returned error; nothing is written in that case.
    pub fn complete(&self, document: &str, description: &str) -> Result<()> {
        let updated = complete_first(document, description)?;
        self.save(&updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::checklist::parse_pending;

    #[test]
    fn complete_persists_flip() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let store = ChecklistStore::new(&ws, "README.md");
        assert!(!store.exists());
        assert_eq!(store.load().expect("load"), "");

        store
            .save("# Plan\n- [ ] one `a.py`\n- [ ] two\n")
            .expect("save");
        let before = store.load().expect("load");
        store.complete(&before, "one `a.py`").expect("complete");

        let doc = store.load().expect("load");
        assert_eq!(doc, "# Plan\n- [x] one `a.py`\n- [ ] two\n");
        assert_eq!(parse_pending(&doc), vec!["two".to_string()]);
    }

    #[test]
    fn complete_missing_line_is_consistency_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let store = ChecklistStore::new(&ws, "README.md");
        store.save("- [x] done\n").expect("save");

        let err = store.complete("- [x] done\n", "missing").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OrchestraError>(),
            Some(OrchestraError::Consistency { .. })
        ));
        assert_eq!(store.load().expect("load"), "- [x] done\n");
    }

    #[test]
    fn complete_restores_plan_over_rewritten_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        let store = ChecklistStore::new(&ws, "README.md");
        let plan = "- [ ] Document usage in `README.md`\n";
        store.save(plan).expect("save");
        ws.write_file("README.md", "# Greeter\nRun it.").expect("overwrite");

        store
            .complete(plan, "Document usage in `README.md`")
            .expect("complete");
        assert_eq!(
            store.load().expect("load"),
            "- [x] Document usage in `README.md`\n"
        );
    }
}
