//! Grammar for the markdown task checklist.
//!
//! Only item lines carry structure:
//!
//! ```text
//! - [ ] pending description, may name `a/file.py`
//! - [x] completed description
//! ```
//!
//! Everything else in the document is prose and is preserved byte for byte
//! through every mutation.

use std::sync::LazyLock;

use regex::Regex;

use super::error::OrchestraError;
use super::target::extract_file_token;

static ITEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<indent>[ \t]*)-[ \t]*\[(?P<status>[ \t]*|[xX])\][ \t]*(?P<desc>.*?)[ \t\r\n]*$")
        .expect("checklist item regex should be valid")
});

/// Completion state of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Pending,
    Complete,
}

impl TaskStatus {
    pub fn marker(self) -> &'static str {
        match self {
            TaskStatus::Pending => "- [ ]",
            TaskStatus::Complete => "- [x]",
        }
    }
}

/// One parsed checklist entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    /// Zero-based line index in the source document.
    pub line: usize,
    pub description: String,
    /// First backtick-quoted token in the description.
    pub target_file: Option<String>,
    pub status: TaskStatus,
}

impl TaskItem {
    pub fn is_pending(&self) -> bool {
        self.status == TaskStatus::Pending
    }
}

/// Typed view over a checklist document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    items: Vec<TaskItem>,
}

impl Checklist {
    pub fn parse(document: &str) -> Self {
        let items = document
            .split_inclusive('\n')
            .enumerate()
            .filter_map(|(line, text)| parse_item(line, text))
            .collect();
        Self { items }
    }

    pub fn items(&self) -> &[TaskItem] {
        &self.items
    }

    pub fn pending(&self) -> impl Iterator<Item = &TaskItem> {
        self.items.iter().filter(|item| item.is_pending())
    }

    pub fn first_pending(&self) -> Option<&TaskItem> {
        self.pending().next()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

fn parse_item(line: usize, text: &str) -> Option<TaskItem> {
    let caps = ITEM_RE.captures(text)?;
    let description = caps.name("desc")?.as_str();
    if description.is_empty() {
        return None;
    }
    let status = if caps.name("status")?.as_str().trim().is_empty() {
        TaskStatus::Pending
    } else {
        TaskStatus::Complete
    };
    Some(TaskItem {
        line,
        description: description.to_string(),
        target_file: extract_file_token(description).map(str::to_string),
        status,
    })
}

/// Descriptions of every pending item, in document order.
pub fn parse_pending(document: &str) -> Vec<String> {
    Checklist::parse(document)
        .pending()
        .map(|item| item.description.clone())
        .collect()
}

/// Every item with its status, in document order.
pub fn parse_all(document: &str) -> Vec<(String, TaskStatus)> {
    Checklist::parse(document)
        .items()
        .iter()
        .map(|item| (item.description.clone(), item.status))
        .collect()
}

/// Flip the first pending item whose description is exactly `description`.
///
/// The item's marker is rewritten to `- [x] ` keeping its indentation; the
/// description, line ending and all other lines are untouched.
pub fn complete_first(document: &str, description: &str) -> Result<String, OrchestraError> {
    let mut out = String::with_capacity(document.len() + 1);
    let mut done = false;

    for (line, text) in document.split_inclusive('\n').enumerate() {
        if !done
            && let Some(item) = parse_item(line, text)
            && item.is_pending()
            && item.description == description
        {
            let caps = ITEM_RE
                .captures(text)
                .ok_or_else(|| OrchestraError::Consistency {
                    description: description.to_string(),
                })?;
            let indent = caps.name("indent").map_or("", |m| m.as_str());
            let desc_start = caps.name("desc").map_or(text.len(), |m| m.start());
            out.push_str(indent);
            out.push_str(TaskStatus::Complete.marker());
            out.push(' ');
            out.push_str(&text[desc_start..]);
            done = true;
            continue;
        }
        out.push_str(text);
    }

    if !done {
        return Err(OrchestraError::Consistency {
            description: description.to_string(),
        });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Tasks\n\nSome intro prose - [ ] not an item.\n\n- [ ] Create `greeter.py` that prints a greeting.\n- [x] Write `setup.cfg`\n  - [ ] Add tests in `tests/test_greeter.py`\n\nClosing notes.\n";

    #[test]
    fn parse_pending_returns_descriptions_in_order() {
        assert_eq!(
            parse_pending(DOC),
            vec![
                "Create `greeter.py` that prints a greeting.".to_string(),
                "Add tests in `tests/test_greeter.py`".to_string(),
            ]
        );
    }

    #[test]
    fn parse_pending_ignores_prose() {
        let with_prose = format!("Intro paragraph.\n{DOC}\n> quote - [ ] inline\n");
        assert_eq!(parse_pending(&with_prose), parse_pending(DOC));
    }

    #[test]
    fn parse_pending_empty_when_all_done() {
        assert!(parse_pending("- [x] a\n- [X] b\n").is_empty());
        assert!(parse_pending("just prose\n").is_empty());
    }

    #[test]
    fn parse_all_reports_statuses() {
        let all = parse_all(DOC);
        let statuses: Vec<TaskStatus> = all.iter().map(|(_, status)| *status).collect();
        assert_eq!(
            statuses,
            vec![
                TaskStatus::Pending,
                TaskStatus::Complete,
                TaskStatus::Pending
            ]
        );
    }

    #[test]
    fn lenient_markers_are_items() {
        let doc = "-[ ] tight\n-  [] empty box\n- [ ]   spaced\n- [ ]\n";
        assert_eq!(
            parse_pending(doc),
            vec!["tight".to_string(), "empty box".to_string(), "spaced".to_string()]
        );
    }

    #[test]
    fn items_carry_target_file() {
        let checklist = Checklist::parse(DOC);
        let targets: Vec<Option<&str>> = checklist
            .items()
            .iter()
            .map(|item| item.target_file.as_deref())
            .collect();
        assert_eq!(
            targets,
            vec![
                Some("greeter.py"),
                Some("setup.cfg"),
                Some("tests/test_greeter.py")
            ]
        );
    }

    #[test]
    fn complete_first_flips_only_that_item() {
        let description = "Create `greeter.py` that prints a greeting.";
        let before = Checklist::parse(DOC).len();
        let updated = complete_first(DOC, description).expect("complete");

        assert!(!parse_pending(&updated).contains(&description.to_string()));
        assert_eq!(Checklist::parse(&updated).len(), before);
        assert!(updated.contains("- [x] Create `greeter.py` that prints a greeting.\n"));
        assert!(updated.starts_with("# Tasks\n\nSome intro prose - [ ] not an item.\n"));
        assert!(updated.ends_with("\nClosing notes.\n"));
    }

    #[test]
    fn complete_first_touches_first_duplicate_only() {
        let doc = "- [ ] same\n- [ ] same\n";
        let updated = complete_first(doc, "same").expect("complete");
        assert_eq!(updated, "- [x] same\n- [ ] same\n");
    }

    #[test]
    fn complete_first_keeps_indent_and_crlf() {
        let doc = "  - [ ] nested\r\nnext\r\n";
        let updated = complete_first(doc, "nested").expect("complete");
        assert_eq!(updated, "  - [x] nested\r\nnext\r\n");
    }

    #[test]
    fn complete_first_reports_missing_line() {
        let err = complete_first("- [x] done\n", "done").unwrap_err();
        assert_eq!(
            err,
            OrchestraError::Consistency {
                description: "done".to_string()
            }
        );
    }
}
