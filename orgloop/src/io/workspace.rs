//! Project workspace: the directory generated files land in.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;
use walkdir::WalkDir;

/// Handle to the project directory. All paths are workspace-relative.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Create the workspace directory if missing.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("create workspace {}", self.root.display()))
    }

    /// True when the directory exists and has at least one entry.
    pub fn is_non_empty(&self) -> Result<bool> {
        match fs::read_dir(&self.root) {
            Ok(mut entries) => Ok(entries.next().is_some()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => {
                Err(err).with_context(|| format!("read workspace {}", self.root.display()))
            }
        }
    }

    /// Remove everything inside the workspace, keeping the directory itself.
    pub fn clean(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("read workspace {}", self.root.display()));
            }
        };
        for entry in entries {
            let entry = entry.context("read workspace entry")?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("stat {}", path.display()))?;
            if file_type.is_dir() {
                fs::remove_dir_all(&path)
                    .with_context(|| format!("remove directory {}", path.display()))?;
            } else {
                fs::remove_file(&path)
                    .with_context(|| format!("remove file {}", path.display()))?;
            }
        }
        debug!(root = %self.root.display(), "workspace cleaned");
        Ok(())
    }

    /// Read a workspace file; a missing file reads as the empty string.
    pub fn read_file(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(contents),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(err) => Err(err).with_context(|| format!("read {}", path.display())),
        }
    }

    /// Overwrite a workspace file, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        debug!(path = %path.display(), bytes = contents.len(), "wrote workspace file");
        Ok(())
    }

    /// Atomically overwrite a workspace file (temp file + rename).
    pub fn write_file_atomic(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);
        fs::write(&tmp_path, contents)
            .with_context(|| format!("write temp {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }

    /// Every file under the workspace as sorted, `/`-separated relative paths.
    pub fn list_files(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.root) {
            let entry = entry.with_context(|| format!("walk {}", self.root.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .with_context(|| format!("relativize {}", entry.path().display()))?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        assert_eq!(ws.read_file("nope.py").expect("read"), "");
    }

    #[test]
    fn write_creates_parents_and_overwrites() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path().join("Project"));
        ws.write_file("pkg/mod.py", "one").expect("write");
        ws.write_file("pkg/mod.py", "two").expect("write");
        assert_eq!(ws.read_file("pkg/mod.py").expect("read"), "two");
    }

    #[test]
    fn list_files_is_sorted_and_relative() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path());
        ws.write_file("z.py", "").expect("write");
        ws.write_file("a/b/c.txt", "").expect("write");
        ws.write_file_atomic("README.md", "- [ ] x").expect("write");
        assert_eq!(
            ws.list_files().expect("list"),
            vec![
                "README.md".to_string(),
                "a/b/c.txt".to_string(),
                "z.py".to_string()
            ]
        );
    }

    #[test]
    fn clean_empties_but_keeps_root() {
        let temp = tempfile::tempdir().expect("tempdir");
        let ws = Workspace::new(temp.path().join("Project"));
        assert!(!ws.is_non_empty().expect("check"));
        ws.write_file("a.py", "x").expect("write");
        ws.write_file("dir/b.py", "y").expect("write");
        assert!(ws.is_non_empty().expect("check"));

        ws.clean().expect("clean");
        assert!(ws.root().is_dir());
        assert!(!ws.is_non_empty().expect("check"));
    }
}
