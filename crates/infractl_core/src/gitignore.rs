//! Idempotent `.gitignore` maintenance.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::{debug, info};

use crate::error::CoreResult;

pub const GITIGNORE_FILE: &str = ".gitignore";

/// Entries that keep the cache and local builds out of version control.
pub const DEFAULT_ENTRIES: &[&str] = &[
    ".infractl-cache/",
    ".infractl-cache/*",
    "infra/.infractl-cache/",
    "infra/.infractl-cache/*",
    "tools/infractl/target/infractl",
    "tools/infractl/infractl",
];

fn read_existing(root: &Path) -> CoreResult<String> {
    match fs::read_to_string(root.join(GITIGNORE_FILE)) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn active_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// True when any of `entries` is already present.
pub fn contains_any(root: &Path, entries: &[&str]) -> CoreResult<bool> {
    let content = read_existing(root)?;
    let found = active_lines(&content).any(|line| entries.contains(&line));
    Ok(found)
}

/// Append whichever `entries` are missing. Returns the ones added.
pub fn ensure_entries(root: &Path, entries: &[&str]) -> CoreResult<Vec<String>> {
    let content = read_existing(root)?;
    let present: Vec<&str> = active_lines(&content).collect();

    let mut missing: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.trim();
        if !present.contains(&entry) && !missing.iter().any(|m| m == entry) {
            missing.push(entry.to_string());
        }
    }

    if missing.is_empty() {
        debug!("{} already up to date", GITIGNORE_FILE);
        return Ok(missing);
    }

    let mut block = String::new();
    if !content.is_empty() && !content.ends_with('\n') {
        block.push('\n');
    }
    for entry in &missing {
        block.push_str(entry);
        block.push('\n');
    }

    let path = root.join(GITIGNORE_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    file.write_all(block.as_bytes())?;

    info!("Added {} entries to {}", missing.len(), path.display());
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_file_and_is_idempotent() {
        let temp = tempdir().unwrap();

        let added = ensure_entries(temp.path(), DEFAULT_ENTRIES).unwrap();
        assert_eq!(added.len(), DEFAULT_ENTRIES.len());

        let again = ensure_entries(temp.path(), DEFAULT_ENTRIES).unwrap();
        assert!(again.is_empty());

        let content = fs::read_to_string(temp.path().join(GITIGNORE_FILE)).unwrap();
        assert_eq!(content.lines().count(), DEFAULT_ENTRIES.len());
    }

    #[test]
    fn test_appends_after_unterminated_line_and_ignores_comments() {
        let temp = tempdir().unwrap();
        let path = temp.path().join(GITIGNORE_FILE);
        fs::write(&path, "# .infractl-cache/\ntarget/").unwrap();

        assert!(!contains_any(temp.path(), &[".infractl-cache/"]).unwrap());
        let added = ensure_entries(temp.path(), &[".infractl-cache/", "target/"]).unwrap();
        assert_eq!(added, vec![".infractl-cache/"]);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "# .infractl-cache/\ntarget/\n.infractl-cache/\n");
        assert!(contains_any(temp.path(), &[".infractl-cache/"]).unwrap());
    }
}
