//! Dotenv file loading.
//!
//! Values are collected into a map and never written into the process
//! environment. When the same key appears in several files, the first file
//! read wins: repository root before the current directory, `.env` before
//! `.env.local`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};

pub const DOTENV_FILES: &[&str] = &[".env", ".env.local"];

/// Candidate files in lookup order, without duplicates.
pub fn candidate_files(root: &Path, cwd: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for dir in [root, cwd] {
        for name in DOTENV_FILES {
            let path = dir.join(name);
            if !files.contains(&path) {
                files.push(path);
            }
        }
    }
    files
}

/// Load every dotenv file that exists. Missing files are skipped.
pub fn load(root: &Path, cwd: &Path) -> CoreResult<BTreeMap<String, String>> {
    let mut vars = BTreeMap::new();
    let mut loaded = 0usize;

    for path in candidate_files(root, cwd) {
        if !path.is_file() {
            debug!("No dotenv file at {}", path.display());
            continue;
        }

        let dotenv_error = |e: dotenvy::Error| CoreError::Dotenv {
            path: path.clone(),
            reason: e.to_string(),
        };

        for item in dotenvy::from_path_iter(&path).map_err(dotenv_error)? {
            let (key, value) = item.map_err(dotenv_error)?;
            vars.entry(key).or_insert(value);
        }
        loaded += 1;
        debug!("Loaded dotenv file {}", path.display());
    }

    if loaded > 0 {
        info!("Loaded {} variable(s) from {} dotenv file(s)", vars.len(), loaded);
    }
    Ok(vars)
}
