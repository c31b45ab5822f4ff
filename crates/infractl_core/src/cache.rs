//! Compiled-configuration cache files.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use infractl_config::EnvConfig;

use crate::error::{CoreError, CoreResult};
use crate::paths::force_extension;

/// Name used for the cache file when no target environment is named.
pub const DEFAULT_TARGET_NAME: &str = "target";

/// `<env>-<yyyymmddHHMMSS>-<8 hex>.json`, timestamp in UTC.
pub fn generate_filename(env: &str) -> String {
    let env = Path::new(env)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_TARGET_NAME);
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}.json",
        env,
        Utc::now().format("%Y%m%d%H%M%S"),
        &suffix[..8]
    )
}

/// Pick the cache filename: the override (forced to `.json`) or a generated one.
pub fn cache_filename(env: &str, override_name: Option<&str>) -> String {
    match override_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => force_extension(name, "json").to_string_lossy().into_owned(),
        None => generate_filename(env),
    }
}

pub fn ensure_cache_dir(dir: &Path) -> CoreResult<()> {
    if !dir.is_dir() {
        fs::create_dir_all(dir)?;
        debug!("Created cache directory {}", dir.display());
    }
    Ok(())
}

/// Write `content` to `dir/filename`, replacing any existing file.
/// Returns the absolute path written.
pub fn write_file(dir: &Path, filename: &str, content: &str) -> CoreResult<PathBuf> {
    ensure_cache_dir(dir)?;
    let path = dir.join(filename);
    if path.exists() {
        debug!("Overwriting cached file {}", path.display());
    }
    fs::write(&path, content)?;

    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };
    info!("Compiled configuration written to {}", path.display());
    Ok(path)
}

/// Parse a cached JSON file back into a configuration.
pub fn read_compiled(path: &Path) -> CoreResult<EnvConfig> {
    if !path.is_file() {
        return Err(CoreError::not_found("Compiled configuration", path));
    }
    let content = fs::read_to_string(path)?;
    Ok(EnvConfig::from_json(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// `<env>-<14 digits>-<8 hex>.json`
    fn matches_cache_name(name: &str, env: &str) -> bool {
        let Some(rest) = name.strip_prefix(&format!("{env}-")) else {
            return false;
        };
        let Some(rest) = rest.strip_suffix(".json") else {
            return false;
        };
        let Some((stamp, hex)) = rest.split_once('-') else {
            return false;
        };
        stamp.len() == 14
            && stamp.chars().all(|c| c.is_ascii_digit())
            && hex.len() == 8
            && hex.chars().all(|c| c.is_ascii_hexdigit())
    }

    #[test]
    fn test_generated_name_shape() {
        let name = generate_filename("staging");
        assert!(matches_cache_name(&name, "staging"), "unexpected name {name}");
        assert!(matches_cache_name(&generate_filename(""), "target"));
    }

    #[test]
    fn test_override_forced_to_json() {
        assert_eq!(cache_filename("dev", Some("compiled")), "compiled.json");
        assert_eq!(cache_filename("dev", Some("compiled.JSON")), "compiled.JSON");
        assert_eq!(cache_filename("dev", Some("compiled.yaml")), "compiled.json");
        assert!(cache_filename("dev", Some("  ")).starts_with("dev-"));
    }

    #[test]
    fn test_write_overwrites_and_reads_back() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("cache");

        let mut config = EnvConfig::default();
        config.config.version = "1".into();
        let first = write_file(&dir, "x.json", &config.to_json_pretty().unwrap()).unwrap();

        config.config.version = "2".into();
        let second = write_file(&dir, "x.json", &config.to_json_pretty().unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(read_compiled(&second).unwrap().config.version, "2");
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = tempdir().unwrap();
        let err = read_compiled(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
