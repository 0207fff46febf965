//! `[env]` table of `$XDG_CONFIG_HOME/<app>/config.toml`.
//!
//! ```toml
//! [env]
//! OPENAI_API_KEY = "sk-..."
//! RAGBOT_CHROMA_DIR = "/var/lib/ragbot"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// Path of the app's config file, whether or not it exists.
pub fn config_file(app_name: &str) -> Result<PathBuf, LoadError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| LoadError::XdgPath(e.to_string()))?;
    Ok(base.config_home().join(app_name).join("config.toml"))
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    env: HashMap<String, toml::Value>,
}

/// Strings are taken as is; numbers and booleans are written the way TOML prints them.
fn env_value(value: toml::Value) -> Option<String> {
    match value {
        toml::Value::String(s) => Some(s),
        toml::Value::Integer(i) => Some(i.to_string()),
        toml::Value::Float(f) => Some(f.to_string()),
        toml::Value::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Reads the `[env]` table of `path`. A missing file is an empty map.
pub fn load_file(path: &Path) -> Result<HashMap<String, String>, LoadError> {
    if !path.is_file() {
        return Ok(HashMap::new());
    }
    let content = std::fs::read_to_string(path).map_err(LoadError::XdgRead)?;
    let file: ConfigFile = toml::from_str(&content)?;
    Ok(file
        .env
        .into_iter()
        .filter_map(|(k, v)| env_value(v).map(|v| (k, v)))
        .collect())
}

pub fn load_env_map(app_name: &str) -> Result<HashMap<String, String>, LoadError> {
    load_file(&config_file(app_name)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.toml");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("config.toml")).unwrap().is_empty());
    }

    #[test]
    fn reads_env_table_with_scalars() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            r#"
[env]
RAGBOT_MODEL = "gpt-4o"
RAGBOT_TOP_K = 6
RAGBOT_FLAG = true
IGNORED = ["a", "b"]

[other]
RAGBOT_COLLECTION = "not-env"
"#,
        );
        let map = load_file(&path).unwrap();
        assert_eq!(map.get("RAGBOT_MODEL").map(String::as_str), Some("gpt-4o"));
        assert_eq!(map.get("RAGBOT_TOP_K").map(String::as_str), Some("6"));
        assert_eq!(map.get("RAGBOT_FLAG").map(String::as_str), Some("true"));
        assert!(!map.contains_key("IGNORED"));
        assert!(!map.contains_key("RAGBOT_COLLECTION"));
    }

    #[test]
    fn no_env_table_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "[other]\nkey = \"x\"\n");
        assert!(load_file(&path).unwrap().is_empty());
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "not valid toml [[[\n");
        assert!(matches!(load_file(&path), Err(LoadError::XdgParse(_))));
    }

    #[test]
    fn config_file_is_under_app_dir() {
        let path = config_file("ragbot").unwrap();
        assert!(path.ends_with("ragbot/config.toml"));
    }
}
