//! Environment loading for ragbot.
//!
//! Values from the project `.env` and from `$XDG_CONFIG_HOME/<app>/config.toml`
//! (`[env]` table) are written into the process environment. Priority:
//! **existing env > .env > XDG**. `RagSettings::from_env` then reads the result.

mod dotenv;
mod xdg_toml;

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use dotenv::dotenv_file;
pub use xdg_toml::config_file;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(std::io::Error),
}

/// Where an applied value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Dotenv,
    Xdg,
}

/// What `load_and_apply` did. Key names only; values may be secrets.
#[derive(Debug, Default)]
pub struct AppliedConfig {
    pub dotenv_path: Option<PathBuf>,
    pub xdg_path: Option<PathBuf>,
    /// Set when the XDG config could not be used; `.env` is applied regardless.
    pub xdg_error: Option<LoadError>,
    /// Keys set by this call, sorted.
    pub applied: BTreeMap<String, Source>,
}

impl AppliedConfig {
    pub fn keys_from(&self, source: Source) -> Vec<&str> {
        self.applied
            .iter()
            .filter(|(_, s)| **s == source)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// Picks a value for every key not already present in the environment.
fn resolve(
    is_set: impl Fn(&str) -> bool,
    dotenv: HashMap<String, String>,
    xdg: HashMap<String, String>,
) -> BTreeMap<String, (String, Source)> {
    let mut out = BTreeMap::new();
    for (key, value) in xdg {
        if !is_set(&key) {
            out.insert(key, (value, Source::Xdg));
        }
    }
    for (key, value) in dotenv {
        if !is_set(&key) {
            out.insert(key, (value, Source::Dotenv));
        }
    }
    out
}

/// Loads `.env` (from `override_dir`, else the current directory) and the XDG
/// config of `app_name`, and sets every variable that is not already set.
///
/// A broken XDG file is reported in [`AppliedConfig::xdg_error`] and skipped.
/// Only an unreadable `.env` fails the call.
pub fn load_and_apply(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<AppliedConfig, LoadError> {
    apply_files(xdg_toml::config_file(app_name), override_dir)
}

fn apply_files(
    xdg_file: Result<PathBuf, LoadError>,
    override_dir: Option<&Path>,
) -> Result<AppliedConfig, LoadError> {
    let dotenv = dotenv::load_env_map(override_dir).map_err(LoadError::DotenvRead)?;
    let mut report = AppliedConfig {
        dotenv_path: dotenv_file(override_dir),
        ..AppliedConfig::default()
    };

    let xdg = match xdg_file.and_then(|path| {
        let map = xdg_toml::load_file(&path)?;
        Ok((path, map))
    }) {
        Ok((path, map)) => {
            report.xdg_path = path.is_file().then_some(path);
            map
        }
        Err(e) => {
            report.xdg_error = Some(e);
            HashMap::new()
        }
    };

    for (key, (value, source)) in resolve(|k| std::env::var_os(k).is_some(), dotenv, xdg) {
        std::env::set_var(&key, value);
        report.applied.insert(key, source);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn dotenv_beats_xdg() {
        let out = resolve(
            |_| false,
            map(&[("RAGBOT_MODEL", "from_dotenv")]),
            map(&[("RAGBOT_MODEL", "from_xdg"), ("RAGBOT_TOP_K", "5")]),
        );
        assert_eq!(
            out.get("RAGBOT_MODEL"),
            Some(&("from_dotenv".to_string(), Source::Dotenv))
        );
        assert_eq!(out.get("RAGBOT_TOP_K"), Some(&("5".to_string(), Source::Xdg)));
    }

    #[test]
    fn existing_env_is_untouched() {
        let out = resolve(
            |k| k == "OPENAI_API_KEY",
            map(&[("OPENAI_API_KEY", "sk-dotenv")]),
            map(&[("OPENAI_API_KEY", "sk-xdg")]),
        );
        assert!(out.is_empty());
    }

    /// **Scenario**: `.env` values reach the process environment unless already set.
    #[test]
    fn load_and_apply_sets_missing_vars() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "RAGBOT_CONFIG_TEST_NEW=dotenv\nRAGBOT_CONFIG_TEST_SET=dotenv\n",
        )
        .unwrap();
        std::env::set_var("RAGBOT_CONFIG_TEST_SET", "env");
        std::env::remove_var("RAGBOT_CONFIG_TEST_NEW");

        let report = load_and_apply("ragbot-config-test-no-such-app", Some(dir.path())).unwrap();

        assert_eq!(std::env::var("RAGBOT_CONFIG_TEST_NEW").as_deref(), Ok("dotenv"));
        assert_eq!(std::env::var("RAGBOT_CONFIG_TEST_SET").as_deref(), Ok("env"));
        assert_eq!(report.keys_from(Source::Dotenv), ["RAGBOT_CONFIG_TEST_NEW"]);
        assert_eq!(report.dotenv_path, Some(dir.path().join(".env")));
        assert!(report.xdg_path.is_none());
        std::env::remove_var("RAGBOT_CONFIG_TEST_NEW");
        std::env::remove_var("RAGBOT_CONFIG_TEST_SET");
    }

    /// **Scenario**: a malformed XDG config is reported but `.env` values still apply.
    #[test]
    fn broken_xdg_config_keeps_dotenv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "RAGBOT_CONFIG_TEST_BROKEN_XDG=sk-live\n").unwrap();
        let xdg = dir.path().join("config.toml");
        std::fs::write(&xdg, "[env\nBROKEN = ").unwrap();
        std::env::remove_var("RAGBOT_CONFIG_TEST_BROKEN_XDG");

        let report = apply_files(Ok(xdg), Some(dir.path())).unwrap();

        assert_eq!(
            std::env::var("RAGBOT_CONFIG_TEST_BROKEN_XDG").as_deref(),
            Ok("sk-live")
        );
        assert!(matches!(report.xdg_error, Some(LoadError::XdgParse(_))));
        assert!(report.xdg_path.is_none());
        assert_eq!(report.keys_from(Source::Dotenv), ["RAGBOT_CONFIG_TEST_BROKEN_XDG"]);
        std::env::remove_var("RAGBOT_CONFIG_TEST_BROKEN_XDG");
    }

    /// **Scenario**: XDG values fill keys `.env` does not set.
    #[test]
    fn xdg_file_values_apply() {
        let dir = tempfile::tempdir().unwrap();
        let xdg = dir.path().join("config.toml");
        std::fs::write(&xdg, "[env]\nRAGBOT_CONFIG_TEST_XDG_ONLY = 7\n").unwrap();
        std::env::remove_var("RAGBOT_CONFIG_TEST_XDG_ONLY");

        let report = apply_files(Ok(xdg.clone()), Some(dir.path())).unwrap();

        assert_eq!(std::env::var("RAGBOT_CONFIG_TEST_XDG_ONLY").as_deref(), Ok("7"));
        assert_eq!(report.xdg_path, Some(xdg));
        assert!(report.xdg_error.is_none());
        std::env::remove_var("RAGBOT_CONFIG_TEST_XDG_ONLY");
    }

    #[test]
    fn nothing_to_load_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let report = load_and_apply("ragbot-config-test-no-such-app", Some(dir.path())).unwrap();
        assert!(report.applied.is_empty());
        assert!(report.dotenv_path.is_none());
    }
}
