//! `.env` reader. Values are returned as a map; applying them is up to the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// `.env` in `dir`, or in the current directory when `dir` is `None`.
pub fn dotenv_file(dir: Option<&Path>) -> Option<PathBuf> {
    let dir = match dir {
        Some(d) => d.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Text inside a leading double-quoted value, up to the closing quote.
/// Understands `\"` and `\n`. `None` when the quote is never closed.
fn double_quoted(body: &str) -> Option<String> {
    let mut out = String::new();
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(out),
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('"') => out.push('"'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            },
            c => out.push(c),
        }
    }
    None
}

/// Value text with quotes removed. Anything after a closing quote is ignored,
/// so `"v" # note` is `v`. Unquoted values end at ` #`.
fn unquote(raw: &str) -> String {
    if let Some(body) = raw.strip_prefix('"') {
        if let Some(value) = double_quoted(body) {
            return value;
        }
    } else if let Some(body) = raw.strip_prefix('\'') {
        if let Some(end) = body.find('\'') {
            return body[..end].to_string();
        }
    }
    match raw.find(" #") {
        Some(i) => raw[..i].trim_end().to_string(),
        None => raw.to_string(),
    }
}

/// One `KEY=VALUE` line, with an optional leading `export`.
fn parse_line(line: &str) -> Option<(String, String)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let line = line.strip_prefix("export ").unwrap_or(line);
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() || key.contains(char::is_whitespace) {
        return None;
    }
    Some((key.to_string(), unquote(value.trim())))
}

pub fn parse(content: &str) -> HashMap<String, String> {
    content.lines().filter_map(parse_line).collect()
}

/// Reads `.env` from `dir` (or the current directory). A missing file is an empty map.
pub fn load_env_map(dir: Option<&Path>) -> std::io::Result<HashMap<String, String>> {
    match dotenv_file(dir) {
        Some(path) => Ok(parse(&std::fs::read_to_string(path)?)),
        None => Ok(HashMap::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get<'a>(m: &'a HashMap<String, String>, k: &str) -> Option<&'a str> {
        m.get(k).map(String::as_str)
    }

    #[test]
    fn keys_and_comments() {
        let m = parse("# keys\nOPENAI_API_KEY=sk-test\n\n  TAVILY_API_KEY = tvly \n");
        assert_eq!(get(&m, "OPENAI_API_KEY"), Some("sk-test"));
        assert_eq!(get(&m, "TAVILY_API_KEY"), Some("tvly"));
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn export_prefix() {
        let m = parse("export RAGBOT_MODEL=gpt-4o-mini");
        assert_eq!(get(&m, "RAGBOT_MODEL"), Some("gpt-4o-mini"));
    }

    #[test]
    fn quoting_rules() {
        let m = parse(concat!(
            "A=\"two words\"\n",
            "B='kept # here'\n",
            "C=\"say \\\"hi\\\"\"\n",
            "D=\"line1\\nline2\"\n",
            "E=value # trailing comment\n",
            "F=a#b\n",
        ));
        assert_eq!(get(&m, "A"), Some("two words"));
        assert_eq!(get(&m, "B"), Some("kept # here"));
        assert_eq!(get(&m, "C"), Some("say \"hi\""));
        assert_eq!(get(&m, "D"), Some("line1\nline2"));
        assert_eq!(get(&m, "E"), Some("value"));
        assert_eq!(get(&m, "F"), Some("a#b"));
    }

    /// **Scenario**: a comment after a quoted value does not leave the quotes in the value.
    #[test]
    fn quoted_value_with_trailing_comment() {
        let m = parse(concat!(
            "OPENAI_API_KEY=\"sk-abc\" # prod key\n",
            "B='single' # note\n",
            "C=\"has # inside\"   # and after\n",
            "D=\"never closed\n",
        ));
        assert_eq!(get(&m, "OPENAI_API_KEY"), Some("sk-abc"));
        assert_eq!(get(&m, "B"), Some("single"));
        assert_eq!(get(&m, "C"), Some("has # inside"));
        assert_eq!(get(&m, "D"), Some("\"never closed"));
    }

    #[test]
    fn empty_values_are_kept() {
        let m = parse("A=\nB=\"\"\n");
        assert_eq!(get(&m, "A"), Some(""));
        assert_eq!(get(&m, "B"), Some(""));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let m = parse("NO_EQUALS\n=orphan\nTWO WORDS=x\nOK=1\n");
        assert_eq!(m.len(), 1);
        assert_eq!(get(&m, "OK"), Some("1"));
    }

    #[test]
    fn file_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
        std::fs::write(dir.path().join(".env"), "RAGBOT_TOP_K=6\n").unwrap();
        let m = load_env_map(Some(dir.path())).unwrap();
        assert_eq!(get(&m, "RAGBOT_TOP_K"), Some("6"));
    }
}
