//! Document loaders: local files (by glob) and web pages.
//!
//! Directories are walked recursively for `*.pdf`, `*.md` and `*.txt`; single
//! files are loaded by extension and anything else is skipped. PDFs go through
//! `pdf-extract`, web pages through `reqwest` + `scraper`.

use std::path::{Path, PathBuf};

use scraper::{Html, Selector};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::document::Document;

use super::IngestError;

/// Extensions picked up when a glob matches a directory, in load order.
pub const DIRECTORY_EXTENSIONS: [&str; 3] = ["pdf", "md", "txt"];

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Loads every file matched by `patterns` (`**` is supported).
pub fn load_paths<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Document>, IngestError> {
    let mut documents = Vec::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let matches =
            glob::glob(pattern).map_err(|e| IngestError::Pattern(format!("{}: {}", pattern, e)))?;
        let mut matched = 0usize;
        for entry in matches {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "unreadable glob match skipped");
                    continue;
                }
            };
            matched += 1;
            if path.is_dir() {
                for file in directory_files(&path) {
                    documents.extend(load_file(&file)?);
                }
            } else if path.is_file() {
                documents.extend(load_file(&path)?);
            }
        }
        if matched == 0 {
            warn!(pattern, "path pattern matched nothing");
        }
    }
    Ok(documents)
}

/// Files under `dir` with a supported extension: all PDFs first, then
/// markdown, then text, each group in path order.
fn directory_files(dir: &Path) -> Vec<PathBuf> {
    let mut groups: [Vec<PathBuf>; 3] = Default::default();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "directory entry skipped");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(ext) = extension_of(entry.path()) else {
            continue;
        };
        if let Some(i) = DIRECTORY_EXTENSIONS.iter().position(|e| *e == ext) {
            groups[i].push(entry.into_path());
        }
    }
    groups.into_iter().flatten().collect()
}

/// Loads one file by extension; unsupported extensions yield nothing.
pub fn load_file(path: &Path) -> Result<Vec<Document>, IngestError> {
    let source = path.display().to_string();
    let content = match extension_of(path).as_deref() {
        Some("pdf") => pdf_extract::extract_text(path).map_err(|e| IngestError::Pdf {
            path: source.clone(),
            message: e.to_string(),
        })?,
        Some("md") | Some("txt") => {
            std::fs::read_to_string(path).map_err(|e| IngestError::Io {
                path: source.clone(),
                source: e,
            })?
        }
        _ => {
            debug!(path = %source, "unsupported file type skipped");
            return Ok(Vec::new());
        }
    };
    debug!(path = %source, chars = content.len(), "loaded file");
    Ok(vec![Document::new(content).with_source(source)])
}

/// Text of the `<body>` (whitespace-normalised) and the `<title>`, if any.
pub fn html_to_text(html: &str) -> (String, Option<String>) {
    let document = Html::parse_document(html);
    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });
    let mut content = String::new();
    if let Ok(body) = Selector::parse("body") {
        if let Some(body) = document.select(&body).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }
    }
    (content, title)
}

async fn load_url(client: &reqwest::Client, url: &str) -> Result<Document, IngestError> {
    let fetch = |e: reqwest::Error| IngestError::Fetch {
        url: url.to_string(),
        message: e.to_string(),
    };
    let response = client
        .get(url)
        .send()
        .await
        .map_err(fetch)?
        .error_for_status()
        .map_err(fetch)?;
    let html = response.text().await.map_err(fetch)?;
    let (content, title) = html_to_text(&html);
    let mut doc = Document::new(content).with_source(url);
    if let Some(title) = title {
        doc = doc.with_metadata("title", title);
    }
    Ok(doc)
}

/// Fetches each URL; failures are logged and skipped.
pub async fn load_urls<S: AsRef<str>>(client: &reqwest::Client, urls: &[S]) -> Vec<Document> {
    let mut documents = Vec::new();
    for url in urls {
        let url = url.as_ref();
        debug!(url, "loading URL");
        match load_url(client, url).await {
            Ok(doc) => documents.push(doc),
            Err(e) => warn!(url, error = %e, "failed to load URL, skipping"),
        }
    }
    documents
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_body_text_and_title() {
        let html = "<html><head><title> Agents </title></head>\
                    <body><h1>Memory</h1>\n<p>Short-term   and <b>long-term</b>.</p></body></html>";
        let (text, title) = html_to_text(html);
        assert_eq!(title.as_deref(), Some("Agents"));
        assert_eq!(text, "Memory Short-term   and long-term .");
    }

    /// **Scenario**: A directory glob loads pdf/md/txt recursively and ignores other extensions.
    #[test]
    fn directory_loads_supported_files_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        std::fs::write(dir.path().join("nested/b.md"), "# beta").unwrap();
        std::fs::write(dir.path().join("c.json"), "{}").unwrap();

        let docs = load_paths(&[dir.path().display().to_string()]).unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.page_content.as_str()).collect();
        assert_eq!(contents, vec!["# beta", "alpha"]);
        assert!(docs[1].source().unwrap().ends_with("a.txt"));
    }

    #[test]
    fn file_glob_and_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "x").unwrap();
        std::fs::write(dir.path().join("y.csv"), "y").unwrap();
        let pattern = format!("{}/*", dir.path().display());
        let docs = load_paths(&[pattern]).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].page_content, "x");
    }

    #[test]
    fn missing_path_yields_nothing_and_bad_pattern_errors() {
        assert!(load_paths(&["/definitely/not/here/*.md"]).unwrap().is_empty());
        assert!(matches!(load_paths(&["a/***"]), Err(IngestError::Pattern(_))));
    }

    #[tokio::test]
    async fn unreachable_url_is_skipped() {
        let client = reqwest::Client::new();
        let docs = load_urls(&client, &["http://127.0.0.1:9/nothing"]).await;
        assert!(docs.is_empty());
    }
}
