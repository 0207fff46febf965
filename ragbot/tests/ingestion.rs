//! Index building from local files and web pages.

mod common;

use std::sync::Arc;

use common::{serve, ByteEmbedder};
use ragbot::ingestion::LengthFunction;
use ragbot::vectorstore::{Embedder, VectorStore};
use ragbot::{IndexStatus, Ingestor, RecursiveCharacterTextSplitter};

fn char_splitter() -> RecursiveCharacterTextSplitter {
    RecursiveCharacterTextSplitter::new(40, 0, LengthFunction::Chars).unwrap()
}

fn ingestor(dir: &std::path::Path) -> Ingestor {
    let embedder: Arc<dyn Embedder> = Arc::new(ByteEmbedder::new(16));
    Ingestor::new(Some(embedder), dir.join("index"), "ragbot-chroma", char_splitter())
}

/// **Scenario**: Without an embedder nothing is loaded or written.
#[tokio::test]
async fn offline_ingestor_skips() {
    let dir = tempfile::tempdir().unwrap();
    let ingestor = Ingestor::new(None, dir.path().join("index"), "c", char_splitter());
    let report = ingestor
        .build_index(&["missing/*.md".to_string()], &[], true)
        .await
        .unwrap();
    assert_eq!(report.status, IndexStatus::SkippedOffline);
    assert_eq!(report.chunks, 0);
    assert!(!dir.path().join("index").exists());
    assert!(ingestor.open_store().unwrap().is_none());
}

/// **Scenario**: Patterns that match nothing leave the index untouched.
#[tokio::test]
async fn no_documents_found() {
    let dir = tempfile::tempdir().unwrap();
    let pattern = dir.path().join("*.txt").display().to_string();
    let report = ingestor(dir.path())
        .build_index(&[pattern], &[], false)
        .await
        .unwrap();
    assert_eq!(report.status, IndexStatus::NoDocuments);
    assert_eq!(report.collection, "ragbot-chroma");
}

/// **Scenario**: A directory of markdown and text files is split and indexed.
#[tokio::test]
async fn indexes_directory() {
    let dir = tempfile::tempdir().unwrap();
    let docs = dir.path().join("docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(
        docs.join("agents.md"),
        "# Agents\n\nAgents plan their work.\n\nThey also keep memory of past steps.",
    )
    .unwrap();
    std::fs::write(docs.join("notes.txt"), "Short note.").unwrap();
    std::fs::write(docs.join("image.png"), [0u8, 1, 2]).unwrap();

    let ingestor = ingestor(dir.path());
    let report = ingestor
        .build_index(&[docs.display().to_string()], &[], false)
        .await
        .unwrap();
    assert_eq!(report.status, IndexStatus::Indexed);
    assert_eq!(report.local_documents, 2);
    assert_eq!(report.web_documents, 0);
    assert!(report.chunks >= 3);

    let store = ingestor.open_store().unwrap().unwrap();
    assert_eq!(store.count().await.unwrap(), report.chunks);
    let hits = store.similarity_search("Short note.", 1).await.unwrap();
    assert_eq!(hits[0].document.page_content, "Short note.");
    assert!(hits[0].document.source().unwrap().ends_with("notes.txt"));
}

/// **Scenario**: Rebuild replaces the previous index; without rebuild chunks accumulate.
#[tokio::test]
async fn rebuild_replaces_index() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.txt");
    std::fs::write(&file, "alpha beta gamma").unwrap();
    let paths = vec![file.display().to_string()];
    let ingestor = ingestor(dir.path());

    ingestor.build_index(&paths, &[], false).await.unwrap();
    ingestor.build_index(&paths, &[], false).await.unwrap();
    let store = ingestor.open_store().unwrap().unwrap();
    assert_eq!(store.count().await.unwrap(), 2);
    drop(store);
    let stray = dir.path().join("index").join("stale.bin");
    std::fs::write(&stray, b"old").unwrap();

    ingestor.build_index(&paths, &[], true).await.unwrap();
    assert!(!stray.exists());
    let store = ingestor.open_store().unwrap().unwrap();
    assert_eq!(store.count().await.unwrap(), 1);
}

/// **Scenario**: A web page is fetched, reduced to body text and indexed with its title.
#[tokio::test]
async fn indexes_web_page() {
    let (addr, server) = serve(vec![(
        "200 OK",
        "text/html",
        "<html><head><title>Prompting</title></head><body><h1>Prompt</h1><p>Few-shot examples help.</p></body></html>"
            .to_string(),
    )])
    .await;
    let dir = tempfile::tempdir().unwrap();
    let ingestor = ingestor(dir.path());
    let url = format!("http://{}/post", addr);

    let report = ingestor
        .build_index(&[], &[url.clone()], false)
        .await
        .unwrap();
    assert_eq!(report.status, IndexStatus::Indexed);
    assert_eq!(report.web_documents, 1);

    let captured = server.await.unwrap();
    assert_eq!(captured[0].request_line(), "GET /post HTTP/1.1");

    let store = ingestor.open_store().unwrap().unwrap();
    let hits = store
        .similarity_search("Prompt Few-shot examples help.", 1)
        .await
        .unwrap();
    assert_eq!(hits[0].document.page_content, "Prompt Few-shot examples help.");
    assert_eq!(hits[0].document.source(), Some(url.as_str()));
    assert_eq!(hits[0].document.metadata["title"], "Prompting");
}
