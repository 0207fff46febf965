//! Workflow runs driven by a scripted mock model, one reply per chain call.

mod common;

use std::sync::Arc;

use common::ByteEmbedder;
use ragbot::llm::{MockLlm, MockReply};
use ragbot::vectorstore::{InMemoryVectorStore, Retriever, VectorStore};
use ragbot::{Document, GenerationGrade, RagComponents, RagWorkflow, RetryPolicy};

fn tool(name: &str, arguments: &str) -> MockReply {
    MockReply::ToolCall {
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn content(text: &str) -> MockReply {
    MockReply::Content(text.to_string())
}

async fn indexed_retriever(docs: &[&str]) -> Arc<Retriever> {
    let store = Arc::new(InMemoryVectorStore::new(Arc::new(ByteEmbedder::new(32))));
    let docs: Vec<Document> = docs
        .iter()
        .map(|d| Document::new(*d).with_source("notes.md"))
        .collect();
    store.add_documents(&docs).await.unwrap();
    Arc::new(Retriever::new(store))
}

/// **Scenario**: Vector route, both documents relevant, grounded and useful answer.
#[tokio::test]
async fn vector_store_happy_path() {
    let llm = Arc::new(MockLlm::scripted([
        tool("RouteQuery", r#"{"datasource":"vectorstore"}"#),
        tool("GradeDocuments", r#"{"binary_score":"yes"}"#),
        tool("GradeDocuments", r#"{"binary_score":"yes"}"#),
        content("Agent memory stores past interactions."),
        tool("GradeHallucination", r#"{"binary_score":"yes"}"#),
        tool("GradeAnswer", r#"{"binary_score":"yes"}"#),
    ]));
    let components = RagComponents {
        retriever: Some(indexed_retriever(&["short-term memory", "long-term memory"]).await),
        ..RagComponents::with_llm(llm.clone())
    };
    let workflow = RagWorkflow::new(components).unwrap();
    let state = workflow.ask("what is agent memory?").await.unwrap();

    assert_eq!(state.generation(), "Agent memory stores past interactions.");
    assert!(state.from_vector());
    assert!(!state.web_search());
    assert_eq!(state.documents().len(), 2);
    assert_eq!(
        state.trace(),
        [
            "Retrieving relevant documents from vector store",
            "Grader: relevant doc kept",
            "Grader: relevant doc kept",
            "Decision: docs sufficient → generate",
            "Generated answer",
            "Check: grounded in documents ✔",
            "Check: answer accepted ✔",
        ]
    );
    assert_eq!(llm.call_count(), 6);
}

/// **Scenario**: An irrelevant document is dropped and web search adds a result before generating.
#[tokio::test]
async fn irrelevant_document_triggers_web_search() {
    let llm = Arc::new(MockLlm::scripted([
        tool("RouteQuery", r#"{"datasource":"vectorstore"}"#),
        tool("GradeDocuments", r#"{"binary_score":"no"}"#),
        content("answer"),
        tool("GradeHallucination", r#"{"binary_score":true}"#),
        tool("GradeAnswer", r#"{"binary_score":true}"#),
    ]));
    let components = RagComponents {
        retriever: Some(indexed_retriever(&["bananas"]).await),
        ..RagComponents::with_llm(llm)
    };
    let state = RagWorkflow::new(components)
        .unwrap()
        .ask("who won?")
        .await
        .unwrap();

    assert!(!state.from_vector());
    assert!(state.web_search());
    assert_eq!(state.documents().len(), 1);
    assert!(state.trace().contains(&"Decision: not all docs relevant → web search".to_string()));
    assert!(state.trace().contains(&"Web search simulated (offline)".to_string()));
}

/// **Scenario**: Every answer is ungrounded; the loop stops after the generation budget.
#[tokio::test]
async fn regeneration_is_bounded() {
    let llm = Arc::new(MockLlm::scripted([
        tool("RouteQuery", r#"{"datasource":"websearch"}"#),
        content("guess 1"),
        tool("GradeHallucination", r#"{"binary_score":"no"}"#),
        content("guess 2"),
        tool("GradeHallucination", r#"{"binary_score":"no"}"#),
        content("guess 3"),
        tool("GradeHallucination", r#"{"binary_score":"no"}"#),
    ]));
    let state = RagWorkflow::new(RagComponents::with_llm(llm.clone()))
        .unwrap()
        .ask("q")
        .await
        .unwrap();

    assert_eq!(state.generation(), "guess 3");
    assert_eq!(state.generation_attempts(), 3);
    assert_eq!(state.grade, Some(GenerationGrade::Useful));
    let regenerations = state
        .trace()
        .iter()
        .filter(|t| *t == "Check: not grounded → regenerate")
        .count();
    assert_eq!(regenerations, 3);
    assert_eq!(
        state.trace().last().map(String::as_str),
        Some("Check: retry budget exhausted → answer accepted")
    );
    assert_eq!(llm.call_count(), 7);
}

/// **Scenario**: An off-topic answer sends the run back through web search once more.
#[tokio::test]
async fn off_topic_answer_searches_again() {
    let llm = Arc::new(MockLlm::scripted([
        tool("RouteQuery", r#"{"datasource":"websearch"}"#),
        content("off topic"),
        tool("GradeHallucination", r#"{"binary_score":"yes"}"#),
        tool("GradeAnswer", r#"{"binary_score":"no"}"#),
        content("on topic"),
        tool("GradeHallucination", r#"{"binary_score":"yes"}"#),
        tool("GradeAnswer", r#"{"binary_score":"yes"}"#),
    ]));
    let state = RagWorkflow::new(RagComponents::with_llm(llm))
        .unwrap()
        .ask("q")
        .await
        .unwrap();

    assert_eq!(state.generation(), "on topic");
    assert_eq!(state.generation_attempts(), 2);
    assert_eq!(state.documents().len(), 2);
}

/// **Scenario**: A router failure defaults to the vector store branch.
#[tokio::test]
async fn router_error_defaults_to_retrieve() {
    let llm = Arc::new(MockLlm::scripted([
        MockReply::Error("router down".into()),
        content("answer"),
        tool("GradeHallucination", r#"{"binary_score":"yes"}"#),
        tool("GradeAnswer", r#"{"binary_score":"yes"}"#),
    ]));
    let state = RagWorkflow::with_retry_policy(&RagComponents::with_llm(llm), RetryPolicy::None)
        .unwrap()
        .ask("q")
        .await
        .unwrap();
    assert_eq!(
        state.trace().first().map(String::as_str),
        Some("Retriever not initialized. No documents found (offline / no index).")
    );
    assert_eq!(state.generation(), "answer");
}
