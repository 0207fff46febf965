//! Terminal rendering of a finished run and of an index build.

use ragbot::{GraphState, IndexReport, IndexStatus};

const RULE: &str = "============================================================";
const THIN_RULE: &str = "------------------------------------------------------------";

/// Printed on stderr when no OpenAI key is configured.
pub const OFFLINE_NOTICE: &str = "OFFLINE MODE: OPENAI_API_KEY not set.\n    The CLI will return a dummy answer instead of calling the real model.";

/// Result view: question, source, document count, answer and process trace.
pub fn render_result(state: &GraphState) -> String {
    let mut out = Vec::new();
    out.push(RULE.to_string());
    out.push("RESULT".to_string());
    out.push(RULE.to_string());
    out.push(format!("Question: {}", state.question));
    out.push(
        if state.from_vector() {
            "Source: Provided documents (vector DB)"
        } else {
            "Source: Augmented with web search (or offline dummy mode)"
        }
        .to_string(),
    );
    out.push(format!("Documents used: {}", state.documents().len()));

    out.push(String::new());
    out.push(THIN_RULE.to_string());
    out.push("Answer:".to_string());
    out.push(THIN_RULE.to_string());
    out.push(
        state
            .generation
            .as_deref()
            .unwrap_or("No answer generated.")
            .to_string(),
    );

    if !state.trace().is_empty() {
        out.push(String::new());
        out.push(THIN_RULE.to_string());
        out.push("Process Trace:".to_string());
        out.push(THIN_RULE.to_string());
        out.extend(state.trace().iter().map(|line| format!("  • {}", line)));
    }

    out.push(String::new());
    out.push(RULE.to_string());
    out.join("\n")
}

pub fn render_index_report(report: &IndexReport) -> String {
    match report.status {
        IndexStatus::Indexed => format!(
            "Index built: {} local and {} web documents, {} chunks in collection '{}'.",
            report.local_documents, report.web_documents, report.chunks, report.collection
        ),
        IndexStatus::SkippedOffline => {
            "Indexing skipped: OPENAI_API_KEY is not set (offline mode).".to_string()
        }
        IndexStatus::NoDocuments => {
            "No documents found to index; provide --paths and/or --urls.".to_string()
        }
    }
}
