//! `GraphState`: the record threaded through every RAG step.
//!
//! Nodes return partial updates built from [`GraphState::update`]. Every field set
//! in an update replaces the current value; unset fields are left alone (see
//! [`GraphState::merge`] and [`rag_state_updater`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::channels::{BoxedStateUpdater, FieldBasedUpdater};
use crate::document::Document;

/// Outcome of the last answer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationGrade {
    /// Grounded and addresses the question.
    Useful,
    /// Grounded but does not address the question.
    NotUseful,
    /// Not grounded in the documents.
    NotSupported,
}

impl GenerationGrade {
    /// Routing key used by the post-grading conditional edge.
    pub fn as_route(&self) -> &'static str {
        match self {
            GenerationGrade::Useful => "useful",
            GenerationGrade::NotUseful => "not useful",
            GenerationGrade::NotSupported => "not supported",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphState {
    /// The user's question. An empty question in an update means "unchanged".
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_search: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_vector: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_attempts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<GenerationGrade>,
}

impl GraphState {
    /// Initial state for a run.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            ..Self::default()
        }
    }

    /// Empty partial update; set only the fields the step changes.
    pub fn update() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> &str {
        self.generation.as_deref().unwrap_or_default()
    }

    pub fn web_search(&self) -> bool {
        self.web_search.unwrap_or(false)
    }

    pub fn documents(&self) -> &[Document] {
        self.documents.as_deref().unwrap_or_default()
    }

    pub fn trace(&self) -> &[String] {
        self.trace.as_deref().unwrap_or_default()
    }

    pub fn from_vector(&self) -> bool {
        self.from_vector.unwrap_or(false)
    }

    pub fn generation_attempts(&self) -> u32 {
        self.generation_attempts.unwrap_or(0)
    }

    /// Current trace with `entries` appended, for returning in an update.
    pub fn trace_with<I, T>(&self, entries: I) -> Vec<String>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut trace = self.trace().to_vec();
        trace.extend(entries.into_iter().map(Into::into));
        trace
    }

    /// Applies a partial update: present fields replace, absent fields are kept.
    pub fn merge(&mut self, update: &GraphState) {
        if !update.question.is_empty() {
            self.question = update.question.clone();
        }
        fn replace<T: Clone>(current: &mut Option<T>, update: &Option<T>) {
            if update.is_some() {
                current.clone_from(update);
            }
        }
        replace(&mut self.generation, &update.generation);
        replace(&mut self.web_search, &update.web_search);
        replace(&mut self.documents, &update.documents);
        replace(&mut self.trace, &update.trace);
        replace(&mut self.from_vector, &update.from_vector);
        replace(&mut self.generation_attempts, &update.generation_attempts);
        replace(&mut self.grade, &update.grade);
    }
}

/// Field-based updater applying [`GraphState::merge`].
pub fn rag_state_updater() -> BoxedStateUpdater<GraphState> {
    Arc::new(FieldBasedUpdater::new(
        |current: &mut GraphState, update: &GraphState| current.merge(update),
    ))
}
