//! RAG workflow nodes. Each reads `GraphState` and returns a partial update.
//!
//! Chain failures never fail a node: they become trace entries and fallback
//! values, so only engine errors stop a run.

mod generate;
mod grade_documents;
mod grade_generation;
mod retrieve;
mod web_search;

pub use generate::GenerateNode;
pub use grade_documents::GradeDocumentsNode;
pub use grade_generation::GradeGenerationNode;
pub use retrieve::RetrieveNode;
pub use web_search::WebSearchNode;

pub const RETRIEVE: &str = "retrieve";
pub const GRADE_DOCUMENTS: &str = "grade_documents";
pub const WEB_SEARCH: &str = "web_search";
pub const GENERATE: &str = "generate";
pub const GRADE_GENERATION: &str = "grade_generation";
