//! The RAG workflow graph.
//!
//! ```text
//! START --route_question--> { websearch: web_search, vectorstore: retrieve }
//! retrieve -> grade_documents --decide_to_generate--> { websearch: web_search, generate: generate }
//! web_search -> generate -> grade_generation
//! grade_generation --decide_after_grading--> { useful: END, not supported: generate, not useful: web_search }
//! ```
//!
//! Routers only read state; every decision worth showing the user is written
//! to the trace by the node before them.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::chains::{
    AnswerGrader, GenerationChain, GradeAnswer, GradeDocuments, GradeHallucination,
    HallucinationGrader, QuestionRouter, RetrievalGrader, RouteQuery,
};
use crate::error::AgentError;
use crate::graph::{
    generate_dot, generate_mermaid, generate_text, CompilationError, CompiledStateGraph,
    RetryPolicy, Router, RunnableConfig, StateGraph, DEFAULT_RECURSION_LIMIT, END,
};
use crate::llm::{ChatOpenAI, LlmClient, StructuredOutput};
use crate::nodes::{
    GenerateNode, GradeDocumentsNode, GradeGenerationNode, RetrieveNode, WebSearchNode, GENERATE,
    GRADE_DOCUMENTS, GRADE_GENERATION, RETRIEVE, WEB_SEARCH,
};
use crate::settings::{RagSettings, DEFAULT_MAX_GENERATIONS};
use crate::state::{rag_state_updater, GenerationGrade, GraphState};
use crate::stream::{StreamEvent, StreamMode};
use crate::vectorstore::{OpenAIEmbedder, Retriever, SqliteVecStore};
use crate::websearch::{OfflineWebSearch, TavilySearch, WebSearch};

pub const ROUTE_WEBSEARCH: &str = "websearch";
pub const ROUTE_VECTORSTORE: &str = "vectorstore";
pub const ROUTE_GENERATE: &str = "generate";

/// Answer returned by the CLI when no OpenAI key is configured.
pub const OFFLINE_ANSWER: &str = "[OFFLINE MODE] I received your question, but no OpenAI API key \
is configured. Set OPENAI_API_KEY in a .env file to get real answers.";

/// Trace of [`offline_result`].
pub const OFFLINE_TRACE: &str = "offline_mode_no_openai_key";

/// Canned final state for offline mode, without running the graph.
pub fn offline_result(question: impl Into<String>) -> GraphState {
    GraphState {
        generation: Some(OFFLINE_ANSWER.to_string()),
        trace: Some(vec![OFFLINE_TRACE.to_string()]),
        from_vector: Some(false),
        documents: Some(Vec::new()),
        ..GraphState::new(question)
    }
}

/// Chains and backends the workflow nodes are built from.
#[derive(Clone)]
pub struct RagComponents {
    pub question_router: Arc<QuestionRouter>,
    pub retrieval_grader: Arc<RetrievalGrader>,
    pub generation: Arc<GenerationChain>,
    pub hallucination_grader: Arc<HallucinationGrader>,
    pub answer_grader: Arc<AnswerGrader>,
    pub retriever: Option<Arc<Retriever>>,
    pub web_search: Arc<dyn WebSearch>,
    pub max_generations: u32,
}

impl RagComponents {
    /// Every chain on its offline stub, no retriever, simulated web search.
    pub fn offline() -> Self {
        Self {
            question_router: Arc::new(QuestionRouter::offline()),
            retrieval_grader: Arc::new(RetrievalGrader::offline()),
            generation: Arc::new(GenerationChain::offline()),
            hallucination_grader: Arc::new(HallucinationGrader::offline()),
            answer_grader: Arc::new(AnswerGrader::offline()),
            retriever: None,
            web_search: Arc::new(OfflineWebSearch),
            max_generations: DEFAULT_MAX_GENERATIONS,
        }
    }

    /// Every chain on the same client. Retriever and web search stay offline.
    pub fn with_llm(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            question_router: Arc::new(QuestionRouter::new(llm.clone())),
            retrieval_grader: Arc::new(RetrievalGrader::new(llm.clone())),
            generation: Arc::new(GenerationChain::new(llm.clone())),
            hallucination_grader: Arc::new(HallucinationGrader::new(llm.clone())),
            answer_grader: Arc::new(AnswerGrader::new(llm)),
            ..Self::offline()
        }
    }

    /// OpenAI chains when a key is set (temperature 0, one structured schema
    /// per grader), the persisted index as retriever, Tavily when its key is set.
    pub fn from_settings(settings: &RagSettings) -> Self {
        let mut components = Self::offline();
        components.max_generations = settings.max_generations;
        if settings.web_search_online() {
            if let Some(key) = &settings.tavily_api_key {
                components.web_search = Arc::new(TavilySearch::new(key.as_str()));
            }
        }

        let Some(config) = settings.openai_config() else {
            info!("OPENAI_API_KEY not set; running chains in offline mode");
            return components;
        };
        let chat = || {
            ChatOpenAI::with_config(config.clone(), &settings.model).with_temperature(0.0)
        };
        fn structured<T: StructuredOutput>(chat: ChatOpenAI) -> Arc<dyn LlmClient> {
            Arc::new(chat.with_structured_output::<T>())
        }
        components.question_router = Arc::new(QuestionRouter::new(structured::<RouteQuery>(chat())));
        components.retrieval_grader =
            Arc::new(RetrievalGrader::new(structured::<GradeDocuments>(chat())));
        components.generation = Arc::new(GenerationChain::new(Arc::new(chat())));
        components.hallucination_grader =
            Arc::new(HallucinationGrader::new(structured::<GradeHallucination>(chat())));
        components.answer_grader = Arc::new(AnswerGrader::new(structured::<GradeAnswer>(chat())));

        let embedder = Arc::new(OpenAIEmbedder::with_config(
            config.clone(),
            &settings.embedding_model,
        ));
        match SqliteVecStore::open(&settings.persist_dir, &settings.collection, embedder) {
            Ok(store) => {
                components.retriever =
                    Some(Arc::new(Retriever::new(Arc::new(store)).with_k(settings.top_k)));
            }
            Err(e) => warn!(error = %e, "could not open vector index; retriever disabled"),
        }
        components
    }
}

/// Entry router backed by the question-routing chain. Errors fall back to retrieval.
struct RouteQuestion {
    router: Arc<QuestionRouter>,
}

#[async_trait]
impl Router<GraphState> for RouteQuestion {
    async fn route(&self, state: &GraphState) -> Result<String, AgentError> {
        match self.router.route(&state.question).await {
            Ok(decision) => Ok(decision.datasource.as_str().to_string()),
            Err(e) => {
                warn!(error = %e, "question routing failed; defaulting to vector store");
                Ok(ROUTE_VECTORSTORE.to_string())
            }
        }
    }
}

/// `websearch` when grading flagged web search, else `generate`.
pub fn decide_to_generate(state: &GraphState) -> String {
    if state.web_search() {
        ROUTE_WEBSEARCH.to_string()
    } else {
        ROUTE_GENERATE.to_string()
    }
}

/// Routing key for the last answer check; a missing grade counts as useful.
pub fn decide_after_grading(state: &GraphState) -> String {
    state
        .grade
        .unwrap_or(GenerationGrade::Useful)
        .as_route()
        .to_string()
}

fn path_map<const N: usize>(pairs: [(&str, &str); N]) -> Option<HashMap<String, String>> {
    Some(
        pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// Uncompiled workflow graph; add middleware or a retry policy before compiling.
pub fn build_graph(components: &RagComponents) -> StateGraph<GraphState> {
    let mut graph = StateGraph::new().with_state_updater(rag_state_updater());
    graph
        .add_node(RETRIEVE, Arc::new(RetrieveNode::new(components.retriever.clone())))
        .add_node(
            GRADE_DOCUMENTS,
            Arc::new(GradeDocumentsNode::new(components.retrieval_grader.clone())),
        )
        .add_node(
            WEB_SEARCH,
            Arc::new(WebSearchNode::new(components.web_search.clone())),
        )
        .add_node(
            GENERATE,
            Arc::new(GenerateNode::new(components.generation.clone())),
        )
        .add_node(
            GRADE_GENERATION,
            Arc::new(
                GradeGenerationNode::new(
                    components.hallucination_grader.clone(),
                    components.answer_grader.clone(),
                )
                .with_max_generations(components.max_generations),
            ),
        );

    graph.set_conditional_entry_point(
        Arc::new(RouteQuestion {
            router: components.question_router.clone(),
        }),
        path_map([(ROUTE_WEBSEARCH, WEB_SEARCH), (ROUTE_VECTORSTORE, RETRIEVE)]),
    );
    graph.add_edge(RETRIEVE, GRADE_DOCUMENTS);
    graph.add_conditional_edges(
        GRADE_DOCUMENTS,
        Arc::new(decide_to_generate),
        path_map([(ROUTE_WEBSEARCH, WEB_SEARCH), (ROUTE_GENERATE, GENERATE)]),
    );
    graph.add_edge(WEB_SEARCH, GENERATE);
    graph.add_edge(GENERATE, GRADE_GENERATION);
    graph.add_conditional_edges(
        GRADE_GENERATION,
        Arc::new(decide_after_grading),
        path_map([
            (GenerationGrade::Useful.as_route(), END),
            (GenerationGrade::NotSupported.as_route(), GENERATE),
            (GenerationGrade::NotUseful.as_route(), WEB_SEARCH),
        ]),
    );
    graph
}

/// Compiled RAG workflow.
pub struct RagWorkflow {
    graph: CompiledStateGraph<GraphState>,
    recursion_limit: usize,
}

impl RagWorkflow {
    pub fn new(components: RagComponents) -> Result<Self, CompilationError> {
        Self::with_graph(&components, |g| g)
    }

    /// Lets the caller adjust the graph (middleware, retries) before compiling.
    pub fn with_graph(
        components: &RagComponents,
        customize: impl FnOnce(StateGraph<GraphState>) -> StateGraph<GraphState>,
    ) -> Result<Self, CompilationError> {
        let graph = customize(build_graph(components)).compile()?;
        // Worst case per answer: web_search, generate, grade_generation; plus the
        // retrieve/grade_documents prefix.
        let needed = 3 * components.max_generations as usize + 2;
        Ok(Self {
            graph,
            recursion_limit: DEFAULT_RECURSION_LIMIT.max(needed),
        })
    }

    /// Full graph with every step on its offline stub.
    pub fn offline() -> Result<Self, CompilationError> {
        Self::new(RagComponents::offline())
    }

    pub fn with_retry_policy(
        components: &RagComponents,
        policy: RetryPolicy,
    ) -> Result<Self, CompilationError> {
        Self::with_graph(components, |g| g.with_retry_policy(policy))
    }

    fn config(&self) -> RunnableConfig {
        RunnableConfig::default().with_recursion_limit(self.recursion_limit)
    }

    pub fn recursion_limit(&self) -> usize {
        self.recursion_limit
    }

    /// Runs the workflow for `question` and returns the final state.
    pub async fn ask(&self, question: &str) -> Result<GraphState, AgentError> {
        info!(question, "answering question");
        let state = self
            .graph
            .invoke(GraphState::new(question), Some(self.config()))
            .await?;
        info!(
            from_vector = state.from_vector(),
            documents = state.documents().len(),
            attempts = state.generation_attempts(),
            "workflow complete"
        );
        Ok(state)
    }

    /// Streams events for `question`.
    pub fn stream(
        &self,
        question: &str,
        modes: impl Into<HashSet<StreamMode>>,
    ) -> ReceiverStream<StreamEvent<GraphState>> {
        self.graph
            .stream(GraphState::new(question), Some(self.config()), modes)
    }

    pub fn graph(&self) -> &CompiledStateGraph<GraphState> {
        &self.graph
    }

    pub fn mermaid(&self) -> String {
        generate_mermaid(&self.graph)
    }

    pub fn dot(&self) -> String {
        generate_dot(&self.graph)
    }

    pub fn text(&self) -> String {
        generate_text(&self.graph)
    }
}
