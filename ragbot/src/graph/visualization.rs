//! Graph visualization: Mermaid flowchart, Graphviz DOT and a plain text summary.
//!
//! All three include conditional edges; routers without a path map are drawn as
//! a dashed edge to a `?` placeholder since their targets are only known at runtime.

use std::fmt::Debug;
use std::fmt::Write;

use super::{CompiledStateGraph, NextEntry, END, START};

/// One drawable edge: (from, to, label for conditional branches).
type Edge = (String, String, Option<String>);

const DYNAMIC_TARGET: &str = "?";

fn edges<S>(graph: &CompiledStateGraph<S>) -> Vec<Edge>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut out = Vec::new();
    push_entry_edges(&mut out, START, &graph.entry);
    for id in graph.node_ids() {
        if let Some(entry) = graph.next_map.get(&id) {
            push_entry_edges(&mut out, &id, entry);
        }
    }
    out
}

fn push_entry_edges<S>(out: &mut Vec<Edge>, from: &str, entry: &NextEntry<S>)
where
    S: Clone + Send + Sync + Debug + 'static,
{
    match entry {
        NextEntry::Unconditional(to) => out.push((from.to_string(), to.clone(), None)),
        NextEntry::Conditional(router) => {
            let branches = router.branches();
            if branches.is_empty() {
                out.push((from.to_string(), DYNAMIC_TARGET.to_string(), Some(String::new())));
            }
            for (key, to) in branches {
                out.push((from.to_string(), to, Some(key)));
            }
        }
    }
}

fn mermaid_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Mermaid `flowchart TD` text, deterministic (nodes and branches sorted).
pub fn generate_mermaid<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let edges = edges(graph);
    let mut out = String::from("flowchart TD\n");
    let _ = writeln!(out, "    {}([\"START\"])", START);
    for id in graph.node_ids() {
        let _ = writeln!(out, "    {}[\"{}\"]", mermaid_id(&id), id);
    }
    let _ = writeln!(out, "    {}([\"END\"])", END);
    if edges.iter().any(|(_, to, _)| to == DYNAMIC_TARGET) {
        let _ = writeln!(out, "    dynamic{{\"?\"}}");
    }
    for (from, to, label) in &edges {
        let to = if to == DYNAMIC_TARGET {
            "dynamic".to_string()
        } else {
            mermaid_id(to)
        };
        match label {
            None => {
                let _ = writeln!(out, "    {} --> {}", mermaid_id(from), to);
            }
            Some(l) if l.is_empty() => {
                let _ = writeln!(out, "    {} -.-> {}", mermaid_id(from), to);
            }
            Some(l) => {
                let _ = writeln!(out, "    {} -. \"{}\" .-> {}", mermaid_id(from), l, to);
            }
        }
    }
    out
}

/// Graphviz DOT text.
pub fn generate_dot<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut dot = String::from("digraph {\n  rankdir=TB;\n  node [shape=box];\n\n");
    let _ = writeln!(
        dot,
        "  \"{}\" [label=\"START\", style=bold, fillcolor=lightgreen];",
        START
    );
    let _ = writeln!(
        dot,
        "  \"{}\" [label=\"END\", style=bold, fillcolor=lightcoral];",
        END
    );
    for id in graph.node_ids() {
        let _ = writeln!(dot, "  \"{}\";", id);
    }
    dot.push('\n');
    for (from, to, label) in edges(graph) {
        match label {
            None => {
                let _ = writeln!(dot, "  \"{}\" -> \"{}\";", from, to);
            }
            Some(l) => {
                let _ = writeln!(
                    dot,
                    "  \"{}\" -> \"{}\" [style=dashed, label=\"{}\"];",
                    from, to, l
                );
            }
        }
    }
    dot.push_str("}\n");
    dot
}

/// Plain text summary: node count, then one line per edge.
pub fn generate_text<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + Debug + 'static,
{
    let mut text = String::from("Graph Structure:\n");
    let _ = writeln!(text, "Nodes: {}", graph.node_ids().len());
    let _ = writeln!(text, "\nEdges:");
    for (from, to, label) in edges(graph) {
        match label {
            None => {
                let _ = writeln!(text, "  {} -> {}", from, to);
            }
            Some(l) => {
                let _ = writeln!(text, "  {} -[{}]-> {}", from, l, to);
            }
        }
    }
    text
}
