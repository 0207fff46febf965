//! `ragbot` binary.
//!
//! Subcommands: `ask` (answer a question, optionally indexing first), `ingest`
//! (build the index only) and `graph` (print the workflow graph).

mod log_format;
mod logging;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use cli::{AskOptions, GraphFormat, RagSettings};

#[derive(Parser, Debug)]
#[command(name = "ragbot")]
#[command(about = "ragbot: retrieval-augmented chatbot with grading and web search fallback")]
struct Args {
    #[command(subcommand)]
    cmd: Command,

    /// Debug logging for ragbot and node progress on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question (builds the index first when --paths or --urls are given)
    Ask(AskArgs),
    /// Build the vector index from files and web pages
    Ingest(IngestArgs),
    /// Print the workflow graph
    Graph(GraphArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
struct SourceArgs {
    /// File/dir globs to ingest (e.g. docs, "notes/*.md")
    #[arg(long, num_args = 0.., value_name = "GLOB")]
    paths: Vec<String>,

    /// URLs to ingest
    #[arg(long, num_args = 0.., value_name = "URL")]
    urls: Vec<String>,

    /// Rebuild the index from scratch
    #[arg(long)]
    rebuild: bool,
}

#[derive(clap::Args, Debug)]
struct AskArgs {
    /// Question to ask
    #[arg(short, long, value_name = "TEXT")]
    question: String,

    #[command(flatten)]
    sources: SourceArgs,

    /// Print the final state as JSON instead of the result view
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct IngestArgs {
    #[command(flatten)]
    sources: SourceArgs,
}

#[derive(clap::Args, Debug)]
struct GraphArgs {
    #[arg(long, value_enum, default_value = "mermaid")]
    format: GraphFormat,
}

async fn run(args: Args, settings: RagSettings) -> Result<(), cli::CliError> {
    match args.cmd {
        Command::Ask(ask) => {
            if !settings.is_online() {
                eprintln!("{}\n", cli::OFFLINE_NOTICE);
            }
            let opts = AskOptions {
                question: ask.question,
                paths: ask.sources.paths,
                urls: ask.sources.urls,
                rebuild: ask.sources.rebuild,
                progress: args.verbose,
            };
            let state = cli::ask(&settings, &opts).await?;
            if ask.json {
                println!("{}", cli::result_json(&state)?);
            } else {
                println!("{}", cli::render_result(&state));
            }
        }
        Command::Ingest(ingest) => {
            let SourceArgs {
                paths,
                urls,
                rebuild,
            } = ingest.sources;
            let report = cli::ingest(&settings, &paths, &urls, rebuild).await?;
            println!("{}", cli::render_index_report(&report));
        }
        Command::Graph(graph) => println!("{}", cli::render_graph(graph.format)?),
    }
    Ok(())
}

fn report_config(loaded: &Result<config::AppliedConfig, config::LoadError>) {
    match loaded {
        Ok(report) => {
            if let Some(e) = &report.xdg_error {
                warn!(error = %e, "ignoring XDG config");
            }
            debug!(
                dotenv = ?report.keys_from(config::Source::Dotenv),
                xdg = ?report.keys_from(config::Source::Xdg),
                "environment loaded"
            );
        }
        Err(e) => {
            warn!(error = %e, "environment files not loaded");
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Before logging: RAGBOT_LOG_DIR may come from these files.
    let loaded = config::load_and_apply("ragbot", None);
    let args = Args::parse();
    let _log_guard = logging::init(args.verbose)?;
    report_config(&loaded);

    let settings = match RagSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("ragbot: {}", e);
            std::process::exit(2);
        }
    };
    if let Err(e) = run(args, settings).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
