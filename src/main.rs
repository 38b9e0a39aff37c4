//! docscout binary entry point

use anyhow::Result;
use clap::Parser;
use docscout::agent::{AgentConfig, SearchAgent};
use docscout::cli::{Args, Commands};
use docscout::config::Config;
use docscout::gateway::HttpGateway;
use docscout::index::{DocumentIndexer, IndexStore, IndexerOptions};
use docscout::retrieval::{IndexGuidedRetrieval, RetrievalParams};
use docscout::tools::{FinishTool, ListDocumentsTool, ReadDocumentTool, ToolSet};
use std::path::PathBuf;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(model) = &args.model {
        config.gateway.model = model.clone();
    }
    if let Some(url) = &args.gateway_url {
        config.gateway.base_url = url.clone();
    }
    if let Some(dir) = &args.documents_dir {
        config.paths.documents_dir = dir.display().to_string();
    }
    if let Some(dir) = &args.indices_dir {
        config.paths.indices_dir = dir.display().to_string();
    }

    let documents_dir = PathBuf::from(&config.paths.documents_dir);
    let indices_dir = PathBuf::from(&config.paths.indices_dir);

    if matches!(args.command, Commands::Config) {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let gateway = Arc::new(HttpGateway::new(
        &config.gateway.base_url,
        &config.gateway.model,
        config.gateway.timeout_secs,
    )?);

    match args.command {
        Commands::Index { path, reindex } => {
            let store = IndexStore::new(&indices_dir);
            let indexer = DocumentIndexer::new(gateway, store).with_options(IndexerOptions {
                batch_size: config.indexer.batch_size,
                reindex,
                verbose: args.verbose,
            });

            match path {
                Some(path) => {
                    let index = indexer.index_document(&path, None).await?;
                    println!(
                        "Indexed {} ({} pages, {} sections)",
                        index.document_id,
                        index.total_pages,
                        index.sections.len()
                    );
                }
                None => {
                    let indices = indexer.index_directory(&documents_dir).await?;
                    println!("Indexed {} documents into {}", indices.len(), indices_dir.display());
                }
            }
        }

        Commands::Ask { query } => {
            let store = IndexStore::new(&indices_dir);
            let engine = IndexGuidedRetrieval::new(gateway, store, &documents_dir).with_params(
                RetrievalParams {
                    top_k: config.retrieval.top_k,
                    max_sections_per_document: config.retrieval.max_sections_per_document,
                    verbose: args.verbose,
                },
            );

            let result = engine.retrieve_with_index(&query).await?;

            match (&result.answer, result.has_grounding()) {
                (Some(answer), _) => println!("{}", answer),
                (None, true) => {
                    for chunk in &result.chunks {
                        println!("{}", chunk.citation);
                    }
                }
                (None, false) => println!(
                    "{}",
                    result
                        .message
                        .unwrap_or_else(|| "No information found for this query.".to_string())
                ),
            }

            if args.verbose {
                eprintln!(
                    "[RESULT] method={:?} status={:?} chunks={} elapsed={}ms",
                    result.method,
                    result.status,
                    result.chunks.len(),
                    result.elapsed_ms
                );
            }
        }

        Commands::Search { query } => {
            let tools = ToolSet::builder()
                .with(Arc::new(ListDocumentsTool::new(&documents_dir)))
                .with(Arc::new(ReadDocumentTool::new(&documents_dir)?))
                .with(Arc::new(FinishTool))
                .build();

            let agent = SearchAgent::new(gateway, tools).with_config(AgentConfig {
                max_iterations: config.agent.max_iterations,
                max_repeats: config.agent.max_repeats,
                verbose: args.verbose,
            });

            let outcome = agent.run(&query).await;
            println!("{}", outcome.answer);

            if args.verbose {
                eprintln!(
                    "[RESULT] stop={:?} iterations={} observations={}",
                    outcome.metadata.stop,
                    outcome.metadata.iterations,
                    outcome.metadata.observations.len()
                );
            }
        }

        Commands::Config => {}
    }

    Ok(())
}
