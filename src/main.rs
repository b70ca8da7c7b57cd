use anyhow::Result;
use kglink::embeddings::HttpEmbedder;
use kglink::retry::RetryPolicy;
use kglink::tables;
use kglink::wikidata::WikidataClient;
use kglink::{extract_triples, Config, LinkContext, LinkOptions, TaggedClause};
use std::sync::Arc;

/// Parse CLI args: three positionals — subject, predicate, object.
fn parse_clause_args() -> Result<TaggedClause> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    if positional.len() != 3 {
        anyhow::bail!(
            "Usage: kglink <subject> <predicate> <object>\nExample: kglink \"Marie Curie\" won \"Nobel Prize in Physics\""
        );
    }
    if positional.iter().any(|a| a.trim().is_empty()) {
        anyhow::bail!("Subject, predicate and object must not be empty");
    }
    Ok(TaggedClause::new(positional[0], positional[1], positional[2]))
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("RUST_LOG", "info"))
        .init();

    let clause = parse_clause_args()?;

    let config = Config::load()?;
    log::info!("Configuration loaded successfully");
    log::info!("SPARQL endpoint: {}", config.wikidata.sparql_url);
    log::info!("Embedding model: {}", config.embeddings.model);

    let (properties, constraints) =
        tables::load_tables(config.properties_path(), config.constraints_path())?;

    // Key presence was already validated during Config::load
    let api_key = match &config.embeddings.api_key_env {
        Some(env_name) => Some(std::env::var(env_name).map_err(|_| {
            anyhow::anyhow!("Environment variable {} not set", env_name)
        })?),
        None => None,
    };

    let policy = RetryPolicy::new(config.wikidata.max_retries, config.base_delay());
    let service = Arc::new(WikidataClient::new(&config.wikidata));
    let embedder = Arc::new(HttpEmbedder::new(&config.embeddings, api_key, policy));

    let ctx = LinkContext::new(
        service,
        embedder,
        properties,
        constraints,
        LinkOptions::from_config(&config.linking),
    );

    let triples = extract_triples(&ctx, &[clause]).await?;
    if triples.is_empty() {
        println!("No triple extracted");
    }
    for triple in triples {
        println!("{}", triple);
    }

    Ok(())
}
