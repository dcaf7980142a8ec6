//! One-shot question CLI: run the full retrieve-expand-answer pipeline for
//! a single question and print the answer with its evidence.

use biograph::llm::OpenAiCompatProvider;
use biograph::{answer_question, AppState, BioGraphConfig, DEFAULT_CONFIG_PATH};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env().add_directive("biograph=info".parse()?),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let question = args
        .next()
        .ok_or_else(|| anyhow::anyhow!("usage: biograph-ask <question> [config-path]"))?;
    let config_path = args.next().unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = BioGraphConfig::load(&config_path)?;
    let provider = OpenAiCompatProvider::new(&config.llm);
    let state = AppState::new(config);

    let bundle = answer_question(&state, &provider, &question).await?;

    println!("{}", bundle.answer);
    if !bundle.evidence.is_empty() {
        println!("\nEvidence:");
        for item in &bundle.evidence {
            println!("  PMID {} - {} ({})", item.pmid, item.title, item.url);
        }
    }
    println!(
        "\n[{} nodes, {} edges retrieved]",
        bundle.nodes.len(),
        bundle.edges.len()
    );
    Ok(())
}
