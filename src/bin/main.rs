use shopping_assistant::{
    agent::{Collaborators, Orchestrator},
    catalog::Catalog,
    config::AssistantConfig,
    models::OutboundMessage,
    state::InMemorySessionStore,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SESSION_ID: &str = "terminal";

async fn print_messages(
    stdout: &mut tokio::io::Stdout,
    messages: &[OutboundMessage],
) -> std::io::Result<()> {
    for message in messages {
        stdout.write_all(format!("\nSAM: {}\n", message.message).as_bytes()).await?;
        if !message.buttons.is_empty() {
            stdout
                .write_all(format!("     [{}]\n", message.buttons.join("] [")).as_bytes())
                .await?;
        }
    }
    stdout.flush().await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Logs go to stderr so they don't interleave with the chat
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = AssistantConfig::from_env()?;
    let catalog = Arc::new(Catalog::load_from_dir(&config.data_dir));

    info!(
        inventory = catalog.inventory.len(),
        recipes = catalog.recipes.len(),
        "Datasets loaded"
    );

    let orchestrator = Orchestrator::new(
        catalog,
        Collaborators::from_config(&config)?,
        Arc::new(InMemorySessionStore::new()),
        config.max_selection_retries,
    )?;

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_messages(&mut stdout, &orchestrator.open_session(SESSION_ID).await).await?;

    loop {
        stdout.write_all(b"\nAsk your query (or type 'exit'): ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let outcome = orchestrator.on_message(SESSION_ID, &line).await;
        print_messages(&mut stdout, &outcome.messages).await?;

        if outcome.ended {
            break;
        }
    }

    orchestrator.close_session(SESSION_ID).await;
    Ok(())
}
