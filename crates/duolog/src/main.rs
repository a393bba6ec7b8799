use anyhow::{Context, Result};
use duolog_core::config::get_config;
use duolog_core::endpoint::{Endpoint, KubectlLookup};
use duolog_core::generate::GenerateClient;

mod conversation;
mod log;
mod ux;

use conversation::Conversation;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        ux::present_error(e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    log::setup_logging()?;
    let config = get_config(None).context("Failed to load configuration")?;

    let lookup = KubectlLookup::new(config.namespace.clone());
    let opener = Endpoint::resolve(&lookup, &config.bots[0]).await;
    let responder = Endpoint::resolve(&lookup, &config.bots[1]).await;

    let conversation = Conversation::new(&config, [opener, responder], GenerateClient::new());
    conversation.run().await;
    Ok(())
}
