use std::time::Duration;

use duolog_core::config::Config;
use duolog_core::endpoint::Endpoint;
use duolog_core::generate::{GenerateClient, TurnError};
use futures::StreamExt;
use tracing::{debug, error, info, warn};

use crate::ux::{self, SpeakerPrinter};

/// Drives a fixed-length alternating conversation between two endpoints.
///
/// The first bot speaks the seed prompt turn, then the bots alternate for
/// `max_turns` exchanges, each reply becoming the next prompt. The first
/// failed or empty reply ends the conversation.
pub struct Conversation {
    client: GenerateClient,
    bots: [Endpoint; 2],
    topic: String,
    seed_prompt: String,
    max_turns: usize,
    warmup_delay: Duration,
    turn_delay: Duration,
}

impl Conversation {
    pub fn new(config: &Config, bots: [Endpoint; 2], client: GenerateClient) -> Self {
        Self {
            client,
            bots,
            topic: config.topic.clone(),
            seed_prompt: config.seed_prompt.clone(),
            max_turns: config.max_turns,
            warmup_delay: Duration::from_secs(config.warmup_delay_secs),
            turn_delay: Duration::from_secs(config.turn_delay_secs),
        }
    }

    /// Runs the conversation once. Turn failures end it early; they are
    /// printed and logged, never returned.
    pub async fn run(&self) {
        // Let dependent services come up. No readiness check beyond this.
        tokio::time::sleep(self.warmup_delay).await;

        ux::print_topic_banner(&self.topic);

        let Some(mut last_response) = self.take_turn(0, &self.seed_prompt).await else {
            ux::print_error_line(&format!(
                "Failed to get response from {}. Exiting.",
                self.bots[0].name
            ));
            return;
        };

        for i in 0..self.max_turns {
            let speaker = if i % 2 == 0 { 1 } else { 0 };
            match self.take_turn(speaker, &last_response).await {
                Some(text) => last_response = text,
                None => break,
            }
            // Small delay for readability between turns.
            tokio::time::sleep(self.turn_delay).await;
        }
        info!("Conversation ended");
    }

    /// One request/response exchange. Returns the trimmed reply text, or
    /// `None` when the turn failed or the reply was empty — either way the
    /// conversation is over.
    async fn take_turn(&self, speaker: usize, prompt: &str) -> Option<String> {
        let endpoint = &self.bots[speaker];
        match self.stream_turn(endpoint, speaker, prompt).await {
            Ok(text) if text.is_empty() => {
                warn!("{} returned an empty reply", endpoint.name);
                None
            }
            Ok(text) => Some(text),
            Err(err) => {
                error!("Turn with {} failed: {err}", endpoint.name);
                ux::print_error_line(&err.to_string());
                None
            }
        }
    }

    /// Streams one reply to the terminal word by word and accumulates it.
    async fn stream_turn(
        &self,
        endpoint: &Endpoint,
        speaker: usize,
        prompt: &str,
    ) -> Result<String, TurnError> {
        let mut stream = self.client.generate(endpoint, prompt).await?;

        // The extra blank line belongs to the second configured bot only.
        let mut printer = SpeakerPrinter::new(&endpoint.name, endpoint.color, speaker == 1);
        printer.begin();
        while let Some(fragment) = stream.next().await {
            printer.feed(&fragment?);
        }
        let text = printer.finish();
        debug!("{} replied with {} chars", endpoint.name, text.len());
        Ok(text)
    }
}
