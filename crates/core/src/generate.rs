use futures::stream::{BoxStream, StreamExt};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::endpoint::Endpoint;

/// A failed exchange with an inference endpoint. Any variant ends the
/// conversation; the variants exist so callers and tests can tell the
/// failure kinds apart.
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Error from {url}: HTTP {status}: {body}")]
    Http {
        url: String,
        status: StatusCode,
        body: String,
    },
    #[error("Malformed stream chunk: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// One newline-delimited chunk of a streaming generate response.
#[derive(Debug, Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
}

/// Client for the streaming generate API of an Ollama-style endpoint.
///
/// Holds a connection pool shared by both endpoints. No request timeout is
/// configured; a hung endpoint blocks the conversation.
pub struct GenerateClient {
    http: reqwest::Client,
}

impl GenerateClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Issues one streaming generate request and returns the fragment stream.
    ///
    /// The outer error covers connection and HTTP status failures before any
    /// fragment arrives; stream items carry decoded text fragments and any
    /// mid-stream transport or decode failure.
    pub async fn generate(
        &self,
        endpoint: &Endpoint,
        prompt: &str,
    ) -> Result<BoxStream<'static, Result<String, TurnError>>, TurnError> {
        let url = endpoint.url.clone();
        debug!(
            "Requesting completion from {} ({} prompt chars)",
            url,
            prompt.len()
        );

        let request = GenerateRequest {
            model: &endpoint.model,
            prompt,
            stream: true,
        };
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|source| TurnError::Transport {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(TurnError::Http { url, status, body });
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            // Raw bytes carried across HTTP chunk boundaries until a full
            // newline-delimited JSON line is available.
            let mut buffer: Vec<u8> = Vec::new();
            while let Some(part) = body.next().await {
                let part = match part {
                    Ok(part) => part,
                    Err(source) => {
                        yield Err(TurnError::Transport { url: url.clone(), source });
                        return;
                    }
                };
                buffer.extend_from_slice(&part);

                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    match decode_line(&line) {
                        Ok(Some(chunk)) => {
                            let done = chunk.done;
                            if !chunk.response.is_empty() {
                                yield Ok(chunk.response);
                            }
                            if done {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(err) => {
                            yield Err(err);
                            return;
                        }
                    }
                }
            }

            // Trailing line without a final newline.
            match decode_line(&buffer) {
                Ok(Some(chunk)) if !chunk.response.is_empty() => yield Ok(chunk.response),
                Ok(_) => {}
                Err(err) => yield Err(err),
            }
        };
        Ok(stream.boxed())
    }
}

impl Default for GenerateClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Decodes one NDJSON line. Blank lines yield nothing.
fn decode_line(line: &[u8]) -> Result<Option<GenerateChunk>, TurnError> {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let chunk: GenerateChunk = serde_json::from_slice(line)?;
    Ok(Some(chunk))
}
