//! Interactive owner's-manual assistant.
//!
//! Brings the pipeline up front (extraction cache, chunking, embedding
//! cache), then serves a line-oriented question loop until an exit keyword
//! or Ctrl-C.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use manualsmith::chat::OpenAiChat;
use manualsmith::chunking::chunk_text;
use manualsmith::config::{AssistantConfig, SYSTEM_PROMPT};
use manualsmith::embeddings::OpenAiEmbeddings;
use manualsmith::extraction::{LayoutClient, extract_or_load};
use manualsmith::session::{Session, is_exit_command};
use manualsmith::store::{build_or_load, cache_fingerprint};
use manualsmith::types::Result;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let config = AssistantConfig::from_env()?;

    let analyzer = LayoutClient::new(
        config.docintel_endpoint.clone(),
        config.docintel_key.clone(),
        config.request_timeout,
    )?;
    let embeddings = OpenAiEmbeddings::new(
        config.openai_endpoint.clone(),
        config.openai_key.clone(),
        config.openai_api_version.clone(),
        config.embedding_model.clone(),
        config.request_timeout,
    )?;
    let chat = OpenAiChat::new(
        config.openai_endpoint.clone(),
        config.openai_key.clone(),
        config.openai_api_version.clone(),
        config.chat_model.clone(),
        config.request_timeout,
    )?;

    let text = extract_or_load(&analyzer, &config.pdf_path, &config.extracted_text_path).await?;

    let chunks = chunk_text(&text, config.max_tokens);
    info!(chunks = chunks.len(), "chunked manual text");

    let fingerprint = cache_fingerprint(&text, config.max_tokens);
    let records = build_or_load(
        &chunks,
        &config.embeddings_cache_path,
        fingerprint,
        &embeddings,
        config.rebuild_stale_cache,
    )
    .await?;

    let mut session = Session::new(SYSTEM_PROMPT);

    println!("Manual assistant ready. Ask a question, or 'exit' to quit.\n");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print!("You: ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                info!("interrupted, shutting down");
                break;
            }
        };

        let Some(query) = line else {
            break; // stdin closed
        };
        let query = query.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            println!("Assistant: Goodbye! Drive safe.");
            break;
        }

        let turn = if config.plain_chat {
            session.chat(query, &chat).await
        } else {
            session
                .ask(query, &embeddings, &chat, &records, config.top_k)
                .await
        };
        match turn {
            Ok(reply) => println!("Assistant: {reply}\n"),
            Err(err) => error!("turn failed: {err}"),
        }
    }

    Ok(())
}
