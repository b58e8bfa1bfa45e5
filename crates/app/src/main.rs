//! Terminal front end for the panel assistant: one line in, one reply out.

use anyhow::{Context, Result};
use app::command::{Command, HELP};
use app::notices::{describe_error, BUSY_NEW_CONVERSATION};
use app::{ChatError, ChatSession};
use providers::Gateway;
use shared::agent_api::{Role, Turn};
use shared::settings::SettingsManager;
use shared::store::JsonFileStore;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = JsonFileStore::open_default().context("failed to open settings")?;
    info!(path = %store.path().display(), "settings loaded");
    let settings = Arc::new(SettingsManager::new(store));
    let session = ChatSession::new(settings.clone(), Gateway::new());

    let provider = settings.provider_or_default();
    println!(
        "Chatting with {} ({}). Type /help for commands.",
        provider.display_name(),
        settings.model(provider)
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Invalid(reason) => println!("{}", reason),
            Command::History => print_history(&session.history()),
            Command::NewConversation => match session.new_conversation() {
                Ok(()) => println!("Started a new conversation."),
                Err(ChatError::Busy) => println!("{}", BUSY_NEW_CONVERSATION),
                Err(e) => println!("{}", describe_error(settings.provider_or_default(), &e)),
            },
            Command::SetProvider(p) => {
                settings.set_provider(p)?;
                println!("Now using {} ({}).", p.display_name(), settings.model(p));
            }
            Command::SetModel(model) => {
                let p = settings.provider_or_default();
                settings.set_model(p, &model)?;
                println!("{} will use {}.", p.display_name(), model);
            }
            Command::Send(input) => {
                let provider = settings.provider_or_default();
                match session.submit(input).await {
                    Ok(reply) => println!("{}\n", reply),
                    Err(e) => println!("{}\n", describe_error(provider, &e)),
                }
            }
        }
    }
    Ok(())
}

fn print_history(turns: &[Turn]) {
    if turns.is_empty() {
        println!("(no messages yet)");
        return;
    }
    for turn in turns {
        let who = match turn.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        let image = if turn.content.has_images() { " [image]" } else { "" };
        println!("{}{}: {}", who, image, turn.content.text());
    }
}
