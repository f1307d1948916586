//! Chat command handler: send one message, stream the reply.

use std::io::Write;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use mcpchat_core::client::Backend;
use mcpchat_core::markdown;
use mcpchat_core::session::Message;
use mcpchat_core::stream::StreamNotification;

pub async fn run(
    backend: &Backend,
    session_id: Option<&str>,
    message: &str,
    html: bool,
) -> Result<()> {
    let message = message.trim();
    if message.is_empty() {
        anyhow::bail!("Message is empty");
    }

    let session = match session_id {
        Some(id) => backend
            .session(id)
            .await
            .with_context(|| format!("load session {id}"))?,
        None => backend
            .create_session("New Chat")
            .await
            .context("create session")?,
    };
    tracing::info!(session = %session.id, "sending chat message");

    // Shown immediately with a temporary id, like the browser client; the
    // server's copy becomes canonical on refresh.
    let user_message = Message::user(message);

    let mut stream = backend
        .chat(&session.id, message)
        .await
        .context("start chat stream")?;

    let mut assistant: Option<Message> = None;
    let mut printed = 0;
    while let Some(event) = stream.next().await {
        match event.context("read chat stream")? {
            StreamNotification::MessageStart { id } => {
                tracing::debug!(%id, "assistant message started");
                assistant = Some(Message::assistant(id));
            }
            StreamNotification::ContentAppended { content, .. } => {
                if !html {
                    // Cumulative text grows by appending, so the tail past
                    // what we already printed is exactly the new delta.
                    print!("{}", &content[printed..]);
                    printed = content.len();
                    std::io::stdout().flush()?;
                }
            }
            StreamNotification::Error { message } => {
                eprintln!("backend error: {message}");
            }
        }
    }

    if let Some(message) = assistant.as_mut() {
        message.content = stream.finish().unwrap_or_default();
    }
    if html {
        println!("<p>{}</p>", markdown::escape_html(&user_message.content));
        if let Some(message) = &assistant {
            println!("{}", markdown::render(&message.content));
        }
    } else {
        println!();
    }

    // Replace our local view with the server's canonical copy.
    let refreshed = backend
        .session(&session.id)
        .await
        .context("refresh session")?;
    tracing::debug!(
        session = %refreshed.id,
        messages = refreshed.messages.len(),
        "session refreshed"
    );
    eprintln!("session: {}", refreshed.id);

    Ok(())
}
