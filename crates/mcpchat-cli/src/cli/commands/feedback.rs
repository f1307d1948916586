//! Message feedback command.

use anyhow::{Context, Result};
use mcpchat_core::client::Backend;

pub async fn run(
    backend: &Backend,
    session_id: &str,
    message_id: &str,
    liked: bool,
) -> Result<()> {
    // Look the message up first so a typo'd id fails with a clear message
    // instead of a backend refusal.
    let session = backend
        .session(session_id)
        .await
        .with_context(|| format!("load session {session_id}"))?;
    if session.message(message_id).is_none() {
        anyhow::bail!("No message {message_id} in session {session_id}");
    }

    let message = backend
        .send_feedback(session_id, message_id, liked)
        .await
        .context("send feedback")?;

    let marker = match message.liked {
        Some(true) => "[+1]",
        Some(false) => "[-1]",
        None => "[ ]",
    };
    println!("{marker} {}", message.id);
    Ok(())
}
