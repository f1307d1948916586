//! Session management commands.

use anyhow::{Context, Result};
use mcpchat_core::client::Backend;
use mcpchat_core::session::relative_time;

pub async fn list(backend: &Backend) -> Result<()> {
    let mut sessions = backend.list_sessions().await.context("list sessions")?;
    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }

    sessions.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
    for session in sessions {
        println!(
            "{}  {:<24}  {}",
            session.id,
            session.name,
            relative_time(&session.last_activity)
        );
    }
    Ok(())
}

pub async fn new(backend: &Backend, name: &str) -> Result<()> {
    let session = backend.create_session(name).await.context("create session")?;
    println!("{}  {}", session.id, session.name);
    Ok(())
}

pub async fn show(backend: &Backend, id: &str) -> Result<()> {
    let session = backend
        .session(id)
        .await
        .with_context(|| format!("load session {id}"))?;

    println!("{} ({})", session.name, relative_time(&session.last_activity));
    if session.messages.is_empty() {
        println!("No messages yet.");
        return Ok(());
    }
    for message in &session.messages {
        let feedback = match message.liked {
            Some(true) => " [+1]",
            Some(false) => " [-1]",
            None => "",
        };
        println!("[{}]{} {}", message.role, feedback, message.content);
    }
    Ok(())
}

pub async fn rename(backend: &Backend, id: &str, name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Session name is empty");
    }
    backend
        .rename_session(id, name)
        .await
        .with_context(|| format!("rename session {id}"))?;
    println!("renamed {id}");
    Ok(())
}

pub async fn delete(backend: &Backend, id: &str) -> Result<()> {
    backend
        .delete_session(id)
        .await
        .with_context(|| format!("delete session {id}"))?;
    println!("deleted {id}");
    Ok(())
}

pub async fn clear(backend: &Backend, id: &str) -> Result<()> {
    backend
        .clear_messages(id)
        .await
        .with_context(|| format!("clear session {id}"))?;
    println!("cleared {id}");
    Ok(())
}
