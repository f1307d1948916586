//! Tools, health and identity commands.

use anyhow::{Context, Result};
use mcpchat_core::client::Backend;

pub async fn tools(backend: &Backend) -> Result<()> {
    let tools = backend.list_tools().await.context("list tools")?;
    if tools.is_empty() {
        println!("No tools available.");
        return Ok(());
    }
    for tool in tools {
        match tool.description {
            Some(description) => println!("{:<24}  {description}", tool.name),
            None => println!("{}", tool.name),
        }
    }
    Ok(())
}

pub async fn health(backend: &Backend) -> Result<()> {
    let health = backend.health().await.context("fetch health")?;
    println!("backend: {}", health.status);
    if let Some(mcp) = health.mcp_server {
        println!("mcp server: {mcp}");
    }
    if let Some(provider) = health.ai_provider {
        println!("ai provider: {provider}");
    }
    Ok(())
}

pub async fn whoami(backend: &Backend) -> Result<()> {
    let info = backend.user_info().await.context("fetch user info")?;
    let handle = info
        .login_handle()
        .map_or_else(|| "@unknown".to_string(), |login| format!("@{login}"));
    println!("{} ({handle})", info.display_name());
    Ok(())
}
