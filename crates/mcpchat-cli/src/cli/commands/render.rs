//! Offline markdown-to-HTML rendering.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use mcpchat_core::markdown;

pub fn run(file: Option<&Path>) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .lock()
                .read_to_string(&mut buffer)
                .context("read stdin")?;
            buffer
        }
    };

    println!("{}", markdown::render(&text));
    Ok(())
}
