//! natter-register: create a chat account and save its token.
//!
//! Runs the registration exchange on the write port and writes the
//! returned `account_hash` to the token file the main client reads.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use natter_sdk::{connect, register, settings};

#[derive(Parser)]
#[command(name = "natter-register", about = "Register a natter chat account")]
struct Args {
    /// Chat server host
    #[arg(long, env = "NATTER_HOST", default_value = "chat.natter.net")]
    host: String,

    /// Port to send messages to
    #[arg(long, env = "NATTER_WRITE_PORT", default_value_t = 5050)]
    write_port: u16,

    /// Where to save the token
    #[arg(long, env = "NATTER_TOKEN_FILE")]
    token_file: Option<PathBuf>,

    /// Preferred nickname (prompted for if omitted)
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "natter_sdk=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let name = match args.name {
        Some(name) => name,
        None => prompt_name()?,
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("a nickname is required");
    }

    let stream = connect::acquire(&args.host, args.write_port).await;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let account = register::register(&mut reader, &mut write_half, name).await?;
    let Some(account) = account else {
        bail!("registration failed: the server did not return an account");
    };

    let path = args.token_file.unwrap_or_else(settings::default_token_path);
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating {}", dir.display()))?;
    }
    std::fs::write(&path, &account.account_hash)
        .with_context(|| format!("saving token to {}", path.display()))?;

    println!(
        "Registered as {}. Token saved to {}",
        account.nickname,
        path.display()
    );
    Ok(())
}

/// Plain stdin prompt, run before any terminal takeover.
fn prompt_name() -> Result<String> {
    let mut stderr = std::io::stderr();
    write!(stderr, "Preferred nickname: ")?;
    stderr.flush()?;
    let mut name = String::new();
    std::io::stdin().lock().read_line(&mut name)?;
    Ok(name)
}
