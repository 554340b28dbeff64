//! tally-ctl — independent checksum verification client.
//!
//! Fetches a URL, strips the `X-Checksum` header from what it received, and
//! recomputes the checksum over the remaining status/headers/body. A match
//! proves the canonical serialization was replicated from observed bytes
//! alone.
//!
//! Verification can fail legitimately for servers whose transport adds
//! headers after the checksum was computed (a server-generated `Date` on a
//! handler that does not set one explicitly, for instance). That is a
//! property of the scheme, not of this client.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tally_core::CHECKSUM_HEADER;

#[derive(Debug, Parser)]
#[command(name = "tally-ctl")]
#[command(about = "Verify X-Checksum integrity headers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a URL and verify its X-Checksum header.
    Verify {
        /// URL to fetch, e.g. http://127.0.0.1:8080/
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Verify { url } => verify(&url).await,
    }
}

async fn verify(url: &str) -> Result<()> {
    let response = reqwest::get(url)
        .await
        .with_context(|| format!("failed to fetch {url} — is the server running?"))?;

    let status = response.status();
    let mut headers = response.headers().clone();
    let Some(claimed) = headers.remove(CHECKSUM_HEADER) else {
        eprintln!("response from {url} carries no X-Checksum header");
        std::process::exit(1);
    };
    let claimed = claimed
        .to_str()
        .context("X-Checksum header is not printable")?
        .to_string();

    let body = response
        .bytes()
        .await
        .context("failed to read response body")?;

    let computed = tally_core::compute(status, &headers, &body);

    println!("  URL      : {url}");
    println!("  Status   : {status}");
    println!("  Claimed  : {claimed}");
    println!("  Computed : {computed}");

    if computed == claimed {
        println!("  Result   : OK");
        Ok(())
    } else {
        println!("  Result   : MISMATCH");
        std::process::exit(1);
    }
}
