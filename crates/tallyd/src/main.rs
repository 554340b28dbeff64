//! tallyd — entry point.

use clap::Parser;

/// HTTP server that adds an `X-Checksum` integrity header to every response.
#[derive(Debug, Parser)]
#[command(name = "tallyd")]
struct Args {
    /// Address to listen on for HTTP.
    #[arg(long = "http", env = "TALLYD_HTTP", default_value = ":8080")]
    http: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(e) = tallyd::serve(&args.http).await {
        let chain = format!("{e:#}");
        tracing::error!(error = %chain, "tallyd failed");
        std::process::exit(1);
    }
}
