use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod error;
mod llm;
mod lms;
mod media;
mod pipeline;
mod quiz;
mod storage;
#[cfg(test)]
mod test_support;
mod transcription;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "lectern=debug,info",
        _ => "debug",
    }
}

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(cli.verbose))),
        )
        .init();

    if let Err(e) = cli::handle_command(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
