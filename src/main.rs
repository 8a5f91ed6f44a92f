use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use futures::future::join_all;
use tracing_subscriber::EnvFilter;
use url::Url;

use podxml::{FetchOptions, ParsedFeed, ReqwestClient, is_url, parse_url_with, parse_xml};

/// Parse podcast RSS feeds into JSON
#[derive(Parser, Debug)]
#[command(name = "podxml")]
#[command(about = "Parse podcast RSS feeds into JSON, even broken or truncated ones")]
#[command(version)]
struct Args {
    /// RSS feed URLs or paths to local RSS files
    #[arg(required = true)]
    sources: Vec<String>,

    /// Only download the first BYTES of each remote feed and repair the cut-off document
    #[arg(short, long, value_name = "BYTES")]
    range: Option<u64>,

    /// Extra request header for remote feeds (repeatable)
    #[arg(short = 'H', long = "header", value_name = "NAME:VALUE", value_parser = parse_header)]
    headers: Vec<(String, String)>,

    /// Print JSON on a single line
    #[arg(long)]
    compact: bool,
}

fn parse_header(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:VALUE, got '{raw}'"))?;
    Ok((name.trim().to_string(), value.trim().to_string()))
}

async fn load_feed(client: &ReqwestClient, source: &str, options: &FetchOptions) -> Result<ParsedFeed> {
    if is_url(source) {
        let url = Url::parse(source).with_context(|| format!("Invalid feed URL {source}"))?;
        return Ok(parse_url_with(client, &url, options).await?);
    }

    let xml = tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("Failed to read feed file {source}"))?;
    Ok(parse_xml(&xml)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let client = ReqwestClient::new();

    let mut options = FetchOptions {
        request_size: args.range,
        ..Default::default()
    };
    for (name, value) in &args.headers {
        options = options.with_header(name, value);
    }

    let results = join_all(
        args.sources
            .iter()
            .map(|source| load_feed(&client, source, &options)),
    )
    .await;

    let mut failed = 0;
    for (source, result) in args.sources.iter().zip(results) {
        match result {
            Ok(feed) => {
                let json = if args.compact {
                    serde_json::to_string(&feed)?
                } else {
                    serde_json::to_string_pretty(&feed)?
                };
                println!("{json}");
            }
            Err(error) => {
                failed += 1;
                eprintln!("{} {} - {:#}", "error:".red().bold(), source.yellow(), error);
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
