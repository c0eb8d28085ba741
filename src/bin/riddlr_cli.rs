//! riddlr CLI: topic normalization, output repair and riddle lookup
//!
//! Usage:
//!   riddlr-cli normalize <topic>                          Show cache key and prompt topic
//!   riddlr-cli repair <file|->                            Repair and parse raw generation output
//!   riddlr-cli get <topic> [--config <path>] [--uid <uid>]  Fetch riddles for a topic

use anyhow::{bail, Context};
use riddlr::config::RiddlrConfig;
use riddlr::generation::GenerativeLanguageClientBuilder;
use riddlr::store::{MemoryStore, RiddleStore};
use riddlr::structured::{RepairPipeline, RiddleExtractor};
use riddlr::{clock, humanize_topic, normalize_topic_key, RiddleService};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("riddlr=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "normalize" => cmd_normalize(&args[2..]),
        "repair" => cmd_repair(&args[2..]),
        "get" => cmd_get(&args[2..]).await,
        "version" | "--version" | "-V" => {
            cmd_version();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"riddlr-cli: trivia riddles by topic

USAGE:
    riddlr-cli <COMMAND> [OPTIONS]

COMMANDS:
    normalize <topic>                         Show the cache key and prompt form of a topic
    repair <file|->                           Repair raw generation output and print riddles
    get <topic> [--config <path>] [--uid <id>]
                                              Generate riddles for a topic
    version                                   Show version information
    help                                      Show this help message

ENVIRONMENT:
    RIDDLR_API_KEY              Generation service API key
    RIDDLR_BASE_URL             Generation service base URL
    RIDDLR_MODEL                Model name, e.g. models/text-bison-001
    RIDDLR_TIMEOUT_SECS         Generation timeout in seconds
    RUST_LOG                    Log filter (default: riddlr=info)"#
    );
}

fn cmd_version() {
    println!("riddlr-cli {}", env!("CARGO_PKG_VERSION"));
}

/// Value following `flag`, if present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Positional arguments with every `--flag value` pair removed.
fn positional(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn cmd_normalize(args: &[String]) -> anyhow::Result<()> {
    let topic = args.join(" ");
    if topic.is_empty() {
        bail!("normalize requires a topic");
    }
    println!("key:    {}", normalize_topic_key(&topic));
    println!("prompt: {}", humanize_topic(&topic));
    Ok(())
}

fn cmd_repair(args: &[String]) -> anyhow::Result<()> {
    let source = args.first().map(String::as_str).unwrap_or("-");
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading {source}"))?
    };

    let pipeline = RepairPipeline::standard();
    let repaired = pipeline.repair(&raw);
    eprintln!("steps applied: {:?}", repaired.applied);

    let riddles = RiddleExtractor::new()
        .extract_candidate(&raw)
        .context("output could not be repaired")?;
    println!("{}", serde_json::to_string_pretty(&riddles)?);
    Ok(())
}

async fn cmd_get(args: &[String]) -> anyhow::Result<()> {
    let topic = positional(args).join(" ");
    if topic.is_empty() {
        bail!("get requires a topic");
    }
    let uid = flag_value(args, "--uid").unwrap_or("cli");
    let config_path = flag_value(args, "--config").map(PathBuf::from);

    let config = RiddlrConfig::load(config_path.as_deref()).context("loading configuration")?;
    let client = GenerativeLanguageClientBuilder::from_config(&config.generation)
        .build()
        .context("building generation client")?;
    let store = RiddleStore::new(Arc::new(MemoryStore::new()), clock::system_clock());
    let service = RiddleService::new(store, Arc::new(client), &config);

    let result = service.get_riddles_for_topic(uid, &topic).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_flags_and_positionals_are_separated() {
        let argv = args(&["Solar", "--uid", "u7", "System", "--config", "c.yaml"]);
        assert_eq!(flag_value(&argv, "--uid"), Some("u7"));
        assert_eq!(flag_value(&argv, "--config"), Some("c.yaml"));
        assert_eq!(flag_value(&argv, "--missing"), None);
        assert_eq!(positional(&argv), vec!["Solar", "System"]);
    }
}
