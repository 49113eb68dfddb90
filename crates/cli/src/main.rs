//! WebRAG CLI
//!
//! Crawl a website into a local vector index and answer questions about it.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, DropCommand, IndexCommand, PromptsCommand, StatsCommand};
use std::path::PathBuf;
use webrag_core::{config::AppConfig, logging, AppResult};

/// WebRAG - question answering over website content
#[derive(Parser, Debug)]
#[command(name = "webrag")]
#[command(about = "Answer questions about a website from its own content", long_about = None)]
#[command(version)]
struct Cli {
    /// Data directory for the index, config and prompt overrides (default: ./.webrag)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// LLM provider (groq, openai, ollama)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Crawl backend (firecrawl, http)
    #[arg(long, global = true)]
    crawler: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl a website and index its content
    Index(IndexCommand),

    /// Ask one question about a website
    Ask(AskCommand),

    /// Ask questions interactively
    Chat(ChatCommand),

    /// Show indexed collections
    Stats(StatsCommand),

    /// Delete a website's collection
    Drop(DropCommand),

    /// List available prompts
    Prompts(PromptsCommand),
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Index(_) => "index",
            Commands::Ask(_) => "ask",
            Commands::Chat(_) => "chat",
            Commands::Stats(_) => "stats",
            Commands::Drop(_) => "drop",
            Commands::Prompts(_) => "prompts",
        }
    }

    /// Whether the command talks to the crawl and completion services.
    fn needs_providers(&self) -> bool {
        matches!(
            self,
            Commands::Index(_) | Commands::Ask(_) | Commands::Chat(_)
        )
    }
}

#[tokio::main]
async fn main() -> AppResult<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_with(cli.data_dir.as_deref(), cli.config.as_deref())?;
    let config = config.with_overrides(
        cli.provider,
        cli.model,
        cli.crawler,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("WebRAG CLI starting");
    tracing::debug!("Data dir: {:?}", config.data_dir);
    tracing::debug!("Provider: {} ({})", config.provider, config.model);
    tracing::debug!("Crawler: {}", config.crawler_provider());

    if cli.command.needs_providers() {
        config.validate()?;
    }

    let _span = tracing::info_span!("command", name = cli.command.name()).entered();

    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Stats(cmd) => cmd.execute(&config),
        Commands::Drop(cmd) => cmd.execute(&config),
        Commands::Prompts(cmd) => cmd.execute(&config),
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_flags_after_command() {
        let cli = Cli::parse_from([
            "webrag",
            "ask",
            "https://a.io/",
            "What is it?",
            "--provider",
            "ollama",
            "--crawler",
            "http",
        ]);

        assert_eq!(cli.provider.as_deref(), Some("ollama"));
        assert_eq!(cli.crawler.as_deref(), Some("http"));
        assert!(cli.command.needs_providers());
        assert_eq!(cli.command.name(), "ask");
    }

    #[test]
    fn test_stats_does_not_need_providers() {
        let cli = Cli::parse_from(["webrag", "stats"]);
        assert!(!cli.command.needs_providers());
    }

    #[test]
    fn test_index_reindex_flag() {
        let cli = Cli::parse_from(["webrag", "index", "https://a.io/", "--reindex", "--json"]);
        match cli.command {
            Commands::Index(cmd) => {
                assert!(cmd.reindex);
                assert!(cmd.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
