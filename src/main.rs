//! # NoticeBot
//!
//! Batch job run on a schedule (e.g. a CI cron): poll Telegram for
//! commands, scrape the notice board, and broadcast today's new notices.
//!
//! Usage:
//!   noticebot                      # Full run (same as `noticebot run`)
//!   noticebot relay                # Only register `/start` and relay `scrape`
//!   noticebot scrape               # Print the current board, send nothing
//!   noticebot --dry-run run        # Full run without sending or writing

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use noticebot_channels::{GitHubWorkflow, LoggingMessenger, LoggingTrigger, TelegramChannel};
use noticebot_core::traits::{CommandSource, Messenger, NoticeSource, RecordStore, WorkflowTrigger};
use noticebot_core::NoticeBotConfig;
use noticebot_engine::{Broadcaster, RelaySummary, RunSummary, Runner};
use noticebot_scraper::{NoticeBoardScraper, parse_notice_date};
use noticebot_store::{FileStore, MemoryStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "noticebot",
    version,
    about = "📢 NoticeBot: notice-board scraper and Telegram broadcaster"
)]
struct Cli {
    /// Config file (default: ./noticebot.toml if present)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Log what would be sent and persisted, touch nothing
    #[arg(long, global = true)]
    dry_run: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Poll commands, scrape, and broadcast today's notices
    Run,
    /// Poll commands, register subscribers, and relay `scrape` reporting the result
    Relay,
    /// Print the notices currently on the board
    Scrape,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "noticebot=debug,noticebot_engine=debug,noticebot_channels=debug,noticebot_scraper=debug,noticebot_store=debug"
    } else {
        "noticebot=info,noticebot_engine=info,noticebot_channels=info,noticebot_scraper=info,noticebot_store=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()));
    let config = NoticeBotConfig::load(config_path.as_deref())?;
    let file_store = FileStore::from_config(&config.store);
    let command = cli.command.unwrap_or(Commands::Run);

    if let Commands::Scrape = command {
        if config.scraper.base_url.trim().is_empty() {
            anyhow::bail!("NOTICE_BASE_URL is not set");
        }
        return print_board(&config, &file_store).await;
    }

    // Abort before any network call when a credential is missing.
    config.validate()?;

    let telegram = Arc::new(TelegramChannel::new(config.telegram.clone()));
    let commands: Arc<dyn CommandSource> = telegram.clone();
    let messenger: Arc<dyn Messenger>;
    let trigger: Arc<dyn WorkflowTrigger>;
    if cli.dry_run {
        messenger = Arc::new(LoggingMessenger);
        trigger = Arc::new(LoggingTrigger);
    } else {
        messenger = telegram;
        trigger = Arc::new(GitHubWorkflow::new(config.github.clone()));
    }
    let board: Arc<dyn NoticeSource> = Arc::new(NoticeBoardScraper::new(config.scraper.clone())?);
    let broadcaster = Broadcaster::new(Duration::from_millis(config.telegram.send_delay_ms));

    println!("📢 NoticeBot v{}", env!("CARGO_PKG_VERSION"));
    if cli.dry_run {
        println!("   🧪 Dry run: nothing is sent or written");
        let store = MemoryStore::seeded_from(&file_store);
        let runner = Runner::new(store, commands, messenger, trigger, board).with_broadcaster(broadcaster);
        execute(runner, command).await;
    } else {
        let runner = Runner::new(file_store, commands, messenger, trigger, board).with_broadcaster(broadcaster);
        execute(runner, command).await;
    }

    Ok(())
}

async fn execute<S: RecordStore>(mut runner: Runner<S>, command: Commands) {
    match command {
        Commands::Relay => print_relay_summary(&runner.relay().await),
        _ => {
            let today = chrono::Local::now().date_naive();
            print_run_summary(&runner.run(today).await);
        }
    }
}

async fn print_board(config: &NoticeBotConfig, store: &FileStore) -> Result<()> {
    let scraper = NoticeBoardScraper::new(config.scraper.clone())?;
    let notices = scraper.fetch_notices().await?;
    let known = store.load_known_urls();

    println!("📰 {} notices on {}\n", notices.len(), config.scraper.base_url);
    for (i, notice) in notices.iter().enumerate() {
        let date = parse_notice_date(&notice.date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| format!("? ({})", notice.date));
        let marker = if known.contains(&notice.url) { "  " } else { "🆕" };
        println!("{marker} {:>2}. [{date}] {}", i + 1, notice.title);
        println!("       {}", notice.url);
    }
    Ok(())
}

fn print_run_summary(summary: &RunSummary) {
    println!();
    println!("✅ Run complete");
    println!("   📩 Commands:        {}", summary.commands);
    println!("   👤 New subscribers: {}", summary.new_subscribers.len());
    println!(
        "   🚀 Triggers:        {} fired, {} failed",
        summary.triggers_fired, summary.triggers_failed
    );
    println!("   🔖 Cursor:          {}", summary.cursor);
    println!("   📰 Scraped:         {}", summary.dedup.scraped);
    println!("   🔔 New today:       {}", summary.dedup.new_today);
    println!("   💾 Logged:          {}", summary.dedup.persisted);
    println!(
        "   ✉️  Broadcast:       {} sent, {} failed",
        summary.dedup.broadcast.sent,
        summary.dedup.broadcast.failed.len()
    );
    for error in &summary.store_errors {
        println!("   ⚠️  Store error: {error}");
    }
}

fn print_relay_summary(summary: &RelaySummary) {
    println!();
    println!("✅ Relay complete");
    println!("   📩 Commands:        {}", summary.commands);
    println!("   👤 New subscribers: {}", summary.new_subscribers.len());
    println!(
        "   🚀 Triggers:        {} fired, {} failed",
        summary.triggers_fired, summary.triggers_failed
    );
    println!("   🔖 Cursor:          {}", summary.cursor);
    for error in &summary.store_errors {
        println!("   ⚠️  Store error: {error}");
    }
}
