use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use reelbox_core::config::AppConfig;
use reelbox_core::history::{recent_items, HistoryProvider};
use reelbox_core::models::{Category, ContentItem};
use reelbox_runtime::{Runtime, RuntimeError};

#[derive(Parser, Debug)]
#[command(name = "reelbox", version, about = "Browse a video catalog server by category")]
struct Args {
    /// Config file to use instead of the one in the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write logs to this file instead of stderr.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured categories.
    Categories,
    /// Load pages of a category and print its items.
    Browse {
        title: String,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Print recently played items.
    History,
}

fn init_logging(log_file: Option<&Path>) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("reelbox=info"));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().unwrap_or_else(|| "reelbox.log".as_ref());
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig, RuntimeError> {
    match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    }
    .map_err(|e| RuntimeError::Config(e.to_string()))
}

fn describe(category: &Category) -> String {
    let kind = category.kind.map(|k| k.as_str()).unwrap_or("-");
    match (&category.tag, &category.tags) {
        (_, Some(tags)) => format!("{} [{kind}] tags: {}", category.title, tags.join(", ")),
        (Some(tag), None) => format!("{} [{kind}] tag: {tag}", category.title),
        (None, None) => format!("{} [{kind}]", category.title),
    }
}

fn print_item(item: &ContentItem) {
    match item {
        ContentItem::Movie(c) | ContentItem::Series(c) => println!(
            "{}\t{}\t{}",
            c.title,
            c.year.as_deref().unwrap_or("-"),
            c.rate.as_deref().unwrap_or("-"),
        ),
        ContentItem::History(h) => println!(
            "{}\t{}\tep {}/{}\t{:.0}%\t{}",
            h.title,
            h.source_name,
            h.episode_index,
            h.total_episodes,
            h.progress * 100.0,
            h.last_played_at.format("%Y-%m-%d %H:%M"),
        ),
    }
}

async fn browse(
    rt: &Runtime,
    title: &str,
    tag: Option<String>,
    pages: u32,
) -> Result<(), RuntimeError> {
    let category = rt
        .config()
        .categories
        .iter()
        .find(|c| c.title == title)
        .cloned()
        .ok_or_else(|| RuntimeError::Config(format!("unknown category: {title}")))?;
    let category = match tag {
        Some(tag) => category.with_tag(tag),
        None => category,
    };

    let store = rt.store();
    // Settles the session and the startup category before switching.
    store.fetch_initial_data().await;
    store.select_category(category).await;
    for _ in 1..pages {
        let state = store.state();
        if !state.has_more || state.error.is_some() {
            break;
        }
        store.load_more().await;
    }

    let state = store.state();
    for item in &state.content {
        print_item(item);
    }
    if let Some(error) = state.error {
        return Err(RuntimeError::Api(error));
    }
    tracing::info!(count = state.content.len(), has_more = state.has_more, "Browse finished");
    Ok(())
}

async fn run(args: Args) -> Result<(), RuntimeError> {
    let config = load_config(args.config.as_deref())?;
    let db_path = AppConfig::ensure_db_path().map_err(|e| RuntimeError::Config(e.to_string()))?;
    let rt = Runtime::open(config, &db_path)?;

    match args.command {
        Command::Categories => {
            for category in &rt.config().categories {
                println!("{}", describe(category));
            }
        }
        Command::Browse { title, tag, pages } => browse(&rt, &title, tag, pages).await?,
        Command::History => {
            let records = rt
                .history()
                .get_all()
                .await
                .map_err(|e| RuntimeError::Database(e.to_string()))?;
            for item in recent_items(&records) {
                print_item(&item);
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let _guard = init_logging(args.log_file.as_deref());

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("reelbox: {e}");
            ExitCode::FAILURE
        }
    }
}
