use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use cb_index::Index;
use cb_repo::{Board, ListScope, SortOrder};
use cb_retention::{load_config, save_config, RetentionConfig, RetentionJob};
use cb_server::{BoardServer, ServerConfig};
use cb_store::{BlobStore, FsBlobStore};
use cb_types::Actor;
use colored::Colorize;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Index(args) => cmd_index(args, format).await,
        Command::Config(args) => cmd_config(args, format).await,
        Command::Retention(args) => cmd_retention(args, format).await,
        Command::Posts(args) => cmd_posts(args, format).await,
    }
}

async fn open_store(root: &Path) -> anyhow::Result<BlobStore> {
    let backend = FsBlobStore::open(root)
        .await
        .with_context(|| format!("opening data directory {}", root.display()))?;
    Ok(BlobStore::new(Arc::new(backend)))
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::load(path).await?,
        None => ServerConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    println!("{} commitboard on {}", "▶".green(), config.bind_addr.to_string().bold());
    BoardServer::open(config).await?.serve().await?;
    Ok(())
}

async fn cmd_index(args: StoreArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(&args.root).await?;
    let (doc, revision) = Index::new(store).load().await?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            json!({
                "revision": revision,
                "lastUpdated": doc.last_updated,
                "users": doc.users.len(),
                "communities": doc.communities.len(),
                "posts": doc.posts.len(),
            })
        ),
        OutputFormat::Text => {
            println!("{} index at {}", "✓".green().bold(), revision.short_hex().yellow());
            println!("  Users:       {}", doc.users.len());
            println!("  Communities: {}", doc.communities.len());
            println!("  Posts:       {}", doc.posts.len());
            println!("  Updated:     {}", doc.last_updated.to_rfc3339().dimmed());
        }
    }
    Ok(())
}

async fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(&args.store.root).await?;
    if let Some(days) = args.retention_days {
        save_config(&store, &RetentionConfig { retention_days: days }, &Actor::admin(args.admin)).await?;
    }
    let config = load_config(&store).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&config)?),
        OutputFormat::Text => println!("Retention: {} days", config.retention_days.to_string().bold()),
    }
    Ok(())
}

async fn cmd_retention(args: RetentionArgs, format: OutputFormat) -> anyhow::Result<()> {
    let store = open_store(&args.store.root).await?;
    let config = match args.days {
        Some(retention_days) => RetentionConfig { retention_days },
        None => load_config(&store).await?,
    };
    let job = RetentionJob::new(store.clone(), Index::new(store)).with_batch_size(args.batch);
    let report = job.run(&config).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::Text => {
            println!(
                "{} Retention ({} days): {} deleted, {} pruned, {} skipped",
                "✓".green().bold(),
                config.retention_days,
                report.deleted_count().to_string().bold(),
                report.pruned.len(),
                report.skipped,
            );
            for id in &report.deleted {
                println!("  {} {}", "deleted:".red(), id);
            }
        }
    }
    Ok(())
}

async fn cmd_posts(args: PostsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let board = Board::new(open_store(&args.store.root).await?);
    let scope = match (&args.community, &args.user) {
        (Some(community), _) => ListScope::community(community),
        (None, Some(user)) => ListScope::user(user),
        (None, None) => ListScope::All,
    };
    let sort: SortOrder = args.sort.parse()?;
    let posts = board.list_posts(&scope, sort, args.limit).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&posts)?),
        OutputFormat::Text => {
            if posts.is_empty() {
                println!("No posts.");
            }
            for post in &posts {
                println!(
                    "{:>5}  {}  {} {}",
                    post.votes.score().to_string().bold(),
                    post.title,
                    format!("c/{}", post.community).cyan(),
                    format!("by {}", post.author).dimmed(),
                );
            }
        }
    }
    Ok(())
}
