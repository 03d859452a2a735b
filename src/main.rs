mod commands;
#[cfg(feature = "mcp")]
mod mcp;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pkb::core::paths::DataPaths;
use pkb::{Config, ContentType, KnowledgeBase};

#[derive(Parser)]
#[command(name = "pkb")]
#[command(about = "Personal knowledge base with keyword and semantic search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Data directory (default ~/.pkb)
    #[arg(long, global = true, env = "PKB_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Database file (default <data-dir>/pkb.db)
    #[arg(long, global = true, env = "PKB_DB")]
    db: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    // ===== Content =====
    /// Store a new content record
    Add {
        #[arg(long, short = 't', value_enum, default_value = "note")]
        r#type: ContentType,
        #[arg(long)]
        title: String,
        #[arg(long, conflicts_with = "file", help = "Body text")]
        body: Option<String>,
        #[arg(long, help = "Read the body from a file and record its path")]
        file: Option<PathBuf>,
        #[arg(long, help = "Source URL")]
        url: Option<String>,
        #[arg(long = "tag", help = "Tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Show one content record
    Get {
        id: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List content, newest first
    List {
        #[arg(long, short = 't', value_enum)]
        r#type: Option<ContentType>,
        #[arg(long, short, default_value_t = 10)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Replace fields of a content record; unspecified fields keep their value
    Edit {
        id: i64,
        #[arg(long, short = 't', value_enum)]
        r#type: Option<ContentType>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        url: Option<String>,
        #[arg(long = "tag", help = "Replace the tag set (repeatable)")]
        tags: Vec<String>,
        #[arg(long, conflicts_with = "tags", help = "Remove every tag")]
        clear_tags: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete a content record with its tag links and embeddings
    Delete { id: i64 },

    // ===== Generators =====
    /// Generate and store the embedding for a content record now
    Embed {
        id: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Summarize a content record (requires OPENAI_API_KEY)
    Summarize { id: i64 },

    // ===== Retrieval =====
    /// Keyword or semantic search
    #[command(alias = "s")]
    Search {
        query: String,
        #[arg(long, help = "Rank by embedding similarity instead of substring match")]
        semantic: bool,
        #[arg(long, short = 't', value_enum)]
        r#type: Option<ContentType>,
        #[arg(long = "tag", help = "Required tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, short, default_value_t = 10)]
        limit: i64,
        #[arg(long, default_value_t = 0)]
        offset: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List tags
    Tags {
        #[arg(long, help = "Create a tag")]
        create: Option<String>,
        #[arg(long, help = "Show how many records carry each tag")]
        counts: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Store summary
    Status {
        #[arg(long, help = "JSON output")]
        json: bool,
    },

    // ===== MCP Server =====
    /// Start MCP server for Claude integration
    #[cfg(feature = "mcp")]
    Mcp {
        #[arg(long, help = "Show Claude configuration instructions")]
        install: bool,
    },
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("PKB_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(dir) = cli.data_dir {
        config.paths = DataPaths::from_root(dir);
    }
    if let Some(db) = cli.db {
        config.paths = config.paths.with_database(&db);
    }

    #[cfg(feature = "mcp")]
    {
        if let Commands::Mcp { install: true } = cli.command {
            mcp::print_mcp_install_instructions(&config);
            return Ok(());
        }
    }

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run(cli.command, config))
}

async fn run(command: Commands, config: Config) -> anyhow::Result<()> {
    let kb = KnowledgeBase::from_config(&config)
        .with_context(|| format!("failed to open knowledge base at {}", config.paths.database.display()))?;

    let result = match command {
        // Content
        Commands::Add {
            r#type,
            title,
            body,
            file,
            url,
            tags,
            json,
        } => {
            let add = commands::add::AddArgs {
                content_type: r#type,
                title,
                body,
                file,
                url,
                tags,
            };
            commands::add::run(&kb, add, json).await
        }
        Commands::Get { id, json } => commands::get::run(&kb, id, json),
        Commands::List {
            r#type,
            limit,
            offset,
            json,
        } => commands::list::run(&kb, r#type, limit, offset, json),
        Commands::Edit {
            id,
            r#type,
            title,
            body,
            url,
            tags,
            clear_tags,
            json,
        } => {
            let edit = commands::edit::EditArgs {
                content_type: r#type,
                title,
                body,
                url,
                tags,
                clear_tags,
            };
            commands::edit::run(&kb, id, edit, json).await
        }
        Commands::Delete { id } => commands::delete::run(&kb, id),

        // Generators
        Commands::Embed { id, json } => commands::embed::run(&kb, id, json).await,
        Commands::Summarize { id } => commands::summarize::run(&kb, id).await,

        // Retrieval
        Commands::Search {
            query,
            semantic,
            r#type,
            tags,
            limit,
            offset,
            json,
        } => {
            let query = pkb::SearchQuery {
                query,
                content_type: r#type,
                tags,
                limit,
                offset,
                semantic,
            };
            commands::search::run(&kb, &query, json).await
        }
        Commands::Tags { create, counts, json } => commands::tags::run(&kb, create.as_deref(), counts, json),
        Commands::Status { json } => commands::status::run(&kb, json),

        // MCP Server
        #[cfg(feature = "mcp")]
        Commands::Mcp { .. } => mcp::run_mcp_server(kb.clone()).await,
    };

    // Let detached embedding refreshes finish before the process exits
    kb.wait_for_background().await;
    result
}
