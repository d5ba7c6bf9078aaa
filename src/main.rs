mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Personal notes with hybrid semantic + keyword search", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note
    Add {
        title: String,
        #[arg(long, help = "Note body text")]
        content: Option<String>,
        #[arg(long = "tag", help = "Tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "Workspace namespace")]
        workspace: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Update fields of an existing note
    Edit {
        id: i64,
        #[arg(long, help = "New title")]
        title: Option<String>,
        #[arg(long, help = "New body text")]
        content: Option<String>,
        #[arg(long = "tag", help = "Replace tags (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "Move to workspace")]
        workspace: Option<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Delete a note
    Delete {
        id: i64,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// List notes
    List {
        #[arg(long, help = "Filter by workspace")]
        workspace: Option<String>,
        #[arg(long = "tag", help = "Filter by tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
    /// Hybrid search across your notes
    Search {
        query: String,
        #[arg(long, short = 'k', help = "Limit results (default: 10)")]
        limit: Option<usize>,
        #[arg(long, help = "Scope to workspace")]
        workspace: Option<String>,
        #[arg(long = "tag", help = "Require tag (repeatable)")]
        tags: Vec<String>,
        #[arg(long, help = "JSON output")]
        json: bool,
        #[arg(long, help = "Skip semantic search, literal matching only")]
        keyword_only: bool,
    },
    /// Rebuild the vector index or show its status
    Index {
        #[arg(long, help = "Show index status only")]
        status: bool,
        #[arg(long, help = "JSON output")]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Add {
            title,
            content,
            tags,
            workspace,
            json,
        } => commands::add::run(&title, content, tags, workspace, json),
        Commands::Edit {
            id,
            title,
            content,
            tags,
            workspace,
            json,
        } => commands::edit::run(id, title, content, tags, workspace, json),
        Commands::Delete { id, json } => commands::delete::run(id, json),
        Commands::List {
            workspace,
            tags,
            json,
        } => commands::list::run(workspace, tags, json),
        Commands::Search {
            query,
            limit,
            workspace,
            tags,
            json,
            keyword_only,
        } => commands::search::run(&query, limit, workspace, tags, json, keyword_only),
        Commands::Index { status, json } => commands::index::run(status, json),
    }
}
