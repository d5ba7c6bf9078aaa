//! Search command - hybrid semantic + keyword retrieval

use anyhow::Result;
use colored::Colorize;

use notekeeper::search::{fusion::SearchHit, keyword};
use notekeeper::{HitSource, SqliteStore};

/// Run search command
pub fn run(
    query: &str,
    limit: Option<usize>,
    workspace: Option<String>,
    tags: Vec<String>,
    json: bool,
    keyword_only: bool,
) -> Result<()> {
    let limit = limit.unwrap_or(10);

    if keyword_only {
        return run_keyword_only(query, limit, workspace.as_deref(), &tags, json);
    }

    let engine = super::open_engine()?;
    let hits = engine.search(query, limit, workspace.as_deref(), &tags)?;

    print_hits(engine.store(), &hits, query, json)
}

/// Literal matching only, skipping the index build entirely
fn run_keyword_only(
    query: &str,
    limit: usize,
    workspace: Option<&str>,
    tags: &[String],
    json: bool,
) -> Result<()> {
    let store = SqliteStore::open(&super::default_db_path())?;

    let hits: Vec<SearchHit> = keyword::search(&store, query, workspace, tags)?
        .into_iter()
        .take(limit)
        .map(|h| SearchHit {
            note_id: h.note_id,
            score: h.score.unwrap_or(1.0),
            source: HitSource::Keyword,
        })
        .collect();

    if !json {
        println!("{} Keyword-only search", "!".yellow());
        println!();
    }
    print_hits(&store, &hits, query, json)
}

fn print_hits(store: &SqliteStore, hits: &[SearchHit], query: &str, json: bool) -> Result<()> {
    if json {
        let mut json_hits = Vec::new();
        for hit in hits {
            let title = store.get(hit.note_id)?.map(|n| n.title);
            json_hits.push(serde_json::json!({
                "id": hit.note_id,
                "title": title,
                "score": hit.score,
                "source": hit.source.as_str(),
            }));
        }
        println!("{}", serde_json::to_string_pretty(&json_hits)?);
        return Ok(());
    }

    if hits.is_empty() {
        println!("{} No results found for: {}", "→".dimmed(), query.cyan());
        return Ok(());
    }

    println!(
        "{} {} results for: {}",
        "→".dimmed(),
        hits.len(),
        query.cyan()
    );
    println!();

    for (i, hit) in hits.iter().enumerate() {
        let note = store.get(hit.note_id)?;
        let title = note
            .as_ref()
            .map(|n| n.title.as_str())
            .unwrap_or("(deleted)");

        let score_str = format!("{:.2}", hit.score);
        let score_colored = if hit.source == HitSource::Both {
            score_str.green()
        } else if hit.score > 0.6 {
            score_str.yellow()
        } else {
            score_str.dimmed()
        };

        println!(
            "{}. [{}] {} {}",
            (i + 1).to_string().bold(),
            score_colored,
            title.cyan(),
            format!("({})", hit.source.as_str()).dimmed()
        );

        if let Some(note) = &note {
            if note.has_content() {
                // Truncate content for display (char-aware for Unicode)
                let snippet = if note.content.chars().count() > 100 {
                    format!("{}...", note.content.chars().take(100).collect::<String>())
                } else {
                    note.content.clone()
                };
                println!("   {}", snippet.dimmed());
            }
        }
        println!();
    }

    Ok(())
}
