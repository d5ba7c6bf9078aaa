//! Index command - rebuild the vector index or show its status

use anyhow::Result;
use colored::Colorize;

/// Run index command
pub fn run(status_only: bool, json: bool) -> Result<()> {
    let engine = super::open_engine()?;

    if status_only {
        let stats = engine.stats();
        let notes = engine.store().count()?;

        if json {
            println!(
                "{}",
                serde_json::json!({
                    "notes": notes,
                    "live": stats.live,
                    "stale": stats.stale,
                    "vectors": stats.vectors,
                })
            );
        } else {
            println!("{}", "Index Status".bold());
            println!();
            println!("  {} {} notes stored", "→".dimmed(), notes.to_string().cyan());
            println!(
                "  {} {} live embeddings",
                "→".dimmed(),
                stats.live.to_string().cyan()
            );
            println!("  {} {} stale entries", "→".dimmed(), stats.stale);
        }
        return Ok(());
    }

    let start = std::time::Instant::now();
    let indexed = engine.rebuild_index()?;
    let duration_ms = start.elapsed().as_millis();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "indexed": indexed,
                "duration_ms": duration_ms,
            })
        );
    } else {
        println!(
            "{} Indexed {} notes in {:.2}s",
            "✓".green().bold(),
            indexed.to_string().cyan(),
            duration_ms as f64 / 1000.0
        );
    }

    Ok(())
}
