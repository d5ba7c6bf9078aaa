//! List command - show stored notes

use anyhow::Result;
use colored::Colorize;

use notekeeper::SqliteStore;

/// Run list command
pub fn run(workspace: Option<String>, tags: Vec<String>, json: bool) -> Result<()> {
    // Listing never touches the index, open the store directly
    let store = SqliteStore::open(&super::default_db_path())?;

    let notes: Vec<_> = store
        .get_all(workspace.as_deref())?
        .into_iter()
        .filter(|n| n.has_all_tags(&tags))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("{} No notes found", "→".dimmed());
        return Ok(());
    }

    println!("{} {} notes", "→".dimmed(), notes.len());
    println!();

    for note in &notes {
        println!(
            "{} {} {}",
            note.id.to_string().bold(),
            note.title.cyan(),
            format!("[{}]", note.workspace).dimmed()
        );
        if !note.tags.is_empty() {
            println!("   {}", note.tags.join(", ").dimmed());
        }
        if let Some(updated) = chrono::DateTime::from_timestamp_millis(note.updated_at) {
            println!(
                "   {}",
                updated.format("updated %Y-%m-%d %H:%M").to_string().dimmed()
            );
        }
        println!();
    }

    Ok(())
}
