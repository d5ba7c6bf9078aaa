//! Edit command - apply a partial update to a note

use anyhow::{bail, Result};
use colored::Colorize;

use notekeeper::NoteUpdate;

/// Run edit command
pub fn run(
    id: i64,
    title: Option<String>,
    content: Option<String>,
    tags: Vec<String>,
    workspace: Option<String>,
    json: bool,
) -> Result<()> {
    let update = NoteUpdate {
        title,
        content,
        tags: if tags.is_empty() { None } else { Some(tags) },
        workspace,
    };

    if update.is_empty() {
        bail!("Nothing to change; pass at least one of --title, --content, --tag, --workspace");
    }

    let engine = super::open_engine()?;

    let Some(note) = engine.store().update_note(id, &update)? else {
        bail!("No note with id {}", id);
    };

    // Metadata-only edits (tags, workspace) keep the existing embedding
    if update.is_content_affecting() {
        if let Err(e) = engine.reindex_note(&note) {
            eprintln!("{} Note updated but not re-embedded: {}", "!".yellow(), e);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "{} Updated note {} {}",
            "✓".green().bold(),
            note.id.to_string().cyan(),
            note.title.bold()
        );
    }

    Ok(())
}
