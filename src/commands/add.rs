//! Add command - create a note and index it

use anyhow::Result;
use colored::Colorize;

/// Run add command
pub fn run(
    title: &str,
    content: Option<String>,
    tags: Vec<String>,
    workspace: Option<String>,
    json: bool,
) -> Result<()> {
    let engine = super::open_engine()?;

    let note = engine.store().add_note(
        title,
        content.as_deref().unwrap_or(""),
        tags,
        workspace.as_deref(),
    )?;

    // The note is already saved and keyword-searchable; embedding
    // failure only costs the semantic signal
    if let Err(e) = engine.reindex_note(&note) {
        eprintln!("{} Note saved but not embedded: {}", "!".yellow(), e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&note)?);
    } else {
        println!(
            "{} Added note {} {}",
            "✓".green().bold(),
            note.id.to_string().cyan(),
            note.title.bold()
        );
        if !note.has_content() {
            println!(
                "  {} No content yet; the note will not appear in semantic search",
                "→".dimmed()
            );
        }
    }

    Ok(())
}
