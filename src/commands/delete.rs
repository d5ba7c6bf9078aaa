//! Delete command - remove a note from the store and the index

use anyhow::{bail, Result};
use colored::Colorize;

/// Run delete command
pub fn run(id: i64, json: bool) -> Result<()> {
    let engine = super::open_engine()?;

    if !engine.store().delete_note(id)? {
        bail!("No note with id {}", id);
    }
    engine.remove_note(id)?;

    if json {
        println!("{}", serde_json::json!({ "deleted": id }));
    } else {
        println!("{} Deleted note {}", "✓".green().bold(), id.to_string().cyan());
    }

    Ok(())
}
