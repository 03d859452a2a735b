use anyhow::Result;
use colored::*;

use pkb::KnowledgeBase;

pub fn run(kb: &KnowledgeBase, id: i64) -> Result<()> {
    kb.delete_content(id)?;
    println!("{} Deleted #{}", "✓".green(), id);
    Ok(())
}
