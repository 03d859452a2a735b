use anyhow::Result;
use colored::*;

use pkb::{ContentType, KnowledgeBase};

pub fn run(kb: &KnowledgeBase, content_type: Option<ContentType>, limit: i64, offset: i64, json: bool) -> Result<()> {
    let contents = kb.list_content(content_type, limit, offset)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&contents)?);
        return Ok(());
    }

    if contents.is_empty() {
        println!("{} No content", "→".dimmed());
        return Ok(());
    }

    for content in &contents {
        super::print_summary(content);
    }
    Ok(())
}
