use anyhow::Result;
use colored::*;

use pkb::KnowledgeBase;

pub async fn run(kb: &KnowledgeBase, id: i64, json: bool) -> Result<()> {
    let receipt = kb.generate_embedding(id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&receipt)?);
    } else {
        println!(
            "{} Embedded #{} with {} ({} dimensions)",
            "✓".green(),
            receipt.content_id,
            receipt.model.cyan(),
            receipt.dimensions
        );
    }
    Ok(())
}
