use anyhow::Result;

use pkb::KnowledgeBase;

pub async fn run(kb: &KnowledgeBase, id: i64) -> Result<()> {
    let summary = kb.summarize(id).await?;
    println!("{summary}");
    Ok(())
}
