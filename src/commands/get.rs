use anyhow::Result;

use pkb::KnowledgeBase;

pub fn run(kb: &KnowledgeBase, id: i64, json: bool) -> Result<()> {
    let content = kb.get_content(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        super::print_full(&content);
    }
    Ok(())
}
