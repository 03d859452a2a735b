use anyhow::Result;
use colored::*;

use pkb::{ContentDraft, ContentType, KnowledgeBase};

/// Fields given on the command line; `None` keeps the stored value
pub struct EditArgs {
    pub content_type: Option<ContentType>,
    pub title: Option<String>,
    pub body: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub clear_tags: bool,
}

pub async fn run(kb: &KnowledgeBase, id: i64, args: EditArgs, json: bool) -> Result<()> {
    let current = kb.get_content(id)?;

    // Updates replace everything, so start from the stored record
    let tags = if args.clear_tags {
        Vec::new()
    } else if args.tags.is_empty() {
        current.tags
    } else {
        args.tags
    };
    let draft = ContentDraft {
        content_type: args.content_type.unwrap_or(current.content_type),
        title: args.title.unwrap_or(current.title),
        body: args.body.unwrap_or(current.body),
        source_url: args.url.or(current.source_url),
        file_path: current.file_path,
        tags,
    };

    let content = kb.update_content(id, draft).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        println!("{} Updated", "✓".green());
        super::print_summary(&content);
    }
    Ok(())
}
