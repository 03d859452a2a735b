use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::*;

use pkb::{ContentDraft, ContentType, KnowledgeBase};

pub struct AddArgs {
    pub content_type: ContentType,
    pub title: String,
    pub body: Option<String>,
    pub file: Option<PathBuf>,
    pub url: Option<String>,
    pub tags: Vec<String>,
}

pub async fn run(kb: &KnowledgeBase, args: AddArgs, json: bool) -> Result<()> {
    let mut draft = ContentDraft::new(args.content_type, args.title, args.body.unwrap_or_default()).with_tags(args.tags);

    if let Some(path) = args.file {
        draft.body = fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
        draft = draft.with_file_path(path.to_string_lossy());
    }
    if let Some(url) = args.url {
        draft = draft.with_source_url(url);
    }

    let content = kb.create_content(draft).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&content)?);
    } else {
        println!("{} Created", "✓".green());
        super::print_summary(&content);
    }
    Ok(())
}
