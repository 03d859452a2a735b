pub mod add;
pub mod delete;
pub mod edit;
pub mod embed;
pub mod get;
pub mod list;
pub mod search;
pub mod status;
pub mod summarize;
pub mod tags;

use colored::*;
use pkb::Content;

/// Body lines shown in list-style output (char-aware for Unicode)
const PREVIEW_CHARS: usize = 100;

/// `#12 [note] Title  #tag1 #tag2`
pub(crate) fn print_heading(content: &Content) {
    let tags: Vec<String> = content.tags.iter().map(|t| format!("#{t}")).collect();
    println!(
        "{} [{}] {}  {}",
        format!("#{}", content.id).bold(),
        content.content_type.to_string().yellow(),
        content.title.cyan(),
        tags.join(" ").dimmed()
    );
}

/// Heading plus a one-line body preview
pub(crate) fn print_summary(content: &Content) {
    print_heading(content);
    let preview = preview(&content.body);
    if !preview.is_empty() {
        println!("   {}", preview.dimmed());
    }
}

/// Every field, for single-record output
pub(crate) fn print_full(content: &Content) {
    print_heading(content);
    if let Some(ref url) = content.source_url {
        println!("   {} {}", "url:".dimmed(), url);
    }
    if let Some(ref path) = content.file_path {
        println!("   {} {}", "file:".dimmed(), path);
    }
    println!(
        "   {} {}   {} {}",
        "created:".dimmed(),
        content.created_at.format("%Y-%m-%d %H:%M:%S"),
        "updated:".dimmed(),
        content.updated_at.format("%Y-%m-%d %H:%M:%S")
    );
    if !content.body.is_empty() {
        println!();
        println!("{}", content.body);
    }
}

fn preview(body: &str) -> String {
    let line = body.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() > PREVIEW_CHARS {
        format!("{}...", line.chars().take(PREVIEW_CHARS).collect::<String>())
    } else {
        line.to_string()
    }
}
