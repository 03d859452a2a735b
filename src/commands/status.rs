use anyhow::Result;
use chrono::Local;
use colored::*;
use serde::Serialize;

use pkb::db::StoreStats;
use pkb::KnowledgeBase;

#[derive(Serialize)]
struct KnowledgeBaseStatus {
    timestamp: String,
    database: String,
    embedding_model: String,
    summarizer: bool,
    #[serde(flatten)]
    stats: StoreStats,
}

pub fn run(kb: &KnowledgeBase, json: bool) -> Result<()> {
    let status = KnowledgeBaseStatus {
        timestamp: Local::now().to_rfc3339(),
        database: kb.database().path().display().to_string(),
        embedding_model: kb.model_name().to_string(),
        summarizer: kb.can_summarize(),
        stats: kb.stats()?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print_status(&status);
    }
    Ok(())
}

fn print_status(status: &KnowledgeBaseStatus) {
    println!("{}", "Knowledge Base Status".bold());
    println!("{}", "=".repeat(50));
    println!();
    println!("Checked:  {}", status.timestamp);
    println!("Database: {}", status.database);
    println!();

    println!("{}", "Store".cyan());
    println!("{}", "-".repeat(30));
    println!("   {:<12} {:>6}", "Content", status.stats.content_count);
    println!("   {:<12} {:>6}", "Tags", status.stats.tag_count);
    println!("   {:<12} {:>6}", "Embeddings", status.stats.embedding_count);
    println!();

    println!("{}", "Generators".cyan());
    println!("{}", "-".repeat(30));
    println!("   {:<12} {}", "Embeddings", status.embedding_model);
    let summaries = if status.summarizer {
        "available".green()
    } else {
        "unavailable (set OPENAI_API_KEY)".yellow()
    };
    println!("   {:<12} {}", "Summaries", summaries);

    println!();
    println!("{}", "=".repeat(50));
}
