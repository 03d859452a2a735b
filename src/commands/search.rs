//! Search command - keyword or semantic retrieval

use anyhow::Result;
use colored::*;

use pkb::{KnowledgeBase, SearchQuery};

pub async fn run(kb: &KnowledgeBase, query: &SearchQuery, json: bool) -> Result<()> {
    let results = kb.search(query).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    let mode = if query.semantic {
        format!("semantic, {}", kb.model_name())
    } else {
        "keyword".to_string()
    };

    if results.is_empty() {
        println!(
            "{} No results found for: {} ({})",
            "→".dimmed(),
            query.query.cyan(),
            mode.dimmed()
        );
        return Ok(());
    }

    println!(
        "{} {} results for: {} ({})",
        "→".dimmed(),
        results.len(),
        query.query.cyan(),
        mode.dimmed()
    );
    println!();

    for (i, result) in results.iter().enumerate() {
        let rank = (query.offset.max(0) as usize + i + 1).to_string();
        match result.score {
            Some(score) => {
                let score_str = format!("{score:.2}");
                let score_colored = if score > 0.8 {
                    score_str.green()
                } else if score > 0.6 {
                    score_str.yellow()
                } else {
                    score_str.dimmed()
                };
                print!("{}. [{}] ", rank.bold(), score_colored);
            }
            None => print!("{}. ", rank.bold()),
        }
        super::print_heading(&result.content);

        if !result.snippet.is_empty() {
            println!("   {}", result.snippet.replace('\n', " ").dimmed());
        }
        println!();
    }

    Ok(())
}
