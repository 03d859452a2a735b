use anyhow::Result;
use colored::*;

use pkb::KnowledgeBase;

pub fn run(kb: &KnowledgeBase, create: Option<&str>, counts: bool, json: bool) -> Result<()> {
    if let Some(name) = create {
        let tag = kb.create_tag(name)?;
        if json {
            println!("{}", serde_json::to_string_pretty(&tag)?);
        } else {
            println!("{} Tag {} (id {})", "✓".green(), tag.name.cyan(), tag.id);
        }
        return Ok(());
    }

    if counts {
        let usage = kb.tag_usage()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&usage)?);
            return Ok(());
        }

        println!("{}", "Tag Usage (sorted by count):".cyan().bold());
        println!("{}", "-".repeat(60));
        for u in &usage {
            let count_str = format!("{:>3}", u.count);
            let count_colored = if u.count >= 5 {
                count_str.green()
            } else if u.count >= 2 {
                count_str.yellow()
            } else {
                count_str.red()
            };
            println!("  {} × {}", count_colored, u.name);
        }

        let unused = usage.iter().filter(|u| u.count == 0).count();
        if unused > 0 {
            println!();
            println!("{}", format!("{unused} tags are not used by any content").yellow());
        }
        return Ok(());
    }

    let tags = kb.list_tags()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tags)?);
    } else if tags.is_empty() {
        println!("{} No tags", "→".dimmed());
    } else {
        for tag in &tags {
            println!("  {}", tag.name);
        }
    }
    Ok(())
}
