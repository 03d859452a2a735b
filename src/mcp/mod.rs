//! MCP Server for the knowledge base
//!
//! Exposes content CRUD, search, embedding and summarization as MCP tools over
//! stdio.

mod server;

pub use server::run_mcp_server;

use colored::Colorize;
use pkb::Config;

/// Print the client configuration snippet for this binary and database
pub fn print_mcp_install_instructions(config: &Config) {
    let binary_path = std::env::current_exe()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| "pkb".to_string());
    let database = config.paths.database.display();

    println!("{}", "MCP Server Installation Guide".bold().cyan());
    println!();
    println!("Add the following to your Claude configuration:");
    println!();
    println!("{}", "For Claude Desktop (~/.config/claude/claude_desktop_config.json):".dimmed());
    println!(
        r#"{{
  "mcpServers": {{
    "pkb": {{
      "command": "{binary_path}",
      "args": ["--db", "{database}", "mcp"]
    }}
  }}
}}"#
    );
    println!();
    println!("Set OPENAI_API_KEY in the server environment for OpenAI embeddings and summaries.");
    println!();
    println!("{}", "Available tools:".bold());
    println!("  • {} - Store new content", "kb_create".green());
    println!("  • {} - Get one record", "kb_get".green());
    println!("  • {} - List records, newest first", "kb_list".green());
    println!("  • {} - Replace a record", "kb_update".green());
    println!("  • {} - Delete a record", "kb_delete".green());
    println!("  • {} - Embed a record now", "kb_embed".green());
    println!("  • {} - Keyword or semantic search", "kb_search".green());
    println!("  • {} - Summarize a record", "kb_summarize".green());
    println!("  • {} - Tags with usage counts", "kb_list_tags".green());
    println!("  • {} - Create a tag", "kb_create_tag".green());
}
