//! Knowledge base MCP server implementation

use anyhow::Result;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_router, ErrorData as McpError, ServerHandler, ServiceExt,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use pkb::{ContentDraft, ContentType, KnowledgeBase, SearchQuery};

/// Parameters for kb_create and kb_update
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DraftParams {
    #[schemars(description = "Content type: note, snippet, bookmark, document")]
    #[serde(rename = "type", default = "default_type")]
    pub content_type: String,
    #[schemars(description = "Title (required, non-blank)")]
    pub title: String,
    #[schemars(description = "Body text; this is what gets embedded")]
    #[serde(default)]
    pub body: String,
    #[schemars(description = "Source URL")]
    #[serde(default)]
    pub source_url: Option<String>,
    #[schemars(description = "Path of the file the body came from")]
    #[serde(default)]
    pub file_path: Option<String>,
    #[schemars(description = "Tags; on update this replaces the whole tag set")]
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_type() -> String {
    "note".to_string()
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateParams {
    #[schemars(description = "Content id")]
    pub id: i64,
    #[serde(flatten)]
    pub draft: DraftParams,
}

/// Parameters for tools addressing one record
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdParams {
    #[schemars(description = "Content id")]
    pub id: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListParams {
    #[schemars(description = "Filter by type: note, snippet, bookmark, document")]
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    #[serde(default)]
    pub limit: i64,
    #[schemars(description = "Results to skip (default: 0)")]
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Free-text query (e.g., "sqlite vector storage")
    #[schemars(description = "Search query")]
    pub query: String,
    #[schemars(description = "Rank by embedding similarity instead of substring match")]
    #[serde(default)]
    pub semantic: bool,
    #[schemars(description = "Filter by type: note, snippet, bookmark, document")]
    #[serde(rename = "type", default)]
    pub content_type: Option<String>,
    #[schemars(description = "Results must carry every one of these tags")]
    #[serde(default)]
    pub tags: Vec<String>,
    #[schemars(description = "Maximum results (default: 10)")]
    #[serde(default)]
    pub limit: i64,
    #[schemars(description = "Results to skip (default: 0)")]
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTagParams {
    #[schemars(description = "Tag name")]
    pub name: String,
}

#[derive(Debug, Serialize)]
struct SummaryJson {
    id: i64,
    summary: String,
}

/// Knowledge base MCP service
#[derive(Clone)]
pub struct KnowledgeService {
    kb: KnowledgeBase,
    tool_router: ToolRouter<Self>,
}

impl KnowledgeService {
    pub fn new(kb: KnowledgeBase) -> Self {
        Self {
            kb,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl KnowledgeService {
    #[tool(description = "Store a new content record (note, snippet, bookmark or document) with tags. Its embedding is generated in the background.")]
    async fn kb_create(&self, params: Parameters<DraftParams>) -> Result<CallToolResult, McpError> {
        let draft = into_draft(params.0)?;
        let content = self.kb.create_content(draft).await.map_err(to_mcp_error)?;
        json_result(&content)
    }

    #[tool(description = "Get one content record with its tags.")]
    async fn kb_get(&self, params: Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let content = self.kb.get_content(params.0.id).map_err(to_mcp_error)?;
        json_result(&content)
    }

    #[tool(description = "List content records, newest first, optionally filtered by type.")]
    async fn kb_list(&self, params: Parameters<ListParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let content_type = parse_type(params.content_type.as_deref())?;
        let contents = self
            .kb
            .list_content(content_type, params.limit, params.offset)
            .map_err(to_mcp_error)?;
        json_result(&contents)
    }

    #[tool(description = "Replace every field and the tag set of a content record. Its embedding is refreshed in the background.")]
    async fn kb_update(&self, params: Parameters<UpdateParams>) -> Result<CallToolResult, McpError> {
        let UpdateParams { id, draft } = params.0;
        let draft = into_draft(draft)?;
        let content = self.kb.update_content(id, draft).await.map_err(to_mcp_error)?;
        json_result(&content)
    }

    #[tool(description = "Delete a content record together with its tag links and embeddings.")]
    async fn kb_delete(&self, params: Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let id = params.0.id;
        self.kb.delete_content(id).map_err(to_mcp_error)?;
        json_result(&json!({ "deleted": id }))
    }

    #[tool(description = "Generate and store the embedding of a content record now, waiting for the result.")]
    async fn kb_embed(&self, params: Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let receipt = self.kb.generate_embedding(params.0.id).await.map_err(to_mcp_error)?;
        json_result(&receipt)
    }

    #[tool(description = "Search the knowledge base. Keyword mode matches title or body substrings (case-insensitive), newest first. Semantic mode ranks by embedding similarity and returns a score.")]
    async fn kb_search(&self, params: Parameters<SearchParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let query = SearchQuery {
            query: params.query,
            content_type: parse_type(params.content_type.as_deref())?,
            tags: params.tags,
            limit: params.limit,
            offset: params.offset,
            semantic: params.semantic,
        };
        let results = self.kb.search(&query).await.map_err(to_mcp_error)?;
        json_result(&results)
    }

    #[tool(description = "Summarize the body of a content record in a few sentences.")]
    async fn kb_summarize(&self, params: Parameters<IdParams>) -> Result<CallToolResult, McpError> {
        let id = params.0.id;
        let summary = self.kb.summarize(id).await.map_err(to_mcp_error)?;
        json_result(&SummaryJson { id, summary })
    }

    #[tool(description = "List every tag (id, name) with the number of content records carrying it.")]
    async fn kb_list_tags(&self) -> Result<CallToolResult, McpError> {
        let usage = self.kb.tag_usage().map_err(to_mcp_error)?;
        json_result(&usage)
    }

    #[tool(description = "Create a tag. Creating an existing name returns the existing tag.")]
    async fn kb_create_tag(&self, params: Parameters<CreateTagParams>) -> Result<CallToolResult, McpError> {
        let tag = self.kb.create_tag(&params.0.name).map_err(to_mcp_error)?;
        json_result(&tag)
    }
}

#[rmcp::tool_handler]
impl ServerHandler for KnowledgeService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Personal knowledge base. Use kb_search to find content by keyword or meaning, kb_create to store new content.".to_string(),
            ),
            ..Default::default()
        }
    }
}

fn parse_type(value: Option<&str>) -> Result<Option<ContentType>, McpError> {
    value
        .map(|v| v.parse::<ContentType>())
        .transpose()
        .map_err(|e| McpError::invalid_params(e.to_string(), None))
}

fn into_draft(params: DraftParams) -> Result<ContentDraft, McpError> {
    let content_type = params
        .content_type
        .parse::<ContentType>()
        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;
    Ok(ContentDraft {
        content_type,
        title: params.title,
        body: params.body,
        source_url: params.source_url,
        file_path: params.file_path,
        tags: params.tags,
    })
}

fn json_result<T: Serialize + ?Sized>(value: &T) -> Result<CallToolResult, McpError> {
    let output = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("JSON serialization failed: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(output)]))
}

/// Caller mistakes become invalid_params; everything else is internal
fn to_mcp_error(err: pkb::Error) -> McpError {
    let data = Some(json!({ "error": err.to_string() }));
    match err {
        pkb::Error::NotFound { .. } | pkb::Error::Validation(_) => McpError::invalid_params(err.to_string(), data),
        _ => McpError::internal_error(err.to_string(), data),
    }
}

/// Run the MCP server over stdio until the client disconnects
pub async fn run_mcp_server(kb: KnowledgeBase) -> Result<()> {
    use tokio::io::{stdin, stdout};

    info!(database = %kb.database().path().display(), model = kb.model_name(), "starting MCP server");

    let service = KnowledgeService::new(kb);
    let transport = (stdin(), stdout());
    let server = service.serve(transport).await?;
    server.waiting().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use pkb::generator::HarmonicEmbedder;
    use pkb::Database;
    use tempfile::TempDir;

    fn service() -> (TempDir, KnowledgeService) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("kb.db")).unwrap();
        let kb = KnowledgeBase::new(db, Arc::new(HarmonicEmbedder::new()), None, Duration::from_secs(5));
        (dir, KnowledgeService::new(kb))
    }

    fn text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|c| c.as_text())
            .map(|t| t.text.clone())
            .collect()
    }

    fn draft(title: &str, body: &str, tags: &[&str]) -> DraftParams {
        DraftParams {
            content_type: "snippet".to_string(),
            title: title.to_string(),
            body: body.to_string(),
            source_url: None,
            file_path: None,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_create_then_search() {
        let (_dir, service) = service();
        let created = service
            .kb_create(Parameters(draft("Rust tips", "Prefer iterators over loops", &["rust"])))
            .await
            .unwrap();
        let created: serde_json::Value = serde_json::from_str(&text(&created)).unwrap();
        assert_eq!(created["type"], "snippet");
        assert_eq!(created["tags"], json!(["rust"]));

        let found = service
            .kb_search(Parameters(SearchParams {
                query: "ITERATORS".to_string(),
                semantic: false,
                content_type: None,
                tags: vec!["rust".to_string()],
                limit: 0,
                offset: 0,
            }))
            .await
            .unwrap();
        let found: serde_json::Value = serde_json::from_str(&text(&found)).unwrap();
        assert_eq!(found.as_array().map(Vec::len), Some(1));
        assert_eq!(found[0]["content"]["id"], created["id"]);

        service.kb.wait_for_background().await;
    }

    #[tokio::test]
    async fn test_unknown_type_is_invalid_params() {
        let (_dir, service) = service();
        let err = service
            .kb_list(Parameters(ListParams {
                content_type: Some("poem".to_string()),
                limit: 0,
                offset: 0,
            }))
            .await
            .unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_missing_content_is_invalid_params() {
        let (_dir, service) = service();
        let err = service.kb_get(Parameters(IdParams { id: 404 })).await.unwrap_err();
        assert_eq!(err.code, rmcp::model::ErrorCode::INVALID_PARAMS);
        assert!(err.message.contains("not found"));
    }

    #[tokio::test]
    async fn test_list_tags_carries_ids() {
        let (_dir, service) = service();
        service
            .kb_create(Parameters(draft("tagged", "body", &["rust"])))
            .await
            .unwrap();
        let created = service
            .kb_create_tag(Parameters(CreateTagParams { name: "idle".to_string() }))
            .await
            .unwrap();
        let created: serde_json::Value = serde_json::from_str(&text(&created)).unwrap();

        let listed = service.kb_list_tags().await.unwrap();
        let listed: serde_json::Value = serde_json::from_str(&text(&listed)).unwrap();
        assert_eq!(listed[0]["name"], "rust");
        assert_eq!(listed[0]["count"], 1);
        assert!(listed[0]["id"].is_i64());
        assert_eq!(listed[1], json!({ "id": created["id"], "name": "idle", "count": 0 }));

        service.kb.wait_for_background().await;
    }
}
