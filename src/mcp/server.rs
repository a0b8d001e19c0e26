//! MCP Server implementation for the pkb knowledge base
//!
//! Implements the Model Context Protocol (JSON-RPC 2.0) server directly
//! without external SDK dependencies, over stdio.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::tools::*;
use crate::config::Config;
use crate::core::{NewEntry, Pkb, Section};
use crate::remote::{GithubStore, RemoteStore};

/// JSON-RPC 2.0 Request
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Value, code: i64, message: String) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError { code, message }),
        }
    }
}

/// MCP Server handler
struct PkbMcpServer<S: RemoteStore> {
    service: Pkb<S>,
    initialized: bool,
}

impl<S: RemoteStore> PkbMcpServer<S> {
    fn new(service: Pkb<S>) -> Self {
        Self {
            service,
            initialized: false,
        }
    }

    /// Handle a JSON-RPC request
    async fn handle_request(&mut self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone().unwrap_or(Value::Null);

        // Notifications (no id) don't get responses
        if request.id.is_none() {
            match request.method.as_str() {
                "notifications/initialized" => {
                    self.initialized = true;
                    tracing::debug!("MCP client initialized");
                }
                "notifications/cancelled" => {
                    tracing::debug!("MCP request cancelled");
                }
                other => {
                    tracing::debug!(method = other, "unknown MCP notification");
                }
            }
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "tools/list" => self.handle_list_tools(&request.params),
            "tools/call" => self.handle_call_tool(&request.params).await,
            "ping" => Ok(json!({})),
            _ => Err((-32601, format!("Method not found: {}", request.method))),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(id, value),
            Err((code, msg)) => JsonRpcResponse::error(id, code, msg),
        })
    }

    fn handle_initialize(&self, _params: &Value) -> Result<Value, (i64, String)> {
        Ok(json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "serverInfo": {
                "name": "pkb",
                "version": env!("CARGO_PKG_VERSION")
            },
            "instructions": "pkb is a GitHub-backed personal knowledge base. Use search_pkb before answering questions - the answer might already be saved. Use add_til, add_prompt and add_pattern to save new knowledge."
        }))
    }

    fn handle_list_tools(&self, _params: &Value) -> Result<Value, (i64, String)> {
        Ok(json!({
            "tools": [
                {
                    "name": "add_til",
                    "description": "Create a 'Today I Learned' entry in the knowledge base. Example: add_til({\"title\": \"Fixed a flaky test\", \"content\": \"The test was timing-dependent...\", \"tags\": [\"testing\", \"ci\"]})",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "description": "Short descriptive title" },
                            "content": { "type": "string", "description": "Markdown body of the entry" },
                            "tags": { "type": "array", "items": { "type": "string" }, "description": "Tags for categorization" }
                        },
                        "required": ["title", "content"]
                    }
                },
                {
                    "name": "add_prompt",
                    "description": "Save a reusable prompt to the knowledge base, bucketed by category. Example: add_prompt({\"title\": \"Code Review\", \"content\": \"Review this diff for...\", \"category\": \"coding\"})",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "description": "Short name for the prompt" },
                            "content": { "type": "string", "description": "Full prompt text" },
                            "category": { "type": "string", "description": "Category bucket, e.g. coding, infrastructure, documentation" },
                            "tags": { "type": "array", "items": { "type": "string" }, "description": "Optional tags" }
                        },
                        "required": ["title", "content", "category"]
                    }
                },
                {
                    "name": "add_pattern",
                    "description": "Document a reusable pattern in the knowledge base, bucketed by category. Example: add_pattern({\"title\": \"Blue Green Deploy\", \"content\": \"## Problem\\n...\", \"category\": \"devops\", \"tags\": [\"deploy\"]})",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "description": "Short name for the pattern" },
                            "content": { "type": "string", "description": "Pattern description in Markdown" },
                            "category": { "type": "string", "description": "Category bucket, e.g. agent, cloud, devops" },
                            "tags": { "type": "array", "items": { "type": "string" }, "description": "Optional tags" }
                        },
                        "required": ["title", "content", "category"]
                    }
                },
                {
                    "name": "search_pkb",
                    "description": "Search the knowledge base by keyword across titles, tags and bodies. Results are ranked by occurrence count. Example: search_pkb({\"query\": \"flaky\"}) or search_pkb({\"query\": \"deploy\", \"sections\": [\"pattern\"]})",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "query": { "type": "string", "description": "Keyword to search for (case-insensitive)" },
                            "sections": { "type": "array", "items": { "type": "string", "enum": ["til", "prompt", "pattern"] }, "description": "Sections to search (default: all)" }
                        },
                        "required": ["query"]
                    }
                },
                {
                    "name": "list_entries",
                    "description": "List entries in a section of the knowledge base, newest first. Example: list_entries({\"section\": \"prompt\", \"category\": \"coding\"})",
                    "inputSchema": {
                        "type": "object",
                        "properties": {
                            "section": { "type": "string", "enum": ["til", "prompt", "pattern"], "description": "Section to list" },
                            "category": { "type": "string", "description": "Optional category filter (prompts/patterns only)" }
                        },
                        "required": ["section"]
                    }
                }
            ]
        }))
    }

    async fn handle_call_tool(&mut self, params: &Value) -> Result<Value, (i64, String)> {
        let name = params["name"]
            .as_str()
            .ok_or((-32602, "Missing tool name".to_string()))?;
        let arguments = &params["arguments"];

        let result = match name {
            "add_til" => self.do_add_til(arguments).await,
            "add_prompt" => self.do_add_prompt(arguments).await,
            "add_pattern" => self.do_add_pattern(arguments).await,
            "search_pkb" => self.do_search(arguments).await,
            "list_entries" => self.do_list(arguments).await,
            _ => Err(format!("Unknown tool: {}", name)),
        };

        match result {
            Ok(text) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": text
                }]
            })),
            Err(e) => Ok(json!({
                "content": [{
                    "type": "text",
                    "text": format!("Error: {}", e)
                }],
                "isError": true
            })),
        }
    }

    async fn do_add_til(&self, args: &Value) -> Result<String, String> {
        let tool_args: AddTilTool =
            serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))?;

        let outcome = self
            .service
            .add_entry(NewEntry {
                section: Section::Til,
                title: tool_args.title.clone(),
                body: tool_args.content,
                tags: tool_args.tags,
                category: None,
            })
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!(
            "TIL entry created: {}\n  Path: {}\n  Revision: {}",
            tool_args.title, outcome.path, outcome.version
        ))
    }

    async fn do_add_prompt(&self, args: &Value) -> Result<String, String> {
        let tool_args: AddPromptTool =
            serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))?;

        let outcome = self
            .service
            .add_entry(NewEntry {
                section: Section::Prompt,
                title: tool_args.title.clone(),
                body: tool_args.content,
                tags: tool_args.tags,
                category: Some(tool_args.category.clone()),
            })
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!(
            "Prompt saved: {} [{}]\n  Path: {}\n  Revision: {}",
            tool_args.title, tool_args.category, outcome.path, outcome.version
        ))
    }

    async fn do_add_pattern(&self, args: &Value) -> Result<String, String> {
        let tool_args: AddPatternTool =
            serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))?;

        let outcome = self
            .service
            .add_entry(NewEntry {
                section: Section::Pattern,
                title: tool_args.title.clone(),
                body: tool_args.content,
                tags: tool_args.tags,
                category: Some(tool_args.category.clone()),
            })
            .await
            .map_err(|e| e.to_string())?;

        Ok(format!(
            "Pattern documented: {} [{}]\n  Path: {}\n  Revision: {}",
            tool_args.title, tool_args.category, outcome.path, outcome.version
        ))
    }

    async fn do_search(&self, args: &Value) -> Result<String, String> {
        let tool_args: SearchPkbTool =
            serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))?;

        let sections = parse_sections(&tool_args.sections)?;
        let outcome = self
            .service
            .search(&tool_args.query, sections.as_deref())
            .await
            .map_err(|e| e.to_string())?;

        if outcome.results.is_empty() {
            let mut text = format!("No results found for '{}'.", tool_args.query);
            append_skipped_note(&mut text, &outcome.skipped);
            return Ok(text);
        }

        let mut text = format!(
            "Found {} result(s) for '{}':\n\n",
            outcome.results.len(),
            tool_args.query
        );
        for hit in &outcome.results {
            text.push_str(&format!(
                "## {} ({} match(es))\n**Path:** {}\n**Section:** {}\n{}\n\n---\n\n",
                hit.title, hit.score, hit.path, hit.section, hit.snippet
            ));
        }
        append_skipped_note(&mut text, &outcome.skipped);
        Ok(text)
    }

    async fn do_list(&self, args: &Value) -> Result<String, String> {
        let tool_args: ListEntriesTool =
            serde_json::from_value(args.clone()).map_err(|e| format!("Invalid params: {}", e))?;

        let section: Section = tool_args.section.parse().map_err(|e| format!("{}", e))?;
        let outcome = self
            .service
            .list_entries(section, tool_args.category.as_deref())
            .await
            .map_err(|e| e.to_string())?;

        if outcome.entries.is_empty() {
            let mut text = format!("No entries yet in section '{}'.", section);
            append_skipped_note(&mut text, &outcome.skipped);
            return Ok(text);
        }

        let mut text = format!("{} entr(y/ies) in '{}':\n\n", outcome.entries.len(), section);
        for entry in &outcome.entries {
            text.push_str(&format!(
                "- **{}**\n  Path: {}\n  Created: {}\n",
                entry.title,
                entry.path,
                entry.created_at.format("%Y-%m-%d")
            ));
            if let Some(category) = &entry.category {
                text.push_str(&format!("  Category: {}\n", category));
            }
            if !entry.tags.is_empty() {
                let tags: Vec<&str> = entry.tags.iter().map(|t| t.as_str()).collect();
                text.push_str(&format!("  Tags: {}\n", tags.join(", ")));
            }
        }
        append_skipped_note(&mut text, &outcome.skipped);
        Ok(text)
    }
}

/// Parse tool-supplied section names; empty means all
fn parse_sections(names: &[String]) -> Result<Option<Vec<Section>>, String> {
    if names.is_empty() {
        return Ok(None);
    }
    let mut sections = Vec::with_capacity(names.len());
    for name in names {
        sections.push(name.parse::<Section>().map_err(|e| format!("{}", e))?);
    }
    Ok(Some(sections))
}

/// Note unreadable entries without failing the whole call
fn append_skipped_note(text: &mut String, skipped: &[String]) {
    if !skipped.is_empty() {
        text.push_str(&format!(
            "\nNote: skipped {} unreadable entr(y/ies): {}\n",
            skipped.len(),
            skipped.join(", ")
        ));
    }
}

/// Run the MCP server with STDIO transport
pub async fn run_mcp_server(config: &Config) -> anyhow::Result<()> {
    tracing::info!("pkb MCP server starting");

    let store = GithubStore::from_config(&config.store)?;
    let mut server = PkbMcpServer::new(Pkb::new(store));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let request: JsonRpcRequest = match serde_json::from_str(&line) {
            Ok(req) => req,
            Err(e) => {
                let response =
                    JsonRpcResponse::error(Value::Null, -32700, format!("Parse error: {}", e));
                let json = serde_json::to_string(&response)?;
                stdout.write_all(json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
                continue;
            }
        };

        if let Some(response) = server.handle_request(&request).await {
            let json = serde_json::to_string(&response)?;
            stdout.write_all(json.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("pkb MCP server stopping");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::remote::MemoryStore;

    use super::*;

    fn server() -> PkbMcpServer<MemoryStore> {
        PkbMcpServer::new(Pkb::new(MemoryStore::new()))
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[tokio::test]
    async fn test_initialize() {
        let mut srv = server();
        let resp = srv
            .handle_request(&request("initialize", json!({})))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "pkb");
    }

    #[tokio::test]
    async fn test_tools_list_names() {
        let mut srv = server();
        let resp = srv
            .handle_request(&request("tools/list", json!({})))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["add_til", "add_prompt", "add_pattern", "search_pkb", "list_entries"]
        );
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let mut srv = server();
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: json!({}),
        };
        assert!(srv.handle_request(&notification).await.is_none());
        assert!(srv.initialized);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let mut srv = server();
        let resp = srv
            .handle_request(&request("bogus/method", json!({})))
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_add_and_search_through_tools() {
        let mut srv = server();

        let resp = srv
            .handle_request(&request(
                "tools/call",
                json!({
                    "name": "add_til",
                    "arguments": {
                        "title": "Fixed a flaky test",
                        "content": "The test was timing-dependent.",
                        "tags": ["testing", "ci"]
                    }
                }),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert!(result.get("isError").is_none());
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("TIL entry created"));

        let resp = srv
            .handle_request(&request(
                "tools/call",
                json!({ "name": "search_pkb", "arguments": { "query": "flaky" } }),
            ))
            .await
            .unwrap();
        let result = resp.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Found 1 result(s)"));
        assert!(text.contains("fixed-a-flaky-test.md"));
    }

    #[tokio::test]
    async fn test_tool_error_is_not_protocol_error() {
        let mut srv = server();
        let resp = srv
            .handle_request(&request(
                "tools/call",
                json!({ "name": "add_til", "arguments": { "title": "", "content": "x" } }),
            ))
            .await
            .unwrap();
        // Validation failures come back as tool results, not JSON-RPC errors
        let result = resp.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("title"));
    }

    #[test]
    fn test_parse_sections() {
        assert!(parse_sections(&[]).unwrap().is_none());
        let parsed = parse_sections(&["til".to_string(), "patterns".to_string()])
            .unwrap()
            .unwrap();
        assert_eq!(parsed, vec![Section::Til, Section::Pattern]);
        assert!(parse_sections(&["bogus".to_string()]).is_err());
    }
}
