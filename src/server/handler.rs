use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, Content, GetPromptRequestParam, GetPromptResult,
        ListPromptsResult, ListToolsResult, PaginatedRequestParam, Prompt, PromptMessage,
        PromptMessageContent, PromptMessageRole, ServerInfo, Tool,
    },
    service::RequestContext,
    Error as McpError, ServerHandler,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::ThinkingServer;
use crate::core::types::ThoughtInput;

fn json_to_arc_map(value: Value) -> Arc<Map<String, Value>> {
    Arc::new(value.as_object().cloned().unwrap_or_default())
}

#[derive(Debug, Deserialize)]
struct EvaluateThoughtRequest {
    session_id: String,
    node_id: u64,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct ReadThoughtTreeRequest {
    session_id: String,
}

impl ServerHandler for ThinkingServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: Default::default(),
            capabilities: rmcp::model::ServerCapabilities {
                tools: Some(rmcp::model::ToolsCapability { list_changed: None }),
                prompts: Some(rmcp::model::PromptsCapability { list_changed: None }),
                ..Default::default()
            },
            server_info: rmcp::model::Implementation {
                name: "sequential-thinking-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "Guided reasoning server: maintains a tree of thoughts, scores paths with UCB1, \
                 and returns mode-dependent guidance toward continue/branch/backtrack/evaluate/conclude."
                    .into(),
            ),
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = vec![
            Tool {
                name: "sequentialthinking".into(),
                description: Some(
                    "Submit the next thought in a guided reasoning session and receive \
                     mode-dependent guidance on what to do next."
                        .into(),
                ),
                input_schema: json_to_arc_map(json!({
                    "type": "object",
                    "properties": {
                        "text": { "type": "string", "description": "The thought's text" },
                        "thought_number": { "type": "integer", "minimum": 1 },
                        "total_thoughts": { "type": "integer", "minimum": 1 },
                        "next_thought_needed": { "type": "boolean" },
                        "session_id": { "type": "string" },
                        "branch_id": { "type": "string" },
                        "branch_from_thought": { "type": "integer" },
                        "is_revision": { "type": "boolean" },
                        "revises_thought": { "type": "integer" },
                        "evaluation_score": { "type": "number" },
                        "tags": { "type": "array", "items": { "type": "string" } },
                        "confidence": { "type": "number" },
                        "mode": { "type": "string", "enum": ["fast", "expert", "deep"] }
                    },
                    "required": ["text", "thought_number", "total_thoughts", "next_thought_needed", "session_id"]
                })),
                annotations: None,
            },
            Tool {
                name: "evaluate_thought".into(),
                description: Some("Backpropagate an evaluation score onto a node in the thought tree.".into()),
                input_schema: json_to_arc_map(json!({
                    "type": "object",
                    "properties": {
                        "session_id": { "type": "string" },
                        "node_id": { "type": "integer" },
                        "value": { "type": "number", "minimum": 0.0, "maximum": 1.0 }
                    },
                    "required": ["session_id", "node_id", "value"]
                })),
                annotations: None,
            },
            Tool {
                name: "read_thought_tree".into(),
                description: Some("Return every node currently in a session's thought tree.".into()),
                input_schema: json_to_arc_map(json!({
                    "type": "object",
                    "properties": { "session_id": { "type": "string" } },
                    "required": ["session_id"]
                })),
                annotations: None,
            },
            Tool {
                name: "thinking_status".into(),
                description: Some("Report tracked session counts, store sizes, request/thought metrics, and the aggregate health rollup.".into()),
                input_schema: json_to_arc_map(json!({
                    "type": "object",
                    "properties": { "session_id": { "type": "string" } }
                })),
                annotations: None,
            },
        ];

        Ok(ListToolsResult { next_cursor: None, tools })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        info!("tool request: {}", request.name);
        debug!("tool arguments: {:?}", request.arguments);

        match request.name.as_ref() {
            "sequentialthinking" => {
                let input: ThoughtInput = if let Some(args) = request.arguments {
                    serde_json::from_value(Value::Object(args))
                        .map_err(|e| McpError::invalid_params(format!("invalid thought params: {e}"), None))?
                } else {
                    return Err(McpError::invalid_params("missing arguments for sequentialthinking", None));
                };

                match self.processor().process_thought(input) {
                    Ok(response) => {
                        let text = serde_json::to_string(&response)
                            .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;
                        Ok(CallToolResult {
                            content: vec![Content::text(text)],
                            is_error: Some(false),
                        })
                    }
                    Err(err) => {
                        error!("process_thought failed: {}", err);
                        let resp = err.to_response();
                        Ok(CallToolResult {
                            content: resp.content.into_iter().map(|c| Content::text(c.text)).collect(),
                            is_error: Some(resp.is_error),
                        })
                    }
                }
            }

            "evaluate_thought" => {
                let req: EvaluateThoughtRequest = if let Some(args) = request.arguments {
                    serde_json::from_value(Value::Object(args))
                        .map_err(|e| McpError::invalid_params(format!("invalid evaluate params: {e}"), None))?
                } else {
                    return Err(McpError::invalid_params("missing arguments for evaluate_thought", None));
                };

                match self.processor().evaluate(&req.session_id, req.node_id, req.value) {
                    Ok(response) => {
                        let text = serde_json::to_string(&response)
                            .map_err(|e| McpError::internal_error(format!("failed to serialize response: {e}"), None))?;
                        Ok(CallToolResult { content: vec![Content::text(text)], is_error: Some(false) })
                    }
                    Err(err) => {
                        let resp = err.to_response();
                        Ok(CallToolResult {
                            content: resp.content.into_iter().map(|c| Content::text(c.text)).collect(),
                            is_error: Some(resp.is_error),
                        })
                    }
                }
            }

            "read_thought_tree" => {
                let req: ReadThoughtTreeRequest = if let Some(args) = request.arguments {
                    serde_json::from_value(Value::Object(args))
                        .map_err(|e| McpError::invalid_params(format!("invalid read_thought_tree params: {e}"), None))?
                } else {
                    return Err(McpError::invalid_params("missing arguments for read_thought_tree", None));
                };

                match self.processor().read_tree(&req.session_id) {
                    Ok(nodes) => {
                        let text = serde_json::to_string(&nodes)
                            .map_err(|e| McpError::internal_error(format!("failed to serialize tree: {e}"), None))?;
                        Ok(CallToolResult { content: vec![Content::text(text)], is_error: Some(false) })
                    }
                    Err(err) => {
                        let resp = err.to_response();
                        Ok(CallToolResult {
                            content: resp.content.into_iter().map(|c| Content::text(c.text)).collect(),
                            is_error: Some(resp.is_error),
                        })
                    }
                }
            }

            "thinking_status" => {
                let processor = self.processor();
                let status = json!({
                    "tracked_sessions": processor.tracker().tracked_count(),
                    "active_sessions": processor.tracker().active_count(),
                    "session_stats": processor.tracker().stats(),
                    "history_len": processor.store().history_len(),
                    "branch_count": processor.store().branch_count(),
                    "metrics": processor.metrics_snapshot(),
                    "health": processor.health_report(),
                });
                let text = serde_json::to_string(&status)
                    .map_err(|e| McpError::internal_error(format!("failed to serialize status: {e}"), None))?;
                Ok(CallToolResult { content: vec![Content::text(text)], is_error: Some(false) })
            }

            _ => Err(McpError::invalid_params(format!("tool '{}' not found", request.name), None)),
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult {
            next_cursor: None,
            prompts: vec![Prompt {
                name: "think_through".into(),
                description: Some("Begin a guided reasoning session about a problem.".into()),
                arguments: None,
            }],
        })
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<rmcp::service::RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        let prompt_text = match request.name.as_ref() {
            "think_through" => {
                let problem = request
                    .arguments
                    .as_ref()
                    .and_then(|args| args.get("problem"))
                    .and_then(|v| v.as_str())
                    .unwrap_or("the given problem");
                format!("Begin step-by-step reasoning about: {problem}")
            }
            _ => return Err(McpError::invalid_params(format!("prompt '{}' not found", request.name), None)),
        };

        let message = PromptMessage {
            role: PromptMessageRole::User,
            content: PromptMessageContent::text(prompt_text),
        };

        Ok(GetPromptResult {
            description: None,
            messages: vec![message],
        })
    }
}
