//! MCP (JSON-RPC) tool-call surface — thin translation onto the store and
//! the engine, mirroring the REST routes tool-for-route.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chronod_store::{NewTask, StoreError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// POST /mcp — single-endpoint JSON-RPC dispatch.
pub async fn mcp_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RpcRequest>,
) -> Response {
    match req.method.as_str() {
        "initialize" => rpc_result(
            &req.id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": {} },
                "serverInfo": { "name": "chronod", "version": env!("CARGO_PKG_VERSION") },
            }),
        )
        .into_response(),

        "notifications/initialized" => StatusCode::NO_CONTENT.into_response(),

        "tools/list" => {
            rpc_result(&req.id, json!({ "tools": tool_definitions() })).into_response()
        }

        "tools/call" => {
            let name = req
                .params
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let args = req
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match call_tool(&state, &name, &args).await {
                Ok(content) => {
                    rpc_result(&req.id, json!({ "content": content })).into_response()
                }
                Err(ToolError::Unknown) => {
                    (StatusCode::NOT_FOUND, "Unknown tool").into_response()
                }
                Err(ToolError::Failed(message)) => rpc_result(
                    &req.id,
                    json!({
                        "isError": true,
                        "content": [{ "type": "text", "text": message }],
                    }),
                )
                .into_response(),
            }
        }

        _ => rpc_error(&req.id, -32601, "Method not found").into_response(),
    }
}

fn rpc_result(id: &Value, result: Value) -> Json<Value> {
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

fn rpc_error(id: &Value, code: i64, message: &str) -> Json<Value> {
    Json(json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    }))
}

/// The advertised tool set. Kept in one place so tools/list can never drift
/// from the dispatch below.
fn tool_definitions() -> Value {
    json!([
        {
            "name": "list_tasks",
            "description": "List all scheduled cron tasks",
            "inputSchema": { "type": "object", "properties": {} },
        },
        {
            "name": "create_task",
            "description": "Create a new cron task",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "name":     { "type": "string" },
                    "schedule": { "type": "string", "description": "Standard cron expression (e.g. * * * * *)" },
                    "command":  { "type": "string" },
                    "enabled":  { "type": "boolean" },
                    "one_shot": { "type": "boolean" },
                },
                "required": ["name", "schedule", "command"],
            },
        },
        {
            "name": "update_task",
            "description": "Update a cron task by ID. Supports partial updates, including command changes.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "id":       { "type": "integer" },
                    "name":     { "type": "string" },
                    "schedule": { "type": "string", "description": "Standard cron expression (e.g. * * * * *)" },
                    "command":  { "type": "string" },
                    "enabled":  { "type": "boolean" },
                    "one_shot": { "type": "boolean" },
                },
                "required": ["id"],
            },
        },
        {
            "name": "delete_task",
            "description": "Delete a cron task by ID",
            "inputSchema": {
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"],
            },
        },
        {
            "name": "run_task",
            "description": "Run a task immediately by ID",
            "inputSchema": {
                "type": "object",
                "properties": { "id": { "type": "integer" } },
                "required": ["id"],
            },
        },
    ])
}

#[derive(Debug)]
enum ToolError {
    /// The tool name is not part of the advertised set.
    Unknown,
    /// The tool ran but the operation failed; reported inside the result.
    Failed(String),
}

async fn call_tool(state: &AppState, name: &str, args: &Value) -> Result<Vec<Value>, ToolError> {
    match name {
        "list_tasks" => {
            let tasks = state.store.get_tasks().map_err(fail)?;
            let data = serde_json::to_string(&tasks).map_err(fail)?;
            Ok(vec![text_content(data)])
        }

        "create_task" => {
            let new = NewTask {
                name: require_str(args, "name")?,
                schedule: require_str(args, "schedule")?,
                command: require_str(args, "command")?,
                // Unlike the REST decode, a tool call without `enabled`
                // means "schedule it".
                enabled: args.get("enabled").and_then(Value::as_bool).unwrap_or(true),
                one_shot: args
                    .get("one_shot")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            };
            let task = state.store.create_task(new).map_err(fail)?;
            state.engine.reload();
            let data = serde_json::to_string(&task).map_err(fail)?;
            Ok(vec![text_content(format!("Task created: {data}"))])
        }

        "update_task" => {
            let id = require_id(args)?;
            let mut task = state.store.get_task_by_id(id).map_err(|e| match e {
                StoreError::NotFound { id } => ToolError::Failed(format!("task {id} not found")),
                other => fail(other),
            })?;

            let mut updated = false;
            if let Some(v) = args.get("name").and_then(Value::as_str) {
                task.name = v.to_string();
                updated = true;
            }
            if let Some(v) = args.get("schedule").and_then(Value::as_str) {
                task.schedule = v.to_string();
                updated = true;
            }
            if let Some(v) = args.get("command").and_then(Value::as_str) {
                task.command = v.to_string();
                updated = true;
            }
            if let Some(v) = args.get("enabled").and_then(Value::as_bool) {
                task.enabled = v;
                updated = true;
            }
            if let Some(v) = args.get("one_shot").and_then(Value::as_bool) {
                task.one_shot = v;
                updated = true;
            }
            if !updated {
                return Err(ToolError::Failed(
                    "at least one field to update is required".to_string(),
                ));
            }

            state.store.update_task(&task).map_err(fail)?;
            state.engine.reload();
            let data = serde_json::to_string(&task).map_err(fail)?;
            Ok(vec![text_content(format!("Task updated: {data}"))])
        }

        "delete_task" => {
            let id = require_id(args)?;
            state.store.delete_task(id).map_err(fail)?;
            state.engine.reload();
            Ok(vec![text_content("Task deleted successfully".to_string())])
        }

        "run_task" => {
            let id = require_id(args)?;
            state
                .engine
                .run_task_now(id)
                .await
                .map_err(|e| ToolError::Failed(e.to_string()))?;
            Ok(vec![text_content(format!("Task {id} executed"))])
        }

        _ => Err(ToolError::Unknown),
    }
}

fn text_content(text: String) -> Value {
    json!({ "type": "text", "text": text })
}

fn fail<E: std::fmt::Display>(e: E) -> ToolError {
    ToolError::Failed(e.to_string())
}

fn require_str(args: &Value, key: &str) -> Result<String, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ToolError::Failed(format!("missing required field: {key}")))
}

/// Accept both integer and float ids — JSON clients routinely send either.
fn require_id(args: &Value) -> Result<i64, ToolError> {
    let id = args.get("id");
    id.and_then(Value::as_i64)
        .or_else(|| id.and_then(Value::as_f64).map(|f| f as i64))
        .ok_or_else(|| ToolError::Failed("missing required field: id".to_string()))
}
