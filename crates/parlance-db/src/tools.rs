//! Tool declarations for the model and dispatch of its tool calls.

use std::sync::Arc;

use parlance_llm::ToolSpec;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::catalog::Catalog;
use crate::client::DatabaseClient;
use crate::error::DbError;
use crate::queries::{self, QueryLimits};
use crate::query::FilterOp;

pub const SEARCH_RECORDS: &str = "search_records";
pub const COUNT_RECORDS: &str = "count_records";
pub const AGGREGATE_RECORDS: &str = "aggregate_records";
pub const RUN_SELECT_QUERY: &str = "run_select_query";

/// Result of one tool call, ready to be sent back as a `tool` message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// JSON-encoded result or `{"error": …}` object.
    pub content: String,
    pub is_error: bool,
}

/// The query tools bound to one database and catalog.
pub struct QueryTools {
    db: Arc<dyn DatabaseClient>,
    catalog: Catalog,
    limits: QueryLimits,
    sql_function: String,
}

impl QueryTools {
    pub fn new(
        db: Arc<dyn DatabaseClient>,
        catalog: Catalog,
        max_rows: u32,
        sql_function: impl Into<String>,
    ) -> Self {
        Self {
            db,
            catalog,
            limits: QueryLimits { max_rows },
            sql_function: sql_function.into(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Declarations of all four tools, with JSON Schemas for their arguments.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let tables: Vec<&str> = self.catalog.names();
        let filter_schema = json!({
            "type": "array",
            "description": "Row conditions, all of which must hold (WHERE … AND …).",
            "items": {
                "type": "object",
                "properties": {
                    "column": { "type": "string" },
                    "op": { "type": "string", "enum": FilterOp::ALL },
                    "value": {
                        "description": "Comparison value. Array for 'in'; null/true/false for 'is'; use % as wildcard for like/ilike."
                    }
                },
                "required": ["column", "op", "value"]
            }
        });
        let order_schema = json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "column": { "type": "string" },
                    "ascending": { "type": "boolean", "default": true }
                },
                "required": ["column"]
            }
        });
        let limit_schema = json!({
            "type": "integer",
            "minimum": 1,
            "maximum": self.limits.max_rows,
        });

        vec![
            ToolSpec {
                name: SEARCH_RECORDS.to_string(),
                description: "Fetch rows from one table or view with optional filters, ordering, and a row limit.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "table": { "type": "string", "enum": tables },
                        "columns": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Columns to return. Omit for all columns."
                        },
                        "filters": filter_schema,
                        "order_by": order_schema,
                        "limit": limit_schema,
                    },
                    "required": ["table"]
                }),
            },
            ToolSpec {
                name: COUNT_RECORDS.to_string(),
                description: "Count the rows of one table or view that match optional filters.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "table": { "type": "string", "enum": tables },
                        "filters": filter_schema,
                    },
                    "required": ["table"]
                }),
            },
            ToolSpec {
                name: AGGREGATE_RECORDS.to_string(),
                description: "Group rows of one table or view and compute count, sum, avg, min, or max per group.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "table": { "type": "string", "enum": tables },
                        "group_by": {
                            "type": "array",
                            "items": { "type": "string" },
                            "description": "Grouping columns. Omit for a single overall aggregate."
                        },
                        "aggregates": {
                            "type": "array",
                            "minItems": 1,
                            "items": {
                                "type": "object",
                                "properties": {
                                    "function": { "type": "string", "enum": ["count", "sum", "avg", "min", "max"] },
                                    "column": { "type": "string", "description": "Omit only for count." }
                                },
                                "required": ["function"]
                            }
                        },
                        "filters": filter_schema,
                        "order_by": order_schema,
                        "limit": limit_schema,
                    },
                    "required": ["table", "aggregates"]
                }),
            },
            ToolSpec {
                name: RUN_SELECT_QUERY.to_string(),
                description: "Run one read-only SQL statement (SELECT or WITH … SELECT, joins allowed) and return its rows. Use when the other tools cannot express the question.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "A single SELECT statement." }
                    },
                    "required": ["query"]
                }),
            },
        ]
    }

    /// Execute the tool `name` with JSON-encoded `arguments`.
    ///
    /// Never fails: errors are logged and returned to the model as an
    /// `{"error": …}` object.
    pub async fn dispatch(&self, name: &str, arguments: &str) -> ToolOutput {
        match self.execute(name, arguments).await {
            Ok(value) => {
                tracing::debug!(tool = %name, "Tool call succeeded");
                ToolOutput {
                    content: value.to_string(),
                    is_error: false,
                }
            }
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool call failed");
                ToolOutput {
                    content: json!({ "error": e.to_string() }).to_string(),
                    is_error: true,
                }
            }
        }
    }

    async fn execute(&self, name: &str, arguments: &str) -> Result<Value, DbError> {
        let db = self.db.as_ref();
        match name {
            SEARCH_RECORDS => {
                queries::search_records(db, &self.catalog, &self.limits, parse_args(arguments)?)
                    .await
            }
            COUNT_RECORDS => {
                queries::count_records(db, &self.catalog, parse_args(arguments)?).await
            }
            AGGREGATE_RECORDS => {
                queries::aggregate_records(db, &self.catalog, &self.limits, parse_args(arguments)?)
                    .await
            }
            RUN_SELECT_QUERY => {
                queries::run_select_query(
                    db,
                    &self.sql_function,
                    &self.limits,
                    parse_args(arguments)?,
                )
                .await
            }
            other => Err(DbError::UnknownTool(other.to_string())),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: &str) -> Result<T, DbError> {
    let arguments = if arguments.trim().is_empty() {
        "{}"
    } else {
        arguments
    };
    serde_json::from_str(arguments)
        .map_err(|e| DbError::InvalidArgument(format!("malformed tool arguments: {}", e)))
}
