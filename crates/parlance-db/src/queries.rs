//! The four query helpers exposed to the model as tools.
//!
//! Each helper checks its table against the catalog, clamps row limits, issues
//! one request through the [`DatabaseClient`], and shapes the rows into a
//! small JSON object for the model.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::Catalog;
use crate::client::DatabaseClient;
use crate::error::DbError;
use crate::query::{Aggregate, Filter, OrderBy, SelectQuery};

/// Limits shared by all helpers.
#[derive(Debug, Clone)]
pub struct QueryLimits {
    pub max_rows: u32,
}

impl QueryLimits {
    fn clamp(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.max_rows).min(self.max_rows).max(1)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub table: String,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountArgs {
    pub table: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AggregateArgs {
    pub table: String,
    #[serde(default)]
    pub group_by: Vec<String>,
    pub aggregates: Vec<Aggregate>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SqlArgs {
    pub query: String,
}

/// `SELECT columns FROM table WHERE … ORDER BY … LIMIT n`.
pub async fn search_records(
    db: &dyn DatabaseClient,
    catalog: &Catalog,
    limits: &QueryLimits,
    args: SearchArgs,
) -> Result<Value, DbError> {
    catalog.require(&args.table)?;
    let query = SelectQuery {
        table: args.table,
        columns: args.columns,
        aggregates: Vec::new(),
        filters: args.filters,
        order: args.order_by,
        limit: Some(limits.clamp(args.limit)),
    };
    let rows = db.select(&query).await?;
    Ok(json!({
        "table": query.table,
        "row_count": rows.len(),
        "rows": rows,
    }))
}

/// `SELECT count(*) FROM table WHERE …`.
pub async fn count_records(
    db: &dyn DatabaseClient,
    catalog: &Catalog,
    args: CountArgs,
) -> Result<Value, DbError> {
    catalog.require(&args.table)?;
    // Validate filters before going to the network.
    for filter in &args.filters {
        filter.to_pair()?;
    }
    let count = db.count(&args.table, &args.filters).await?;
    Ok(json!({
        "table": args.table,
        "count": count,
    }))
}

/// `SELECT group_by, agg(column) FROM table WHERE … GROUP BY group_by`.
pub async fn aggregate_records(
    db: &dyn DatabaseClient,
    catalog: &Catalog,
    limits: &QueryLimits,
    args: AggregateArgs,
) -> Result<Value, DbError> {
    catalog.require(&args.table)?;
    if args.aggregates.is_empty() {
        return Err(DbError::InvalidArgument(
            "at least one aggregate is required".to_string(),
        ));
    }
    let mut aliases = HashSet::new();
    for aggregate in &args.aggregates {
        let alias = aggregate.alias();
        if !aliases.insert(alias.clone()) {
            return Err(DbError::InvalidArgument(format!(
                "duplicate aggregate '{}'",
                alias
            )));
        }
    }
    let query = SelectQuery {
        table: args.table,
        columns: args.group_by,
        aggregates: args.aggregates,
        filters: args.filters,
        order: args.order_by,
        limit: Some(limits.clamp(args.limit)),
    };
    let rows = db.select(&query).await?;
    Ok(json!({
        "table": query.table,
        "group_by": query.columns,
        "row_count": rows.len(),
        "rows": rows,
    }))
}

/// Send a read-only SQL string to the server-side SQL function.
///
/// The statement text is passed through unchanged; only the result size is
/// capped here.
pub async fn run_select_query(
    db: &dyn DatabaseClient,
    sql_function: &str,
    limits: &QueryLimits,
    args: SqlArgs,
) -> Result<Value, DbError> {
    let sql = args.query.trim();
    if sql.is_empty() {
        return Err(DbError::InvalidArgument("query must not be empty".to_string()));
    }
    let result = db.rpc(sql_function, &json!({ "query": sql })).await?;

    let mut rows = match result {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        other => vec![other],
    };
    let total = rows.len();
    let truncated = total > limits.max_rows as usize;
    rows.truncate(limits.max_rows as usize);

    Ok(json!({
        "row_count": total,
        "truncated": truncated,
        "rows": rows,
    }))
}
