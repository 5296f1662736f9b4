//! Structured SELECT-equivalent queries and their REST query-string encoding.
//!
//! A [`SelectQuery`] maps onto the PostgREST query grammar:
//! `select=a,b&col=op.value&order=col.desc&limit=n`. Aggregates use the
//! `alias:column.fn()` select syntax, which groups by every plain column.

use parlance_core::is_identifier;
use serde::Deserialize;
use serde_json::Value;

use crate::error::DbError;

/// Comparison operator of a row filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    Ilike,
    In,
    Is,
}

impl FilterOp {
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "eq",
            FilterOp::Neq => "neq",
            FilterOp::Gt => "gt",
            FilterOp::Gte => "gte",
            FilterOp::Lt => "lt",
            FilterOp::Lte => "lte",
            FilterOp::Like => "like",
            FilterOp::Ilike => "ilike",
            FilterOp::In => "in",
            FilterOp::Is => "is",
        }
    }

    pub const ALL: [&'static str; 10] = [
        "eq", "neq", "gt", "gte", "lt", "lte", "like", "ilike", "in", "is",
    ];
}

/// One `WHERE` condition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    /// Encode as a `(column, "op.value")` query pair.
    pub fn to_pair(&self) -> Result<(String, String), DbError> {
        require_column(&self.column)?;
        let value = match self.op {
            FilterOp::In => {
                let items = self.value.as_array().ok_or_else(|| {
                    DbError::InvalidArgument(format!(
                        "filter on '{}' with op 'in' needs an array value",
                        self.column
                    ))
                })?;
                let rendered: Vec<String> = items.iter().map(render_list_item).collect();
                format!("({})", rendered.join(","))
            }
            FilterOp::Is => match &self.value {
                Value::Null => "null".to_string(),
                Value::Bool(b) => b.to_string(),
                Value::String(s) if matches!(s.as_str(), "null" | "true" | "false") => s.clone(),
                _ => {
                    return Err(DbError::InvalidArgument(format!(
                        "filter on '{}' with op 'is' needs null, true, or false",
                        self.column
                    )))
                }
            },
            FilterOp::Like | FilterOp::Ilike => render_scalar(&self.value)?.replace('%', "*"),
            _ => render_scalar(&self.value)?,
        };
        Ok((self.column.clone(), format!("{}.{}", self.op.as_str(), value)))
    }
}

/// Sort key of an `ORDER BY`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default = "default_ascending")]
    pub ascending: bool,
}

fn default_ascending() -> bool {
    true
}

impl OrderBy {
    fn render(&self) -> Result<String, DbError> {
        require_column(&self.column)?;
        let dir = if self.ascending { "asc" } else { "desc" };
        Ok(format!("{}.{}", self.column, dir))
    }
}

/// Aggregate function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
        }
    }
}

/// One aggregate output column. `column` may be omitted for `count`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Aggregate {
    pub function: AggregateFn,
    #[serde(default)]
    pub column: Option<String>,
}

impl Aggregate {
    /// Output alias, e.g. `total_sum` or `count`.
    pub fn alias(&self) -> String {
        match &self.column {
            Some(col) => format!("{}_{}", col, self.function.as_str()),
            None => self.function.as_str().to_string(),
        }
    }

    fn render(&self) -> Result<String, DbError> {
        match (&self.column, self.function) {
            (None, AggregateFn::Count) => Ok("count()".to_string()),
            (None, f) => Err(DbError::InvalidArgument(format!(
                "aggregate '{}' needs a column",
                f.as_str()
            ))),
            (Some(col), f) => {
                require_column(col)?;
                Ok(format!("{}:{}.{}()", self.alias(), col, f.as_str()))
            }
        }
    }
}

/// A filtered, ordered, limited read of one table or view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectQuery {
    pub table: String,
    /// Plain columns. Empty means all columns unless aggregates are present.
    pub columns: Vec<String>,
    pub aggregates: Vec<Aggregate>,
    pub filters: Vec<Filter>,
    pub order: Vec<OrderBy>,
    pub limit: Option<u32>,
}

impl SelectQuery {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Encode as REST query pairs, in a stable order.
    pub fn to_query_pairs(&self) -> Result<Vec<(String, String)>, DbError> {
        if !is_identifier(&self.table) {
            return Err(DbError::UnknownTable(self.table.clone()));
        }

        let mut select = Vec::with_capacity(self.columns.len() + self.aggregates.len());
        for col in &self.columns {
            if col != "*" {
                require_column(col)?;
            }
            select.push(col.clone());
        }
        for agg in &self.aggregates {
            select.push(agg.render()?);
        }
        let select = if select.is_empty() {
            "*".to_string()
        } else {
            select.join(",")
        };

        let mut pairs = vec![("select".to_string(), select)];
        for filter in &self.filters {
            pairs.push(filter.to_pair()?);
        }
        if !self.order.is_empty() {
            let order: Result<Vec<String>, DbError> =
                self.order.iter().map(OrderBy::render).collect();
            pairs.push(("order".to_string(), order?.join(",")));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        Ok(pairs)
    }
}

fn require_column(name: &str) -> Result<(), DbError> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(DbError::InvalidArgument(format!(
            "'{}' is not a valid column name",
            name
        )))
    }
}

fn render_scalar(value: &Value) -> Result<String, DbError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok("null".to_string()),
        _ => Err(DbError::InvalidArgument(
            "filter value must be a string, number, boolean, or null".to_string(),
        )),
    }
}

/// List items are quoted when they contain characters that are reserved in
/// the `in.(…)` grammar.
fn render_list_item(value: &Value) -> String {
    match value {
        Value::String(s) if s.contains([',', '(', ')', '"', '\\', ' ']) => {
            format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
        }
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(q: &SelectQuery) -> Vec<(String, String)> {
        q.to_query_pairs().unwrap()
    }

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_bare_select_defaults_to_star() {
        assert_eq!(pairs(&SelectQuery::new("orders")), vec![pair("select", "*")]);
    }

    #[test]
    fn test_full_select_encoding() {
        let q = SelectQuery {
            table: "orders".to_string(),
            columns: vec!["id".to_string(), "total".to_string()],
            filters: vec![
                Filter {
                    column: "status".to_string(),
                    op: FilterOp::Eq,
                    value: json!("shipped"),
                },
                Filter {
                    column: "total".to_string(),
                    op: FilterOp::Gte,
                    value: json!(100.5),
                },
            ],
            order: vec![OrderBy {
                column: "total".to_string(),
                ascending: false,
            }],
            limit: Some(10),
            ..Default::default()
        };
        assert_eq!(
            pairs(&q),
            vec![
                pair("select", "id,total"),
                pair("status", "eq.shipped"),
                pair("total", "gte.100.5"),
                pair("order", "total.desc"),
                pair("limit", "10"),
            ]
        );
    }

    #[test]
    fn test_aggregate_select() {
        let q = SelectQuery {
            table: "orders".to_string(),
            columns: vec!["status".to_string()],
            aggregates: vec![
                Aggregate {
                    function: AggregateFn::Count,
                    column: None,
                },
                Aggregate {
                    function: AggregateFn::Sum,
                    column: Some("total".to_string()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(
            pairs(&q),
            vec![pair("select", "status,count(),total_sum:total.sum()")]
        );
    }

    #[test]
    fn test_aggregate_without_column_rejected_for_sum() {
        let q = SelectQuery {
            table: "orders".to_string(),
            aggregates: vec![Aggregate {
                function: AggregateFn::Sum,
                column: None,
            }],
            ..Default::default()
        };
        assert!(matches!(q.to_query_pairs(), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn test_in_filter_quotes_reserved_chars() {
        let f = Filter {
            column: "name".to_string(),
            op: FilterOp::In,
            value: json!(["plain", "a,b", "say \"hi\"", 3]),
        };
        assert_eq!(
            f.to_pair().unwrap(),
            pair("name", r#"in.(plain,"a,b","say \"hi\"",3)"#)
        );
    }

    #[test]
    fn test_in_filter_requires_array() {
        let f = Filter {
            column: "id".to_string(),
            op: FilterOp::In,
            value: json!(5),
        };
        assert!(f.to_pair().is_err());
    }

    #[test]
    fn test_is_filter_values() {
        let null = Filter {
            column: "shipped_at".to_string(),
            op: FilterOp::Is,
            value: Value::Null,
        };
        assert_eq!(null.to_pair().unwrap(), pair("shipped_at", "is.null"));

        let bad = Filter {
            column: "shipped_at".to_string(),
            op: FilterOp::Is,
            value: json!("yesterday"),
        };
        assert!(bad.to_pair().is_err());
    }

    #[test]
    fn test_like_percent_becomes_star() {
        let f = Filter {
            column: "email".to_string(),
            op: FilterOp::Ilike,
            value: json!("%@example.com"),
        };
        assert_eq!(f.to_pair().unwrap(), pair("email", "ilike.*@example.com"));
    }

    #[test]
    fn test_rejects_non_identifier_column() {
        let q = SelectQuery {
            table: "orders".to_string(),
            columns: vec!["id,secret:password".to_string()],
            ..Default::default()
        };
        assert!(matches!(q.to_query_pairs(), Err(DbError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_non_identifier_table() {
        let q = SelectQuery::new("orders?select=*");
        assert!(matches!(q.to_query_pairs(), Err(DbError::UnknownTable(_))));
    }

    #[test]
    fn test_deserialize_filter_ops() {
        let f: Filter =
            serde_json::from_value(json!({"column": "id", "op": "lte", "value": 3})).unwrap();
        assert_eq!(f.op, FilterOp::Lte);
        assert!(serde_json::from_value::<Filter>(json!({"column": "id", "op": "between", "value": 3}))
            .is_err());
    }

    #[test]
    fn test_order_defaults_to_ascending() {
        let o: OrderBy = serde_json::from_value(json!({"column": "month"})).unwrap();
        assert!(o.ascending);
    }
}
