//! Hosted database client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::Url;
use serde_json::Value;

use crate::error::DbError;
use crate::query::{Filter, SelectQuery};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Read-only operations against the hosted database.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Run a structured select and return the rows as JSON objects.
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, DbError>;

    /// Count the rows of `table` matching `filters`.
    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, DbError>;

    /// Call a server-side function with a JSON argument object.
    async fn rpc(&self, function: &str, args: &Value) -> Result<Value, DbError>;
}

/// [`DatabaseClient`] over a PostgREST-compatible HTTP interface.
pub struct RestDatabase {
    client: reqwest::Client,
    base: Url,
    api_key: String,
}

impl RestDatabase {
    /// `database_url` is the project URL; `rest_path` is usually `/rest/v1`.
    /// `timeout` bounds each request, body included.
    pub fn new(
        database_url: &str,
        rest_path: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DbError> {
        let joined = format!(
            "{}/{}/",
            database_url.trim_end_matches('/'),
            rest_path.trim_matches('/')
        );
        let base = Url::parse(&joined)
            .map_err(|e| DbError::InvalidArgument(format!("invalid database URL: {}", e)))?;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| DbError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base,
            api_key: api_key.into(),
        })
    }

    /// URL for a select on `query.table`.
    pub fn select_url(&self, query: &SelectQuery) -> Result<Url, DbError> {
        let pairs = query.to_query_pairs()?;
        let mut url = self.resource_url(&query.table)?;
        url.query_pairs_mut().extend_pairs(pairs);
        Ok(url)
    }

    fn resource_url(&self, path: &str) -> Result<Url, DbError> {
        self.base
            .join(path)
            .map_err(|e| DbError::InvalidArgument(format!("invalid resource path '{}': {}", path, e)))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("accept", "application/json")
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, DbError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(DbError::Api {
            status,
            message: error_message(&body),
        })
    }
}

#[async_trait]
impl DatabaseClient for RestDatabase {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, DbError> {
        let url = self.select_url(query)?;
        tracing::debug!(table = %query.table, url = %url, "Database select");

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| DbError::Network(e.to_string()))?;
        let response = Self::check(response).await?;

        response.json::<Vec<Value>>().await.map_err(body_error)
    }

    async fn count(&self, table: &str, filters: &[Filter]) -> Result<u64, DbError> {
        let query = SelectQuery {
            table: table.to_string(),
            filters: filters.to_vec(),
            ..Default::default()
        };
        let url = self.select_url(&query)?;
        tracing::debug!(table = %table, "Database count");

        let response = self
            .request(reqwest::Method::HEAD, url)
            .header("prefer", "count=exact")
            .send()
            .await
            .map_err(|e| DbError::Network(e.to_string()))?;
        let response = Self::check(response).await?;

        parse_content_range(response.headers())
    }

    async fn rpc(&self, function: &str, args: &Value) -> Result<Value, DbError> {
        let url = self.resource_url(&format!("rpc/{}", function))?;
        tracing::debug!(function = %function, "Database rpc");

        let response = self
            .request(reqwest::Method::POST, url)
            .json(args)
            .send()
            .await
            .map_err(|e| DbError::Network(e.to_string()))?;
        let response = Self::check(response).await?;

        response.json::<Value>().await.map_err(body_error)
    }
}

/// Total row count from a `Content-Range: 0-24/3573` (or `*/0`) header.
fn parse_content_range(headers: &HeaderMap) -> Result<u64, DbError> {
    let value = headers
        .get("content-range")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| DbError::InvalidResponse("missing Content-Range header".to_string()))?;
    let total = value
        .rsplit_once('/')
        .map(|(_, total)| total)
        .ok_or_else(|| DbError::InvalidResponse(format!("malformed Content-Range: {}", value)))?;
    total
        .parse::<u64>()
        .map_err(|_| DbError::InvalidResponse(format!("Content-Range has no exact count: {}", value)))
}

fn body_error(e: reqwest::Error) -> DbError {
    if e.is_timeout() {
        DbError::Network(e.to_string())
    } else {
        DbError::InvalidResponse(e.to_string())
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(500).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FilterOp;
    use reqwest::header::HeaderValue;
    use serde_json::json;

    fn db() -> RestDatabase {
        RestDatabase::new(
            "https://project.example.co/",
            "/rest/v1",
            "anon-key",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_select_url_encodes_filters() {
        let query = SelectQuery {
            table: "customers".to_string(),
            filters: vec![Filter {
                column: "name".to_string(),
                op: FilterOp::Eq,
                value: json!("Ana & Co"),
            }],
            limit: Some(5),
            ..Default::default()
        };
        let url = db().select_url(&query).unwrap();
        assert_eq!(url.path(), "/rest/v1/customers");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("select".to_string(), "*".to_string()),
                ("name".to_string(), "eq.Ana & Co".to_string()),
                ("limit".to_string(), "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_rpc_url() {
        let url = db().resource_url("rpc/execute_readonly_sql").unwrap();
        assert_eq!(
            url.as_str(),
            "https://project.example.co/rest/v1/rpc/execute_readonly_sql"
        );
    }

    #[test]
    fn test_invalid_database_url() {
        assert!(RestDatabase::new("not a url", "/rest/v1", "k", Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_parse_content_range() {
        let mut headers = HeaderMap::new();
        headers.insert("content-range", HeaderValue::from_static("0-24/3573"));
        assert_eq!(parse_content_range(&headers).unwrap(), 3573);

        headers.insert("content-range", HeaderValue::from_static("*/0"));
        assert_eq!(parse_content_range(&headers).unwrap(), 0);

        headers.insert("content-range", HeaderValue::from_static("0-24/*"));
        assert!(parse_content_range(&headers).is_err());

        assert!(parse_content_range(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_error_message_prefers_message_field() {
        assert_eq!(
            error_message(r#"{"code":"42703","message":"column orders.foo does not exist"}"#),
            "column orders.foo does not exist"
        );
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
    }
}
