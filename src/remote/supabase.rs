use super::{Filter, Query, RemoteError, RemoteResult, RemoteStore, Table};
use crate::config::SupabaseConfig;
use async_trait::async_trait;
use serde_json::Value;

impl RemoteError {
    fn network(e: reqwest::Error) -> Self {
        RemoteError::Network(e.to_string())
    }

    fn parse(e: impl std::fmt::Display) -> Self {
        RemoteError::Parse(e.to_string())
    }
}

/// PostgREST client for the Supabase project holding the five app tables.
///
/// Holds only configuration; a `reqwest::Client` is built per request.
#[derive(Clone, Debug)]
pub struct SupabaseClient {
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(SupabaseConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn credentials(&self) -> RemoteResult<(&str, &str)> {
        self.config.credentials().ok_or(RemoteError::NotConfigured)
    }

    fn with_auth_headers(req: reqwest::RequestBuilder, key: &str) -> reqwest::RequestBuilder {
        req.header("apikey", key)
            .header("Authorization", format!("Bearer {}", key))
    }

    /// `{base}/rest/v1/{table}?{params}` with every value percent-encoded.
    pub(crate) fn table_url(base_url: &str, table: Table, params: &[(&str, String)]) -> String {
        let mut url = format!("{}/rest/v1/{}", base_url, table.as_ref());
        for (i, (k, v)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(&urlencoding::encode(k));
            url.push('=');
            url.push_str(&urlencoding::encode(v));
        }
        url
    }

    pub(crate) fn query_params(query: &Query) -> Vec<(&str, String)> {
        let mut params = vec![("select", query.columns.clone().unwrap_or_else(|| "*".into()))];
        params.extend(query.filters.iter().map(Filter::to_param));
        if let Some(order) = &query.order {
            let dir = if order.ascending { "asc" } else { "desc" };
            params.push(("order", format!("{}.{}", order.column, dir)));
        }
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }

    fn filter_params(filters: &[Filter]) -> Vec<(&str, String)> {
        filters.iter().map(Filter::to_param).collect()
    }

    async fn send(req: reqwest::RequestBuilder, ctx: &str) -> RemoteResult<reqwest::Response> {
        let res = req.send().await.map_err(RemoteError::network)?;

        let status = res.status();
        if status.is_success() {
            Ok(res)
        } else if status.as_u16() == 401 || status.as_u16() == 403 {
            Err(RemoteError::Unauthorized)
        } else {
            let body = res.text().await.unwrap_or_default();
            tracing::debug!(%status, ctx, "remote request rejected");
            Err(RemoteError::Http {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait(?Send)]
impl RemoteStore for SupabaseClient {
    async fn insert(&self, table: Table, row: Value) -> RemoteResult<Value> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &[("select", "*".to_string())]);
        let req = reqwest::Client::new()
            .post(url)
            .header("Prefer", "return=representation")
            .json(&[row]);

        let res = Self::send(Self::with_auth_headers(req, key), "insert").await?;
        let rows: Vec<Value> = res.json().await.map_err(RemoteError::parse)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| RemoteError::Parse("insert returned no row".to_string()))
    }

    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> RemoteResult<()> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &[]);
        let req = reqwest::Client::new()
            .post(url)
            .header("Prefer", "return=minimal")
            .json(&rows);

        Self::send(Self::with_auth_headers(req, key), "insert_many").await?;
        Ok(())
    }

    async fn select(&self, table: Table, query: &Query) -> RemoteResult<Vec<Value>> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &Self::query_params(query));
        let req = reqwest::Client::new().get(url);

        let res = Self::send(Self::with_auth_headers(req, key), "select").await?;
        res.json().await.map_err(RemoteError::parse)
    }

    async fn delete(&self, table: Table, filters: &[Filter]) -> RemoteResult<()> {
        let (base, key) = self.credentials()?;
        if filters.is_empty() {
            // PostgREST refuses unfiltered deletes anyway; never send one.
            return Err(RemoteError::Parse("delete without filter".to_string()));
        }
        let url = Self::table_url(base, table, &Self::filter_params(filters));
        let req = reqwest::Client::new().delete(url);

        Self::send(Self::with_auth_headers(req, key), "delete").await?;
        Ok(())
    }

    async fn update(&self, table: Table, filters: &[Filter], patch: Value) -> RemoteResult<()> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &Self::filter_params(filters));
        let req = reqwest::Client::new()
            .patch(url)
            .header("Prefer", "return=minimal")
            .json(&patch);

        Self::send(Self::with_auth_headers(req, key), "update").await?;
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value, on_conflict: &[&str]) -> RemoteResult<()> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &[("on_conflict", on_conflict.join(","))]);
        let req = reqwest::Client::new()
            .post(url)
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[row]);

        Self::send(Self::with_auth_headers(req, key), "upsert").await?;
        Ok(())
    }

    async fn ping(&self, table: Table) -> RemoteResult<()> {
        let (base, key) = self.credentials()?;
        let url = Self::table_url(base, table, &[("select", "id".to_string())]);
        let req = reqwest::Client::new()
            .request(reqwest::Method::HEAD, url)
            .header("Prefer", "count=exact");

        Self::send(Self::with_auth_headers(req, key), "ping").await?;
        Ok(())
    }
}
