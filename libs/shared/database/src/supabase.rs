use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// Typed failures from the PostgREST storage layer.
///
/// `Conflict` is raised on HTTP 409, which PostgREST returns when an insert
/// or update violates a unique index. Callers rely on this variant to detect
/// lost slot races, so it must stay distinct from the generic `Api` case.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("storage authentication rejected: {0}")]
    Unauthorized(String),

    #[error("storage resource not found: {0}")]
    NotFound(String),

    #[error("storage uniqueness conflict: {0}")]
    Conflict(String),

    #[error("storage api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed storage payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("malformed content-range header: {0}")]
    BadCount(String),
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_role_key.clone(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert("apikey", HeaderValue::from_str(&self.service_key).unwrap());
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_key)).unwrap(),
        );

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, extra_headers).await?;
        let data = response.json::<T>().await?;
        Ok(data)
    }

    /// GET with `Prefer: count=exact`, returning the rows together with the
    /// total row count parsed from the `Content-Range` header. PostgREST
    /// renders the header as `<from>-<to>/<total>` (or `*/<total>` for an
    /// empty page).
    pub async fn fetch_with_count<T>(&self, path: &str) -> Result<(T, u64), DbError>
    where
        T: DeserializeOwned,
    {
        let mut extra = HeaderMap::new();
        extra.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, path, None, Some(extra)).await?;

        let total = match response.headers().get("content-range") {
            Some(value) => parse_content_range_total(value.to_str().unwrap_or_default())?,
            None => return Err(DbError::BadCount("content-range header missing".to_string())),
        };

        let data = response.json::<T>().await?;
        Ok((data, total))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<reqwest::Response, DbError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mut headers = self.headers();
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);
        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Storage API error ({}): {}", status, error_text);

            return Err(match status.as_u16() {
                401 | 403 => DbError::Unauthorized(error_text),
                404 => DbError::NotFound(error_text),
                409 => DbError::Conflict(error_text),
                code => DbError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        Ok(response)
    }
}

fn parse_content_range_total(raw: &str) -> Result<u64, DbError> {
    let total_part = raw
        .rsplit('/')
        .next()
        .ok_or_else(|| DbError::BadCount(raw.to_string()))?;

    if total_part == "*" {
        return Ok(0);
    }

    total_part
        .parse::<u64>()
        .map_err(|_| DbError::BadCount(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::parse_content_range_total;

    #[test]
    fn parses_populated_range() {
        assert_eq!(parse_content_range_total("0-4/7").unwrap(), 7);
    }

    #[test]
    fn parses_empty_range() {
        assert_eq!(parse_content_range_total("*/0").unwrap(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_content_range_total("bogus/abc").is_err());
    }
}
