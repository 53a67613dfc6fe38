use crate::error::{FolioError, Result};
use crate::storage::LocalStorage;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const CONTENT_ROUTE: &str = "/content";
pub const BUILDER_LOAD_ROUTE: &str = "/builder_load";
pub const BUILDER_SAVE_ROUTE: &str = "/builder_save";
pub const DEPLOY_ROUTE: &str = "/deploy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request to one of the proxy functions, relative to the endpoint base.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl RemoteRequest {
    pub fn get(path: &str) -> Self {
        RemoteRequest {
            method: Method::Get,
            path: path.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn post(path: &str, body: Option<serde_json::Value>) -> Self {
        RemoteRequest {
            method: Method::Post,
            path: path.to_string(),
            headers: Vec::new(),
            body,
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteResponse {
    pub status: u16,
    pub body: String,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 401 and 403 both mean the shared secret was missing or wrong.
    pub fn is_auth_rejected(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }

    /// Human-readable failure detail: the `detail`/`error` field of a JSON
    /// body when present, the raw body otherwise, capped at `limit` chars.
    pub fn detail(&self, limit: usize) -> String {
        let from_json = serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|v| {
                v.get("detail")
                    .or_else(|| v.get("error"))
                    .and_then(|d| d.as_str())
                    .map(str::to_string)
            });
        let text = from_json.unwrap_or_else(|| self.body.clone());
        text.chars().take(limit).collect()
    }

    /// Turn a non-2xx response into `FolioError::Remote`.
    pub fn error_for_status(self, limit: usize) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else if self.is_auth_rejected() {
            Err(FolioError::Auth(format!(
                "{} {}",
                self.status,
                self.detail(limit)
            )))
        } else {
            Err(FolioError::Remote {
                status: self.status,
                detail: self.detail(limit),
            })
        }
    }
}

/// Transport to the proxy functions.
#[async_trait]
pub trait RemoteEndpoint: Send + Sync {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse>;
}

/// `RemoteEndpoint` over HTTP.
pub struct HttpEndpoint {
    client: reqwest::Client,
    base_url: String,
}

impl HttpEndpoint {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(HttpEndpoint {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl RemoteEndpoint for HttpEndpoint {
    async fn send(&self, request: RemoteRequest) -> Result<RemoteResponse> {
        let url = format!("{}{}", self.base_url, request.path);
        log::debug!("{:?} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(RemoteResponse { status, body })
    }
}

/// Source of a replacement token after the proxy rejected the current one.
pub trait TokenPrompt: Send {
    /// Ask for the value of `header`. `None` or blank aborts the retry.
    fn prompt(&mut self, header: &str) -> Option<String>;
}

/// Never supplies a token; the first rejection is final.
pub struct NoPrompt;

impl TokenPrompt for NoPrompt {
    fn prompt(&mut self, _header: &str) -> Option<String> {
        None
    }
}

/// Two-step auth policy: send with the stored token, and after a 401/403
/// ask once for a new token, store it, and resend. A second rejection is
/// returned to the caller as-is.
#[derive(Debug, Clone, Copy)]
pub struct AuthRetry {
    pub header: &'static str,
    pub storage_key: &'static str,
}

impl AuthRetry {
    pub async fn send(
        &self,
        endpoint: &dyn RemoteEndpoint,
        storage: &LocalStorage,
        prompt: &mut dyn TokenPrompt,
        request: RemoteRequest,
    ) -> Result<RemoteResponse> {
        let stored = storage.get_item(self.storage_key)?;
        let response = endpoint
            .send(self.authorize(request.clone(), stored.as_deref()))
            .await?;
        if !response.is_auth_rejected() {
            return Ok(response);
        }

        log::warn!(
            "{} {} rejected with {}, asking for a new token",
            self.header,
            request.path,
            response.status
        );
        let token = match prompt.prompt(self.header) {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => return Ok(response),
        };
        storage.set_item(self.storage_key, &token)?;

        endpoint.send(self.authorize(request, Some(&token))).await
    }

    fn authorize(&self, request: RemoteRequest, token: Option<&str>) -> RemoteRequest {
        match token {
            Some(t) if !t.is_empty() => request.with_header(self.header, t),
            _ => request,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::auth::CONSOLE_TOKEN_HEADER;
    use crate::storage::SESSION_TOKEN_KEY;

    const POLICY: AuthRetry = AuthRetry {
        header: CONSOLE_TOKEN_HEADER,
        storage_key: SESSION_TOKEN_KEY,
    };

    #[tokio::test]
    async fn test_retry_once_after_403() {
        let endpoint = ScriptedEndpoint::new(vec![(403, "{}"), (200, "{\"ok\":true}")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut prompt = FixedPrompt(Some(" fresh "), 0);

        let response = POLICY
            .send(&endpoint, &storage, &mut prompt, RemoteRequest::post(CONTENT_ROUTE, None))
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(prompt.1, 1);
        let sent = endpoint.sent();
        assert_eq!(sent[0].header(CONSOLE_TOKEN_HEADER), None);
        assert_eq!(sent[1].header(CONSOLE_TOKEN_HEADER), Some("fresh"));
        assert_eq!(
            storage.get_item(SESSION_TOKEN_KEY).unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[tokio::test]
    async fn test_second_rejection_is_terminal() {
        let endpoint = ScriptedEndpoint::new(vec![(403, "{}"), (403, "{\"detail\":\"bad token\"}")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        storage.set_item(SESSION_TOKEN_KEY, "stale").unwrap();
        let mut prompt = FixedPrompt(Some("still-wrong"), 0);

        let response = POLICY
            .send(&endpoint, &storage, &mut prompt, RemoteRequest::post(CONTENT_ROUTE, None))
            .await
            .unwrap();

        assert_eq!(response.status, 403);
        assert_eq!(response.detail(200), "bad token");
        assert_eq!(prompt.1, 1);
        assert_eq!(endpoint.sent().len(), 2);
        assert_eq!(endpoint.sent()[0].header(CONSOLE_TOKEN_HEADER), Some("stale"));
    }

    #[tokio::test]
    async fn test_cancelled_prompt_stops() {
        let endpoint = ScriptedEndpoint::new(vec![(401, "Unauthorized")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut prompt = FixedPrompt(None, 0);

        let response = POLICY
            .send(&endpoint, &storage, &mut prompt, RemoteRequest::get(BUILDER_LOAD_ROUTE))
            .await
            .unwrap();
        assert_eq!(response.status, 401);
        assert_eq!(endpoint.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_other_failures_not_retried() {
        let endpoint = ScriptedEndpoint::new(vec![(502, "{\"error\":\"GitHub write failed\"}")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut prompt = FixedPrompt(Some("x"), 0);

        let response = POLICY
            .send(&endpoint, &storage, &mut prompt, RemoteRequest::post(CONTENT_ROUTE, None))
            .await
            .unwrap();
        assert_eq!(prompt.1, 0);
        assert!(matches!(
            response.error_for_status(200),
            Err(FolioError::Remote { status: 502, .. })
        ));
    }

    #[test]
    fn test_detail_truncates_raw_body() {
        let response = RemoteResponse {
            status: 500,
            body: "x".repeat(300),
        };
        assert_eq!(response.detail(200).len(), 200);
    }
}
