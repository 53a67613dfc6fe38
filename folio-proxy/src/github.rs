use crate::config::ProxyConfig;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed GitHub response: {0}")]
    Malformed(String),
}

impl GitHubError {
    /// Upstream HTTP status, when GitHub answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn detail(&self) -> String {
        match self {
            GitHubError::Status { detail, .. } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// A file read from the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub sha: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PutResult {
    pub commit_sha: Option<String>,
    pub file_sha: Option<String>,
}

/// The slice of the GitHub contents API the proxy needs.
#[async_trait]
pub trait ContentsApi: Send + Sync {
    /// Read a file on the configured branch. A missing file is `Ok(None)`.
    async fn get_file(&self, path: &str) -> Result<Option<RepoFile>, GitHubError>;

    /// Create or replace a file. `sha` must be the current blob sha when the
    /// file exists; a stale sha is rejected upstream with 409.
    async fn put_file(
        &self,
        path: &str,
        text: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<PutResult, GitHubError>;
}

/// `ContentsApi` backed by the GitHub REST API.
pub struct GitHubContents {
    client: reqwest::Client,
    api_base: String,
    owner: String,
    repo: String,
    branch: String,
    token: String,
}

#[derive(Deserialize)]
struct ContentsResponse {
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Deserialize)]
struct ShaOnly {
    sha: Option<String>,
}

#[derive(Deserialize)]
struct PutResponse {
    content: Option<ShaOnly>,
    commit: Option<ShaOnly>,
}

impl GitHubContents {
    /// Build from config; fails when the token or `owner/repo` is missing.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, String> {
        let token = config
            .github_token
            .clone()
            .ok_or_else(|| "Missing GITHUB_TOKEN".to_string())?;
        let (owner, repo) = config
            .repo_parts()
            .ok_or_else(|| "Invalid GITHUB_REPO format. Expected owner/repo.".to_string())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("folio-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| e.to_string())?;

        Ok(GitHubContents {
            client,
            api_base: config.github_api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
            branch: config.github_branch.clone(),
            token,
        })
    }

    fn file_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base,
            self.owner,
            self.repo,
            encode_path(path)
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
    }
}

/// Percent-encode a repository path, keeping `/` separators.
pub fn encode_path(path: &str) -> String {
    urlencoding::encode(path).replace("%2F", "/")
}

/// GitHub error bodies carry a `message`; fall back to the raw text.
fn upstream_detail(text: &str, limit: usize) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| text.chars().take(limit).collect())
}

#[async_trait]
impl ContentsApi for GitHubContents {
    async fn get_file(&self, path: &str) -> Result<Option<RepoFile>, GitHubError> {
        let url = format!(
            "{}?ref={}",
            self.file_url(path),
            urlencoding::encode(&self.branch)
        );
        log::debug!("GET {url}");

        let response = self.request(reqwest::Method::GET, &url).send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if status == 404 {
            return Ok(None);
        }
        if !(200..300).contains(&status) {
            return Err(GitHubError::Status {
                status,
                detail: upstream_detail(&text, 200),
            });
        }

        let body: ContentsResponse =
            serde_json::from_str(&text).map_err(|e| GitHubError::Malformed(e.to_string()))?;
        if !body.encoding.is_empty() && body.encoding != "base64" {
            return Err(GitHubError::Malformed(format!(
                "unexpected encoding '{}'",
                body.encoding
            )));
        }
        // The API wraps base64 at 60 columns.
        let packed: String = body.content.split_whitespace().collect();
        let bytes = STANDARD
            .decode(packed)
            .map_err(|e| GitHubError::Malformed(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| GitHubError::Malformed(e.to_string()))?;

        Ok(Some(RepoFile {
            sha: body.sha,
            text,
        }))
    }

    async fn put_file(
        &self,
        path: &str,
        text: &str,
        message: &str,
        sha: Option<&str>,
    ) -> Result<PutResult, GitHubError> {
        let url = self.file_url(path);
        let mut body = serde_json::json!({
            "message": message,
            "content": STANDARD.encode(text),
            "branch": self.branch,
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha.to_string());
        }
        log::debug!("PUT {url}");

        let response = self
            .request(reqwest::Method::PUT, &url)
            .json(&body)
            .send()
            .await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            return Err(GitHubError::Status {
                status,
                detail: upstream_detail(&text, 300),
            });
        }

        let parsed: PutResponse =
            serde_json::from_str(&text).map_err(|e| GitHubError::Malformed(e.to_string()))?;
        Ok(PutResult {
            commit_sha: parsed.commit.and_then(|c| c.sha),
            file_sha: parsed.content.and_then(|c| c.sha),
        })
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashMap;
    use std::hash::{Hash, Hasher};
    use std::sync::Mutex;

    /// In-memory repository with GitHub's sha-check semantics.
    #[derive(Default)]
    pub struct MemoryContents {
        files: Mutex<HashMap<String, RepoFile>>,
        commits: Mutex<u32>,
        fail_reads: Option<u16>,
        fail_writes: Option<u16>,
    }

    impl MemoryContents {
        pub fn with_file(path: &str, text: &str) -> Self {
            let contents = MemoryContents::default();
            contents.files.lock().unwrap().insert(
                path.to_string(),
                RepoFile {
                    sha: blob_sha(text),
                    text: text.to_string(),
                },
            );
            contents
        }

        /// Every read fails with `status`.
        pub fn failing_reads(status: u16) -> Self {
            MemoryContents {
                fail_reads: Some(status),
                ..Default::default()
            }
        }

        /// Every write fails with `status`.
        pub fn failing_writes(status: u16) -> Self {
            MemoryContents {
                fail_writes: Some(status),
                ..Default::default()
            }
        }

        pub fn text(&self, path: &str) -> Option<String> {
            self.files.lock().unwrap().get(path).map(|f| f.text.clone())
        }

        pub fn commit_count(&self) -> u32 {
            *self.commits.lock().unwrap()
        }
    }

    fn blob_sha(text: &str) -> String {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    #[async_trait]
    impl ContentsApi for MemoryContents {
        async fn get_file(&self, path: &str) -> Result<Option<RepoFile>, GitHubError> {
            if let Some(status) = self.fail_reads {
                return Err(GitHubError::Status {
                    status,
                    detail: "Bad credentials".into(),
                });
            }
            Ok(self.files.lock().unwrap().get(path).cloned())
        }

        async fn put_file(
            &self,
            path: &str,
            text: &str,
            _message: &str,
            sha: Option<&str>,
        ) -> Result<PutResult, GitHubError> {
            if let Some(status) = self.fail_writes {
                return Err(GitHubError::Status {
                    status,
                    detail: "Resource not accessible by integration".into(),
                });
            }
            let mut files = self.files.lock().unwrap();
            let current = files.get(path).map(|f| f.sha.clone());
            if current.as_deref() != sha {
                return Err(GitHubError::Status {
                    status: 409,
                    detail: format!("{path} does not match {}", sha.unwrap_or("null")),
                });
            }

            let file_sha = blob_sha(text);
            files.insert(
                path.to_string(),
                RepoFile {
                    sha: file_sha.clone(),
                    text: text.to_string(),
                },
            );
            let mut commits = self.commits.lock().unwrap();
            *commits += 1;
            Ok(PutResult {
                commit_sha: Some(format!("commit{}", *commits)),
                file_sha: Some(file_sha),
            })
        }
    }
}
