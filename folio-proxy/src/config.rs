/// Proxy configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub github_token: Option<String>,
    /// `owner/repo`
    pub github_repo: Option<String>,
    pub github_branch: String,
    pub content_path: String,
    pub builder_state_path: String,
    pub github_api_base: String,
    /// Shared secret expected in `x-aisa-console-token` by `/content`.
    pub console_token: Option<String>,
    /// Shared secret expected in `x-aisa-admin-token` by the builder endpoints.
    pub admin_token: Option<String>,
    pub allowed_origin: Option<String>,
    pub build_hook_url: Option<String>,
    pub host: String,
    pub port: u16,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        ProxyConfig {
            github_token: None,
            github_repo: None,
            github_branch: "main".to_string(),
            content_path: "data/content.json".to_string(),
            builder_state_path: "content/builder/state.json".to_string(),
            github_api_base: "https://api.github.com".to_string(),
            console_token: None,
            admin_token: None,
            allowed_origin: None,
            build_hook_url: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = ProxyConfig::default();

        ProxyConfig {
            github_token: get("GITHUB_TOKEN"),
            github_repo: get("GITHUB_REPO"),
            github_branch: get("GITHUB_BRANCH").unwrap_or(defaults.github_branch),
            content_path: get("GITHUB_CONTENT_PATH").unwrap_or(defaults.content_path),
            builder_state_path: get("BUILDER_STATE_PATH").unwrap_or(defaults.builder_state_path),
            github_api_base: get("GITHUB_API_BASE").unwrap_or(defaults.github_api_base),
            console_token: get("AISA_CONSOLE_TOKEN"),
            admin_token: get("AISA_ADMIN_TOKEN"),
            allowed_origin: get("CONSOLE_ALLOWED_ORIGIN"),
            build_hook_url: get("NETLIFY_BUILD_HOOK_URL"),
            host: get("FOLIO_HOST").unwrap_or(defaults.host),
            port: get("FOLIO_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
        }
    }

    /// `GITHUB_REPO` split into owner and name, if well formed.
    pub fn repo_parts(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.github_repo.as_deref()?.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }
}
