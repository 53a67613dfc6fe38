use async_trait::async_trait;
use std::time::Duration;

/// Why a build hook call failed. `status` is `None` when no response arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookFailure {
    pub status: Option<u16>,
    pub body: String,
}

#[async_trait]
pub trait BuildHook: Send + Sync {
    async fn trigger(&self) -> Result<(), HookFailure>;
}

/// POSTs to a Netlify build hook URL that never leaves the server.
pub struct NetlifyHook {
    client: reqwest::Client,
    url: String,
}

impl NetlifyHook {
    pub fn new(url: &str) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(NetlifyHook {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl BuildHook for NetlifyHook {
    async fn trigger(&self) -> Result<(), HookFailure> {
        let response = self.client.post(&self.url).send().await.map_err(|e| HookFailure {
            status: None,
            body: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(HookFailure {
            status: Some(status.as_u16()),
            body: response.text().await.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
pub mod recording {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts triggers and answers with a fixed result.
    pub struct RecordingHook {
        pub calls: AtomicUsize,
        pub failure: Option<HookFailure>,
    }

    impl RecordingHook {
        pub fn ok() -> Self {
            RecordingHook {
                calls: AtomicUsize::new(0),
                failure: None,
            }
        }

        pub fn failing(status: u16, body: &str) -> Self {
            RecordingHook {
                calls: AtomicUsize::new(0),
                failure: Some(HookFailure {
                    status: Some(status),
                    body: body.to_string(),
                }),
            }
        }

        pub fn count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BuildHook for RecordingHook {
        async fn trigger(&self) -> Result<(), HookFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.failure {
                Some(f) => Err(f.clone()),
                None => Ok(()),
            }
        }
    }
}
