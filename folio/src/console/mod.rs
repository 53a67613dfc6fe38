use crate::auth::AuthGate;
use crate::deploy::trigger_deploy;
use crate::error::{FolioError, Result};
use crate::model::{ContentDocument, PageStatus};
use crate::persistence::{
    self, LoadSource, PersistStatus, PushOutcome, RemoteEndpoint, TokenPrompt,
};
use crate::registry::BlockRegistry;
use crate::storage::LocalStorage;
use crate::store::ContentStore;
use crate::util::now_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warn,
    Error,
}

/// A user-visible notification. Every console failure ends up as one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub tone: Tone,
}

impl Toast {
    fn new(tone: Tone, title: &str, message: impl Into<String>) -> Self {
        Toast {
            title: title.to_string(),
            message: message.into(),
            tone,
        }
    }
}

/// The editor application: content store, local storage and the optional
/// remote gateway. Entry points never return errors; they record a toast
/// and report success as a bool.
pub struct Console {
    store: ContentStore,
    storage: LocalStorage,
    endpoint: Option<Box<dyn RemoteEndpoint>>,
    prompt: Box<dyn TokenPrompt>,
    status: PersistStatus,
    toasts: Vec<Toast>,
}

impl Console {
    /// Build a console over local storage, loading the saved state (or demo data).
    pub fn new(
        storage: LocalStorage,
        registry: BlockRegistry,
        endpoint: Option<Box<dyn RemoteEndpoint>>,
        prompt: Box<dyn TokenPrompt>,
    ) -> Self {
        let state = persistence::load_local(&storage);
        Console {
            store: ContentStore::new(state, registry),
            storage,
            endpoint,
            prompt,
            status: PersistStatus::Idle,
            toasts: Vec::new(),
        }
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ContentStore {
        &mut self.store
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn auth(&self) -> AuthGate<'_> {
        AuthGate::new(&self.storage)
    }

    pub fn status(&self) -> &PersistStatus {
        &self.status
    }

    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    pub fn take_toasts(&mut self) -> Vec<Toast> {
        std::mem::take(&mut self.toasts)
    }

    fn toast(&mut self, tone: Tone, title: &str, message: impl Into<String>) {
        let toast = Toast::new(tone, title, message);
        match tone {
            Tone::Error => log::error!("{}: {}", toast.title, toast.message),
            Tone::Warn => log::warn!("{}: {}", toast.title, toast.message),
            _ => log::info!("{}: {}", toast.title, toast.message),
        }
        self.toasts.push(toast);
    }

    /// Commit the working layout into its page and write local storage.
    fn save_draft_local(&mut self) -> Result<()> {
        if self.store.active_page().is_some() {
            for warning in self.store.commit_layout()? {
                self.toast(Tone::Warn, "Validation", warning);
            }
        }
        persistence::save_local(&self.storage, self.store.state())
    }

    async fn push(&mut self) -> Result<PushOutcome> {
        let endpoint = self
            .endpoint
            .as_deref()
            .ok_or_else(|| FolioError::Other("No remote endpoint configured".into()))?;
        let doc = ContentDocument::from_pages(&self.store.state().pages, &now_iso());

        self.status.begin();
        let result =
            persistence::push_content(endpoint, &self.storage, self.prompt.as_mut(), &doc).await;
        self.status.finish(&result);
        result
    }

    /// Save: commit the layout of the active page (if any), write local
    /// storage, and when `remote` is set commit the content document through
    /// the content proxy.
    pub async fn save(&mut self, remote: bool) -> bool {
        if let Err(e) = self.save_draft_local() {
            self.toast(Tone::Error, "Save failed", e.to_string());
            return false;
        }
        if !remote {
            self.toast(Tone::Success, "Saved", "Draft saved locally.");
            return true;
        }

        match self.push().await {
            Ok(outcome) if outcome.changed => {
                let sha = outcome.commit_sha.unwrap_or_default();
                self.toast(Tone::Success, "Saved", format!("Committed {sha}."));
                true
            }
            Ok(_) => {
                self.toast(Tone::Info, "No changes", "Content already up to date.");
                true
            }
            Err(e) => {
                self.toast(
                    Tone::Error,
                    "Remote save failed",
                    format!("{e} (kept local)"),
                );
                false
            }
        }
    }

    /// Publish the active page: save if dirty, make sure the content commit
    /// exists, trigger the deploy, then mark the page published.
    pub async fn publish(&mut self) -> bool {
        let Some(page_id) = self.store.active_page_id().map(str::to_string) else {
            self.toast(Tone::Warn, "No page", "Select a page before publishing.");
            return false;
        };

        if self.store.is_dirty() {
            if let Err(e) = self.save_draft_local() {
                self.toast(Tone::Error, "Publish failed", e.to_string());
                return false;
            }
        }

        if let Err(e) = self.push().await {
            self.toast(Tone::Error, "Publish failed", e.to_string());
            return false;
        }

        let deployed = match self.endpoint.as_deref() {
            Some(endpoint) => trigger_deploy(endpoint).await,
            None => Err(FolioError::Other("No remote endpoint configured".into())),
        };
        if let Err(e) = deployed {
            self.toast(Tone::Error, "Publish failed", e.to_string());
            return false;
        }

        let marked = self
            .store
            .set_page_status(&page_id, PageStatus::Published)
            .and_then(|_| {
                self.store.mark_deployed();
                persistence::save_local(&self.storage, self.store.state())
            });
        if let Err(e) = marked {
            self.toast(Tone::Warn, "Published", format!("Deploy triggered, but {e}"));
            return true;
        }

        self.toast(Tone::Success, "Published", "Deploy triggered.");
        true
    }

    /// Save locally, then write the whole state through the builder proxy.
    pub async fn sync_builder(&mut self) -> bool {
        if let Err(e) = self.save_draft_local() {
            self.toast(Tone::Error, "Save failed", e.to_string());
            return false;
        }
        let Some(endpoint) = self.endpoint.as_deref() else {
            self.toast(Tone::Warn, "Saved locally", "No remote endpoint configured.");
            return false;
        };

        let result = persistence::save_builder_state(
            endpoint,
            &self.storage,
            self.prompt.as_mut(),
            self.store.state(),
        )
        .await;
        match result {
            Ok(()) => {
                self.toast(Tone::Success, "Saved", "Builder state committed.");
                true
            }
            Err(e) => {
                self.toast(
                    Tone::Error,
                    "Could not save to GitHub",
                    format!("{e} (kept local)"),
                );
                false
            }
        }
    }

    /// Replace the editor state with the repository's builder state, or the
    /// best fallback available.
    pub async fn load_builder(&mut self) -> LoadSource {
        let Some(endpoint) = self.endpoint.as_deref() else {
            self.toast(Tone::Warn, "Local data", "No remote endpoint configured.");
            return LoadSource::Local;
        };

        let loaded =
            persistence::load_builder_state(endpoint, &self.storage, self.prompt.as_mut()).await;
        let source = loaded.source;
        self.store.replace_state(loaded.state);

        let reason = loaded.remote_error.unwrap_or_default();
        match source {
            LoadSource::Remote => self.toast(
                Tone::Success,
                "Loaded",
                "Builder state loaded from the repository.",
            ),
            LoadSource::Cache => self.toast(Tone::Warn, "Using cached state", reason),
            LoadSource::Local => self.toast(Tone::Warn, "Using local state", reason),
        }
        source
    }
}
