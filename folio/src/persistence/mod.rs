mod remote;

pub use remote::{
    AuthRetry, HttpEndpoint, Method, NoPrompt, RemoteEndpoint, RemoteRequest, RemoteResponse,
    TokenPrompt, BUILDER_LOAD_ROUTE, BUILDER_SAVE_ROUTE, CONTENT_ROUTE, DEPLOY_ROUTE,
};

#[cfg(test)]
pub(crate) use remote::testing;

use crate::auth::{ADMIN_TOKEN_HEADER, CONSOLE_TOKEN_HEADER};
use crate::error::{FolioError, Result};
use crate::model::{demo_state, ContentDocument, SiteState};
use crate::storage::{
    LocalStorage, ADMIN_TOKEN_KEY, BUILDER_CACHE_KEY, SESSION_TOKEN_KEY, STATE_KEY,
};
use serde::Deserialize;

/// Characters of a failing response body kept in error messages.
const DETAIL_LIMIT: usize = 200;

pub const CONTENT_AUTH: AuthRetry = AuthRetry {
    header: CONSOLE_TOKEN_HEADER,
    storage_key: SESSION_TOKEN_KEY,
};

pub const BUILDER_AUTH: AuthRetry = AuthRetry {
    header: ADMIN_TOKEN_HEADER,
    storage_key: ADMIN_TOKEN_KEY,
};

/// Read the editor state from local storage. Never fails: a missing or
/// unreadable entry yields the demo dataset.
pub fn load_local(storage: &LocalStorage) -> SiteState {
    let raw = match storage.get_item(STATE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return demo_state(),
        Err(e) => {
            log::warn!("Local state unreadable, using demo data: {e}");
            return demo_state();
        }
    };
    match serde_json::from_str(&raw) {
        Ok(state) => state,
        Err(e) => {
            log::warn!("Local state is corrupt, using demo data: {e}");
            demo_state()
        }
    }
}

pub fn save_local(storage: &LocalStorage, state: &SiteState) -> Result<()> {
    let json = serde_json::to_string(state)?;
    storage.set_item(STATE_KEY, &json)
}

/// Outcome of a persist attempt. `Idle -> Saving -> Saved | NoChange | Error`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PersistStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    NoChange,
    Error(String),
}

impl PersistStatus {
    pub fn begin(&mut self) {
        *self = PersistStatus::Saving;
    }

    pub fn finish(&mut self, result: &Result<PushOutcome>) {
        *self = match result {
            Ok(outcome) if outcome.changed => PersistStatus::Saved,
            Ok(_) => PersistStatus::NoChange,
            Err(e) => PersistStatus::Error(e.to_string()),
        };
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PersistStatus::Idle | PersistStatus::Saving)
    }
}

/// Body of a successful `/content` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushOutcome {
    #[serde(default)]
    pub changed: bool,
    #[serde(default)]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub file_sha: Option<String>,
}

/// Commit the content document through the content proxy.
pub async fn push_content(
    endpoint: &dyn RemoteEndpoint,
    storage: &LocalStorage,
    prompt: &mut dyn TokenPrompt,
    doc: &ContentDocument,
) -> Result<PushOutcome> {
    let body = serde_json::json!({ "content": doc });
    let response = CONTENT_AUTH
        .send(endpoint, storage, prompt, RemoteRequest::post(CONTENT_ROUTE, Some(body)))
        .await?
        .error_for_status(DETAIL_LIMIT)?;

    let outcome: PushOutcome = response.json()?;
    if outcome.changed {
        log::info!(
            "Content committed: {}",
            outcome.commit_sha.as_deref().unwrap_or("?")
        );
    } else {
        log::info!("Content unchanged, no commit");
    }
    Ok(outcome)
}

/// Write the whole editor state through the builder proxy.
pub async fn save_builder_state(
    endpoint: &dyn RemoteEndpoint,
    storage: &LocalStorage,
    prompt: &mut dyn TokenPrompt,
    state: &SiteState,
) -> Result<()> {
    let body = serde_json::json!({ "state": state });
    BUILDER_AUTH
        .send(endpoint, storage, prompt, RemoteRequest::post(BUILDER_SAVE_ROUTE, Some(body)))
        .await?
        .error_for_status(DETAIL_LIMIT)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    Remote,
    Cache,
    Local,
}

#[derive(Debug, Clone)]
pub struct BuilderLoad {
    pub state: SiteState,
    pub source: LoadSource,
    /// Why the remote read was not used, when it wasn't.
    pub remote_error: Option<String>,
}

/// Read the builder state from the repository. On failure falls back to the
/// last state read successfully, then to local state (or demo data).
pub async fn load_builder_state(
    endpoint: &dyn RemoteEndpoint,
    storage: &LocalStorage,
    prompt: &mut dyn TokenPrompt,
) -> BuilderLoad {
    let remote_error = match fetch_builder_state(endpoint, storage, prompt).await {
        Ok((state, raw)) => {
            if let Err(e) = storage.set_item(BUILDER_CACHE_KEY, &raw) {
                log::warn!("Could not cache builder state: {e}");
            }
            return BuilderLoad {
                state,
                source: LoadSource::Remote,
                remote_error: None,
            };
        }
        Err(e) => {
            log::warn!("Builder load failed: {e}");
            e.to_string()
        }
    };

    let cached = storage
        .get_item(BUILDER_CACHE_KEY)
        .ok()
        .flatten()
        .and_then(|raw| serde_json::from_str::<SiteState>(&raw).ok());
    match cached {
        Some(state) => BuilderLoad {
            state,
            source: LoadSource::Cache,
            remote_error: Some(remote_error),
        },
        None => BuilderLoad {
            state: load_local(storage),
            source: LoadSource::Local,
            remote_error: Some(remote_error),
        },
    }
}

async fn fetch_builder_state(
    endpoint: &dyn RemoteEndpoint,
    storage: &LocalStorage,
    prompt: &mut dyn TokenPrompt,
) -> Result<(SiteState, String)> {
    let response = BUILDER_AUTH
        .send(endpoint, storage, prompt, RemoteRequest::get(BUILDER_LOAD_ROUTE))
        .await?
        .error_for_status(DETAIL_LIMIT)?;
    let state: SiteState = response
        .json()
        .map_err(|e| FolioError::Validation(format!("Builder state is not valid: {e}")))?;
    Ok((state, response.body))
}

#[cfg(test)]
mod tests {
    use super::testing::{FixedPrompt, ScriptedEndpoint};
    use super::*;
    use crate::model::ContentDocument;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_load_local_falls_back_to_demo() {
        let storage = LocalStorage::open_in_memory().unwrap();
        assert_eq!(load_local(&storage).pages.len(), demo_state().pages.len());
    }

    #[test]
    fn test_load_local_demo_is_stable_across_loads() {
        let storage = LocalStorage::open_in_memory().unwrap();
        let first = load_local(&storage);
        let second = load_local(&storage);
        assert_eq!(first, second);
        assert_eq!(first.pages[0].layout[0].id, second.pages[0].layout[0].id);

        storage.set_item(STATE_KEY, "{not json").unwrap();
        assert!(!load_local(&storage).pages.is_empty());
    }

    #[test]
    fn test_local_round_trip() {
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut state = demo_state();
        state.pages.truncate(1);
        save_local(&storage, &state).unwrap();
        assert_eq!(load_local(&storage), state);
    }

    #[test]
    fn test_persist_status_transitions() {
        let mut status = PersistStatus::default();
        status.begin();
        assert_eq!(status, PersistStatus::Saving);
        assert!(!status.is_terminal());

        status.finish(&Ok(PushOutcome {
            changed: false,
            commit_sha: None,
            file_sha: Some("f".into()),
        }));
        assert_eq!(status, PersistStatus::NoChange);

        status.finish(&Err(FolioError::Remote {
            status: 409,
            detail: "conflict".into(),
        }));
        assert!(matches!(status, PersistStatus::Error(_)));
        assert!(status.is_terminal());
    }

    #[tokio::test]
    async fn test_push_content_outcome() {
        let endpoint = ScriptedEndpoint::new(vec![
            (200, r#"{"ok":true,"changed":true,"commitSha":"c1","fileSha":"f1"}"#),
            (200, r#"{"ok":true,"changed":false,"fileSha":"f1"}"#),
        ]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let doc = ContentDocument::from_pages(&demo_state().pages, "now");

        let first = push_content(&endpoint, &storage, &mut NoPrompt, &doc)
            .await
            .unwrap();
        assert!(first.changed);
        assert_eq!(first.commit_sha.as_deref(), Some("c1"));

        let second = push_content(&endpoint, &storage, &mut NoPrompt, &doc)
            .await
            .unwrap();
        assert!(!second.changed);

        let sent = endpoint.sent();
        assert_eq!(sent[0].path, CONTENT_ROUTE);
        assert!(sent[0].body.as_ref().unwrap()["content"]["pages"].is_object());
    }

    #[tokio::test]
    async fn test_push_content_failure_detail() {
        let endpoint = ScriptedEndpoint::new(vec![(
            502,
            r#"{"ok":false,"error":"GitHub write failed","status":409,"detail":"sha mismatch"}"#,
        )]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let doc = ContentDocument::from_pages(&demo_state().pages, "now");

        let err = push_content(&endpoint, &storage, &mut NoPrompt, &doc)
            .await
            .unwrap_err();
        match err {
            FolioError::Remote { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "sha mismatch");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_builder_save_uses_admin_header() {
        let endpoint = ScriptedEndpoint::new(vec![(401, "Unauthorized"), (200, "{\"ok\":true}")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut prompt = FixedPrompt(Some("admin-secret"), 0);

        save_builder_state(&endpoint, &storage, &mut prompt, &demo_state())
            .await
            .unwrap();

        let sent = endpoint.sent();
        assert_eq!(sent[1].header(ADMIN_TOKEN_HEADER), Some("admin-secret"));
        assert!(sent[1].body.as_ref().unwrap()["state"]["pages"].is_array());
    }

    #[tokio::test]
    async fn test_builder_load_caches_then_falls_back() {
        let mut remote = demo_state();
        remote.version = "remote".into();
        let body = serde_json::to_string(&remote).unwrap();

        let endpoint = ScriptedEndpoint::new(vec![(200, body.as_str()), (502, "GitHub down")]);
        let storage = LocalStorage::open_in_memory().unwrap();

        let first = load_builder_state(&endpoint, &storage, &mut NoPrompt).await;
        assert_eq!(first.source, LoadSource::Remote);
        assert_eq!(first.state.version, "remote");

        let second = load_builder_state(&endpoint, &storage, &mut NoPrompt).await;
        assert_eq!(second.source, LoadSource::Cache);
        assert_eq!(second.state.version, "remote");
        assert!(second.remote_error.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_builder_load_without_cache_uses_local() {
        let endpoint = ScriptedEndpoint::new(vec![(500, "Missing env vars")]);
        let storage = LocalStorage::open_in_memory().unwrap();
        let mut local = demo_state();
        local.version = "local".into();
        save_local(&storage, &local).unwrap();

        let loaded = load_builder_state(&endpoint, &storage, &mut NoPrompt).await;
        assert_eq!(loaded.source, LoadSource::Local);
        assert_eq!(loaded.state.version, "local");
    }
}
