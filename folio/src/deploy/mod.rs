// Deploy trigger: asks the deploy proxy to fire the build hook

use crate::error::{FolioError, Result};
use crate::persistence::{RemoteEndpoint, RemoteRequest, DEPLOY_ROUTE};

/// Body characters kept when a deploy request fails.
const FAILURE_BODY_LIMIT: usize = 200;

/// POST with no body to the deploy proxy. Succeeds iff the proxy answers 2xx;
/// whether the resulting build succeeds is not observable from here.
pub async fn trigger_deploy(endpoint: &dyn RemoteEndpoint) -> Result<()> {
    let response = endpoint.send(RemoteRequest::post(DEPLOY_ROUTE, None)).await?;
    if !response.is_success() {
        let body: String = response.body.chars().take(FAILURE_BODY_LIMIT).collect();
        return Err(FolioError::Remote {
            status: response.status,
            detail: format!("Deploy failed ({}): {}", response.status, body),
        });
    }
    log::info!("Deploy triggered");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::testing::ScriptedEndpoint;
    use crate::persistence::Method;

    #[tokio::test]
    async fn test_deploy_success() {
        let endpoint = ScriptedEndpoint::new(vec![(200, "{\"ok\":true}")]);
        trigger_deploy(&endpoint).await.unwrap();

        let sent = endpoint.sent();
        assert_eq!(sent[0].method, Method::Post);
        assert_eq!(sent[0].path, DEPLOY_ROUTE);
        assert!(sent[0].body.is_none());
    }

    #[tokio::test]
    async fn test_deploy_failure_truncates_body() {
        let long = "e".repeat(600);
        let endpoint = ScriptedEndpoint::new(vec![(502, long.as_str())]);
        let err = trigger_deploy(&endpoint).await.unwrap_err();
        match err {
            FolioError::Remote { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, format!("Deploy failed (502): {}", "e".repeat(200)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
