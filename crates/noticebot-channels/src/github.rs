//! GitHub Actions `workflow_dispatch` trigger.

use std::time::Duration;

use async_trait::async_trait;
use noticebot_core::config::GitHubConfig;
use noticebot_core::error::{NoticeBotError, Result};
use noticebot_core::traits::WorkflowTrigger;

const API_VERSION: &str = "2022-11-28";

/// Dispatches one configured workflow on one ref.
pub struct GitHubWorkflow {
    config: GitHubConfig,
    client: reqwest::Client,
}

impl GitHubWorkflow {
    pub fn new(config: GitHubConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn dispatch_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/actions/workflows/{}/dispatches",
            self.config.api_base.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            self.config.workflow
        )
    }
}

#[async_trait]
impl WorkflowTrigger for GitHubWorkflow {
    /// GitHub answers an accepted dispatch with 204 and no body; any other
    /// status is a rejection.
    async fn trigger(&self) -> Result<()> {
        tracing::info!(
            "🚀 Dispatching workflow {}/{}:{} on {}",
            self.config.owner,
            self.config.repo,
            self.config.workflow,
            self.config.git_ref
        );

        let response = self
            .client
            .post(self.dispatch_url())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
            .header("User-Agent", concat!("noticebot/", env!("CARGO_PKG_VERSION")))
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "ref": self.config.git_ref }))
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| NoticeBotError::Http(format!("Workflow dispatch failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NO_CONTENT {
            tracing::info!("✅ Workflow dispatched");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(NoticeBotError::Trigger {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn workflow(api_base: String) -> GitHubWorkflow {
        GitHubWorkflow::new(GitHubConfig {
            token: "ghp_test".into(),
            owner: "octo".into(),
            repo: "notices".into(),
            workflow: "main.yml".into(),
            git_ref: "main".into(),
            api_base,
            timeout_secs: 5,
        })
    }

    const DISPATCH_PATH: &str = "/repos/octo/notices/actions/workflows/main.yml/dispatches";

    #[test]
    fn test_dispatch_url() {
        let wf = workflow("https://api.github.com/".into());
        assert_eq!(
            wf.dispatch_url(),
            "https://api.github.com/repos/octo/notices/actions/workflows/main.yml/dispatches"
        );
    }

    #[tokio::test]
    async fn test_trigger_accepted_on_204() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", DISPATCH_PATH)
            .match_header("authorization", "Bearer ghp_test")
            .match_header("x-github-api-version", API_VERSION)
            .match_body(Matcher::Json(serde_json::json!({"ref": "main"})))
            .with_status(204)
            .create_async()
            .await;

        workflow(server.url()).trigger().await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_trigger_rejected_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DISPATCH_PATH)
            .with_status(404)
            .with_body(r#"{"message": "Not Found"}"#)
            .create_async()
            .await;

        let err = workflow(server.url()).trigger().await.unwrap_err();
        match err {
            NoticeBotError::Trigger { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not Found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_trigger_success_status_other_than_204_is_rejection() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", DISPATCH_PATH)
            .with_status(200)
            .create_async()
            .await;

        let err = workflow(server.url()).trigger().await.unwrap_err();
        assert_eq!(err.status_label(), "200");
    }
}
