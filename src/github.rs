use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use crate::event::PullRequestContext;
use crate::run::PullRequestHost;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("GitHub API request failed: {0}")]
    ApiRequest(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// One entry of the paginated changed-file listing. Only the filename is
/// consumed; the remaining response fields are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
}

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = "pr-review-bot";

/// Thin client over the GitHub REST endpoints the run needs: the changed-file
/// listing, the raw diff, and comment creation.
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    api_base: String,
}

impl GithubClient {
    pub fn new(token: String) -> Self {
        GithubClient {
            http: reqwest::Client::new(),
            token,
            api_base: API_BASE.to_string(),
        }
    }

    fn pulls_url(&self, ctx: &PullRequestContext) -> String {
        format!(
            "{}/repos/{}/{}/pulls/{}",
            self.api_base, ctx.owner, ctx.repo, ctx.number
        )
    }
}

/// Surface non-success responses with the body GitHub sent; its error
/// payloads name the actual problem (bad credentials, rate limit, not found).
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GithubError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GithubError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PullRequestHost for GithubClient {
    async fn list_files_page(
        &self,
        ctx: &PullRequestContext,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ChangedFile>, GithubError> {
        debug!(page, per_page, "fetching changed-files page");
        let response = self
            .http
            .get(format!("{}/files", self.pulls_url(ctx)))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .query(&[
                ("per_page", per_page.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .await?;
        let files = check_status(response).await?.json::<Vec<ChangedFile>>().await?;
        debug!(count = files.len(), "received changed-files page");
        Ok(files)
    }

    async fn fetch_diff(&self, ctx: &PullRequestContext) -> Result<String, GithubError> {
        debug!("fetching PR diff from GitHub API");
        let response = self
            .http
            .get(self.pulls_url(ctx))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github.diff")
            .send()
            .await?;
        let diff = check_status(response).await?.text().await?;
        debug!(diff_bytes = diff.len(), "received PR diff");
        Ok(diff)
    }

    async fn post_comment(
        &self,
        ctx: &PullRequestContext,
        body: &str,
    ) -> Result<(), GithubError> {
        debug!(body_bytes = body.len(), "posting PR comment");
        let response = self
            .http
            .post(format!(
                "{}/repos/{}/{}/issues/{}/comments",
                self.api_base, ctx.owner, ctx.repo, ctx.number
            ))
            .header("User-Agent", USER_AGENT)
            .bearer_auth(&self.token)
            .json(&json!({ "body": body }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_file_ignores_extra_fields() {
        let raw = r#"[
            {"filename": "src/lib.rs", "status": "modified", "additions": 3, "deletions": 1},
            {"filename": "README.md", "status": "added", "additions": 10, "deletions": 0}
        ]"#;
        let files: Vec<ChangedFile> = serde_json::from_str(raw).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].filename, "src/lib.rs");
        assert_eq!(files[1].filename, "README.md");
    }

    #[test]
    fn test_pulls_url_shape() {
        let client = GithubClient {
            http: reqwest::Client::new(),
            token: "t".to_string(),
            api_base: "https://github.example".to_string(),
        };
        let ctx = PullRequestContext {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            number: 42,
        };
        assert_eq!(
            client.pulls_url(&ctx),
            "https://github.example/repos/acme/widgets/pulls/42"
        );
    }

    #[test]
    fn test_status_error_carries_response_body() {
        let err = GithubError::Status {
            status: 403,
            body: "rate limit exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "GitHub API returned 403: rate limit exceeded");
    }
}
