use serde_json::Value;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Event payload path not provided (set GITHUB_EVENT_PATH or pass --event)")]
    MissingPayloadPath,

    #[error("Failed to read event payload: {0}")]
    PayloadRead(#[from] std::io::Error),

    #[error("Failed to parse event payload: {0}")]
    PayloadParse(#[from] serde_json::Error),

    #[error("This bot runs only on pull_request events.")]
    NotPullRequest,

    #[error("Pull request number missing from event payload")]
    MissingNumber,

    #[error("Repository not resolvable from environment or event payload")]
    MissingRepository,
}

/// The pull request a run operates on. Resolved exactly once from the
/// event payload before any API call is made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestContext {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

/// Read and parse the event payload JSON from disk.
pub fn load_payload(path: &Path) -> Result<Value, EventError> {
    let contents = fs::read_to_string(path)?;
    let payload = serde_json::from_str(&contents)?;
    Ok(payload)
}

/// Resolve owner/repo/number from an event payload.
///
/// The number comes from `pull_request.number`; a payload without a
/// `pull_request` field is not a pull-request event and fails here, before
/// any collaborator call. Owner and repo come from the `repository`
/// argument ("owner/repo", the GITHUB_REPOSITORY convention) when set,
/// falling back to `repository.full_name` in the payload.
pub fn resolve_context(
    payload: &Value,
    repository: Option<&str>,
) -> Result<PullRequestContext, EventError> {
    let pull_request = payload
        .get("pull_request")
        .ok_or(EventError::NotPullRequest)?;

    let number = pull_request
        .get("number")
        .and_then(Value::as_u64)
        .ok_or(EventError::MissingNumber)?;

    let full_name = match repository {
        Some(name) => name.to_string(),
        None => payload
            .get("repository")
            .and_then(|r| r.get("full_name"))
            .and_then(Value::as_str)
            .ok_or(EventError::MissingRepository)?
            .to_string(),
    };

    let (owner, repo) = full_name
        .split_once('/')
        .ok_or(EventError::MissingRepository)?;
    if owner.is_empty() || repo.is_empty() {
        return Err(EventError::MissingRepository);
    }

    Ok(PullRequestContext {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SAMPLE_EVENT: &str = include_str!("../tests/fixtures/pull_request_event.json");

    #[test]
    fn test_resolve_from_fixture() {
        let payload: Value = serde_json::from_str(SAMPLE_EVENT).unwrap();
        let ctx = resolve_context(&payload, None).unwrap();
        assert_eq!(ctx.owner, "acme");
        assert_eq!(ctx.repo, "widgets");
        assert_eq!(ctx.number, 42);
    }

    #[test]
    fn test_repository_env_takes_precedence() {
        let payload: Value = serde_json::from_str(SAMPLE_EVENT).unwrap();
        let ctx = resolve_context(&payload, Some("octo/fork")).unwrap();
        assert_eq!(ctx.owner, "octo");
        assert_eq!(ctx.repo, "fork");
        assert_eq!(ctx.number, 42);
    }

    #[test]
    fn test_non_pull_request_event_rejected() {
        let payload = json!({
            "ref": "refs/heads/main",
            "repository": { "full_name": "acme/widgets" }
        });
        let err = resolve_context(&payload, None).unwrap_err();
        assert!(matches!(err, EventError::NotPullRequest));
    }

    #[test]
    fn test_missing_number_rejected() {
        let payload = json!({
            "pull_request": { "title": "no number here" },
            "repository": { "full_name": "acme/widgets" }
        });
        let err = resolve_context(&payload, None).unwrap_err();
        assert!(matches!(err, EventError::MissingNumber));
    }

    #[test]
    fn test_missing_repository_rejected() {
        let payload = json!({ "pull_request": { "number": 7 } });
        let err = resolve_context(&payload, None).unwrap_err();
        assert!(matches!(err, EventError::MissingRepository));
    }

    #[test]
    fn test_malformed_full_name_rejected() {
        let payload = json!({
            "pull_request": { "number": 7 },
            "repository": { "full_name": "no-slash-here" }
        });
        let err = resolve_context(&payload, None).unwrap_err();
        assert!(matches!(err, EventError::MissingRepository));
    }
}
