use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::{Config, ConfigError};
use crate::event::{EventError, PullRequestContext};
use crate::github::{ChangedFile, GithubError};
use crate::llm::ModelError;
use crate::prompt;

/// Page size of the changed-file listing; a short page ends the loop.
pub const FILES_PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Event(#[from] EventError),

    #[error(transparent)]
    Github(#[from] GithubError),

    #[error("Model invocation failed: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to post review comment: {0}")]
    CommentPost(#[source] GithubError),
}

/// The hosting-platform operations a run needs. Implemented by GithubClient
/// and by in-test fakes.
#[async_trait]
pub trait PullRequestHost: Send + Sync {
    /// Fetch one page of the changed-file listing, up to `per_page` entries.
    async fn list_files_page(
        &self,
        ctx: &PullRequestContext,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<ChangedFile>, GithubError>;

    /// Fetch the PR's unified diff as raw text.
    async fn fetch_diff(&self, ctx: &PullRequestContext) -> Result<String, GithubError>;

    /// Create a new comment on the PR.
    async fn post_comment(&self, ctx: &PullRequestContext, body: &str)
        -> Result<(), GithubError>;
}

/// One system/user chat-completion exchange returning the generated text.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}

#[derive(Debug)]
pub struct RunOutcome {
    /// Trimmed model output; the comment body when posted.
    pub review: String,
    pub changed_files: usize,
    pub posted: bool,
}

/// Execute one run against an already-resolved pull request: fetch the
/// changed files and diff, assemble the prompt, invoke the model, and post
/// the trimmed reply as a comment. Every step is awaited in sequence and the
/// first error ends the run; nothing is retried and nothing is posted after
/// a failure.
#[instrument(skip_all, fields(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.number))]
pub async fn run(
    config: &Config,
    ctx: &PullRequestContext,
    host: &dyn PullRequestHost,
    model: &dyn ChatCompletion,
    dry_run: bool,
) -> Result<RunOutcome, RunError> {
    info!("fetching changed files");
    let files = fetch_changed_files(ctx, host).await?;
    info!(files = files.len(), "changed files fetched");

    info!("fetching diff");
    let diff = host.fetch_diff(ctx).await?;
    info!(diff_bytes = diff.len(), "diff fetched");

    let file_list = prompt::render_file_list(&files);
    let user_prompt = prompt::assemble(config.template.as_deref(), &file_list, &diff);
    let system_prompt = config
        .system_prompt
        .as_deref()
        .unwrap_or(prompt::DEFAULT_SYSTEM_PROMPT);

    info!(model = %config.model, "invoking chat completion");
    let review = model
        .complete(system_prompt, &user_prompt)
        .await?
        .trim()
        .to_string();

    if dry_run {
        info!("dry run, skipping comment post");
        return Ok(RunOutcome {
            review,
            changed_files: files.len(),
            posted: false,
        });
    }

    host.post_comment(ctx, &review)
        .await
        .map_err(RunError::CommentPost)?;
    info!("review comment posted");

    Ok(RunOutcome {
        review,
        changed_files: files.len(),
        posted: true,
    })
}

/// Collect the full changed-file list, page by page in retrieval order,
/// starting at page 1 and stopping on the first page shorter than
/// FILES_PER_PAGE. Always issues at least one request.
async fn fetch_changed_files(
    ctx: &PullRequestContext,
    host: &dyn PullRequestHost,
) -> Result<Vec<ChangedFile>, GithubError> {
    let mut files = Vec::new();
    let mut page = 1u32;
    loop {
        let chunk = host.list_files_page(ctx, page, FILES_PER_PAGE).await?;
        let chunk_len = chunk.len() as u32;
        files.extend(chunk);
        if chunk_len < FILES_PER_PAGE {
            break;
        }
        page += 1;
    }
    Ok(files)
}
