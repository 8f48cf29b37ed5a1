mod config;
mod event;
mod github;
mod llm;
mod prompt;
mod run;

use clap::Parser;
use colored::Colorize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// PR Review Bot — fetches a pull request's diff and changed files, asks an
/// LLM for a review, and posts the result as a PR comment. Runs once per
/// pull_request event.
#[derive(Parser, Debug)]
#[command(name = "pr-review-bot", version, about)]
struct Cli {
    /// Path to the event payload JSON (defaults to $GITHUB_EVENT_PATH)
    #[arg(long)]
    event: Option<PathBuf>,

    /// Run everything except the comment post and print the review instead
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = execute(Cli::parse()).await {
        error!("{err}");
        std::process::exit(1);
    }
}

async fn execute(cli: Cli) -> Result<(), run::RunError> {
    info!("loading configuration");
    let config = config::Config::load()?;

    let event_path = cli
        .event
        .or_else(|| std::env::var_os("GITHUB_EVENT_PATH").map(PathBuf::from))
        .ok_or(event::EventError::MissingPayloadPath)?;

    info!(path = %event_path.display(), "reading event payload");
    let payload = event::load_payload(&event_path)?;
    let repository = std::env::var("GITHUB_REPOSITORY").ok();
    let ctx = event::resolve_context(&payload, repository.as_deref())?;
    info!(owner = %ctx.owner, repo = %ctx.repo, pr = ctx.number, "resolved pull request");

    let host = github::GithubClient::new(config.github_token.clone());
    let model = llm::OpenAiClient::new(
        config.openai_api_key.clone(),
        config.model.clone(),
        config.max_tokens,
    );

    let outcome = run::run(&config, &ctx, &host, &model, cli.dry_run).await?;

    if outcome.posted {
        info!(files = outcome.changed_files, "PR review comment posted");
    } else {
        let heading = format!("Review for {}/{}#{}", ctx.owner, ctx.repo, ctx.number);
        println!("{}", heading.bold());
        println!();
        println!("{}", outcome.review);
    }

    Ok(())
}
