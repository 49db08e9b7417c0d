use anyhow::{Context, Result};
use clap::Subcommand;
use futures::stream::StreamExt;
use std::path::{Path, PathBuf};

use super::render::TerminalSink;
use crate::llm::prompts::{file_question_prompt, FILE_ANALYST_PERSONA};
use crate::llm::OneShotQuery;

#[derive(Subcommand)]
pub enum FsAction {
    /// Ask DeepSeek about a file's contents
    Ask {
        /// File to ask about
        path: PathBuf,

        /// Your question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

pub async fn run(action: FsAction) -> Result<()> {
    match action {
        FsAction::Ask { path, question } => ask(&path, &question.join(" ")).await,
    }
}

async fn ask(path: &Path, question: &str) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let query = OneShotQuery::new(super::gateway(None)?);

    let prompt = file_question_prompt(&path.display().to_string(), &extension(path), &content, question);

    let mut out = TerminalSink::stdout();
    out.println(&format!("\n🔨 Analyzing {}...\n", path.display()));
    let mut fragments = query.consult_stream(FILE_ANALYST_PERSONA, &prompt);
    while let Some(fragment) = fragments.next().await {
        out.print(&fragment?);
    }
    out.println("");

    Ok(())
}

/// Dotted extension (`.rs`), or an empty string.
fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
