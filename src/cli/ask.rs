use anyhow::Result;
use futures::stream::StreamExt;
use std::path::PathBuf;

use super::context::load_context_blocks;
use super::render::TerminalSink;
use crate::llm::OneShotQuery;

pub async fn run(question: &str, files: &[PathBuf], model: Option<String>, stream: bool) -> Result<()> {
    let query = OneShotQuery::new(super::gateway(model)?);

    let context = load_context_blocks(files).await;
    if !files.is_empty() {
        println!("\n📁 Including files:");
        for (path, error) in &context.skipped {
            eprintln!("  ✗ {} ({})", path.display(), error);
        }
        println!("  ✓ {} of {} file(s)", context.blocks.len(), files.len());
    }

    if stream {
        let mut out = TerminalSink::stdout();
        out.println("\n✨ FORGE responds:\n");
        let mut fragments = query.ask_stream(question, &context.blocks);
        while let Some(fragment) = fragments.next().await {
            out.print(&fragment?);
        }
        out.println("");
    } else {
        let answer = query.ask(question, &context.blocks).await?;
        println!("\n✨ FORGE responds:\n\n{answer}");
    }

    Ok(())
}
