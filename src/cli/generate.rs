use anyhow::Result;

use crate::llm::prompts::code_generation_prompt;
use crate::llm::OneShotQuery;

pub async fn run(description: &str, language: &str) -> Result<()> {
    let query = OneShotQuery::new(super::gateway(None)?);

    println!("🔥 FORGE is generating code...");
    let code = query.generate(&code_generation_prompt(language, description)).await?;
    println!("\n✨ {language} Code:\n\n{code}");

    Ok(())
}
