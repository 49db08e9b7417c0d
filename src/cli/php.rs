use anyhow::Result;

use crate::llm::prompts::{wordpress_plugin_prompt, wordpress_theme_prompt};
use crate::llm::OneShotQuery;

const UNKNOWN_ACTION: &str = "⚠️ Unknown action. Use: plugin, theme, or analyze";

/// A generation request built from a `php` action.
#[derive(Debug, PartialEq, Eq)]
pub struct Scaffold {
    pub title: String,
    pub prompt: String,
}

/// Build the scaffold for `action`, or `None` for actions without a template.
pub fn scaffold(action: &str, args: &[String]) -> Option<Scaffold> {
    match action {
        "plugin" => {
            let name = args.first().map(String::as_str).unwrap_or("my-plugin");
            let description = match args.get(1..) {
                Some(rest) if !rest.is_empty() => rest.join(" "),
                _ => "A custom WordPress plugin".to_string(),
            };
            Some(Scaffold {
                title: format!("WordPress Plugin: {name}"),
                prompt: wordpress_plugin_prompt(name, &description),
            })
        }
        "theme" => {
            let name = args.first().map(String::as_str).unwrap_or("my-theme");
            Some(Scaffold {
                title: format!("WordPress Theme: {name}"),
                prompt: wordpress_theme_prompt(name),
            })
        }
        _ => None,
    }
}

pub async fn run(action: &str, args: &[String]) -> Result<()> {
    let Some(scaffold) = scaffold(action, args) else {
        eprintln!("{UNKNOWN_ACTION}");
        return Ok(());
    };

    let query = OneShotQuery::new(super::gateway(None)?);
    println!("⚡ FORGE PHP: {action}...");
    let code = query.generate(&scaffold.prompt).await?;
    println!("\n✨ {}\n\n{code}", scaffold.title);

    Ok(())
}
