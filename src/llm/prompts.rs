//! Standing personas and prompt builders.

/// System turn for conversational and question-answering exchanges.
pub const ASSISTANT_PERSONA: &str =
    "You are FORGE, an AI coding assistant. Help with code, answer questions, and provide expert guidance.";

/// System turn for code generation exchanges.
pub const GENERATOR_PERSONA: &str =
    "You are FORGE, an expert code generator. Generate clean, well-documented code based on the request.";

/// System turn for questions about a single file.
pub const FILE_ANALYST_PERSONA: &str =
    "You are a helpful coding assistant. Answer questions about the provided file.";

/// System turn for explaining a failed shell command.
pub const DEBUGGER_PERSONA: &str =
    "You are a debugging assistant. Analyze command output and explain what went wrong.";

/// Lines of each output stream included in a command analysis.
const ANALYSIS_TAIL_LINES: usize = 20;

const FILE_CONTEXT_HEADER: &str = "Here are the files I'm working with:\n\n";

/// Frame a file's contents as a context block.
pub fn frame_file(path: &str, content: &str) -> String {
    format!("File: {path}\n```\n{content}\n```")
}

/// Place context blocks ahead of a question.
///
/// Each block is included verbatim and the question is kept as an unmodified
/// suffix. With no blocks the question is returned as is.
pub fn with_file_context(question: &str, context_blocks: &[String]) -> String {
    if context_blocks.is_empty() {
        return question.to_string();
    }
    format!("{}{}\n\nQuestion: {}", FILE_CONTEXT_HEADER, context_blocks.join("\n"), question)
}

/// A question about one file, with the file inlined ahead of it.
pub fn file_question_prompt(path: &str, extension: &str, content: &str, question: &str) -> String {
    format!(
        "File: {path}\nExtension: {extension}\n\nContent:\n```\n{content}\n```\n\nQuestion: {question}"
    )
}

/// Describe a finished command for analysis. Only the last lines of each
/// output stream are kept.
pub fn command_analysis_prompt(command: &str, return_code: i32, stdout: &str, stderr: &str) -> String {
    format!(
        "Command: {command}\nReturn code: {return_code}\n\nSTDOUT:\n{}\n\nSTDERR:\n{}\n",
        tail(stdout, ANALYSIS_TAIL_LINES),
        tail(stderr, ANALYSIS_TAIL_LINES)
    )
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}

pub fn code_generation_prompt(language: &str, description: &str) -> String {
    format!("Generate {language} code for: {description}")
}

pub fn wordpress_plugin_prompt(name: &str, description: &str) -> String {
    format!(
        "Generate a complete WordPress plugin:\n\
         Name: {name}\n\
         Description: {description}\n\
         \n\
         Include:\n\
         - Plugin header with proper metadata\n\
         - Admin menu setup\n\
         - Shortcode implementation\n\
         - Proper security (escaping, nonces)\n\
         - Internationalization ready"
    )
}

pub fn wordpress_theme_prompt(name: &str) -> String {
    format!("Generate a WordPress theme structure for: {name}")
}
