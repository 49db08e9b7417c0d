use anyhow::{anyhow, Result};
use std::future::Future;
use std::io::Write;

use super::prompt::{LineEditor, LineSource, ReadOutcome, USER_PROMPT};
use super::render::TerminalSink;
use crate::llm::{ChatSession, TurnOutcome};

pub async fn run() -> Result<()> {
    let mut session = ChatSession::new(super::gateway(None)?);
    let mut sink = TerminalSink::stdout();
    let mut editor = LineEditor::spawn()?;

    sink.println(&format!("💬 Chat Mode (model: {})", session.model()));
    sink.println("Starting interactive session... Type \"exit\" to quit, Ctrl-C stops a reply");

    run_repl(&mut session, &mut editor, &mut sink, interrupted).await
}

/// Read lines from `lines` and run them through `session` until the exit
/// keyword, end of input, or an interrupt at the prompt.
///
/// `interrupt` is called once per wait; the future it returns completes when
/// the user asks to stop. At the prompt that ends the REPL, during a reply it
/// cancels the turn.
pub async fn run_repl<L, W, I, F>(
    session: &mut ChatSession,
    lines: &mut L,
    sink: &mut TerminalSink<W>,
    interrupt: I,
) -> Result<()>
where
    L: LineSource,
    W: Write + Send,
    I: Fn() -> F,
    F: Future<Output = ()>,
{
    session.start();

    loop {
        sink.print("\n");
        let outcome = tokio::select! {
            outcome = lines.read_line(USER_PROMPT) => outcome,
            _ = interrupt() => ReadOutcome::Interrupted,
        };
        let line = match outcome {
            ReadOutcome::Line(line) => line,
            ReadOutcome::Interrupted | ReadOutcome::Eof => {
                sink.println("\n👋 Goodbye!");
                break;
            }
            ReadOutcome::Failed(e) => return Err(anyhow!("Failed to read input: {e}")),
        };

        if !session.is_exit_command(&line) {
            sink.reply_label();
        }
        match session.handle_input_until(&line, &mut *sink, interrupt()).await? {
            TurnOutcome::Exited => {
                sink.println("\n👋 Goodbye!");
                break;
            }
            TurnOutcome::Replied(_) | TurnOutcome::Failed(_) | TurnOutcome::Cancelled => {}
        }
    }

    Ok(())
}

/// Completes on Ctrl-C. Never completes if the signal handler cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::models::Role;
    use crate::llm::test_support::{Script, ScriptedGateway};
    use crate::llm::SessionState;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Arc;

    struct ScriptedLines(VecDeque<ReadOutcome>);

    impl ScriptedLines {
        fn lines(lines: &[&str]) -> Self {
            Self(lines.iter().map(|l| ReadOutcome::Line(l.to_string())).collect())
        }
    }

    #[async_trait]
    impl LineSource for ScriptedLines {
        async fn read_line(&mut self, _prompt: &str) -> ReadOutcome {
            self.0.pop_front().unwrap_or(ReadOutcome::Eof)
        }
    }

    /// A terminal nobody types into.
    struct SilentTerminal;

    #[async_trait]
    impl LineSource for SilentTerminal {
        async fn read_line(&mut self, _prompt: &str) -> ReadOutcome {
            std::future::pending().await
        }
    }

    fn never() -> std::future::Pending<()> {
        std::future::pending()
    }

    #[tokio::test]
    async fn test_repl_runs_turns_until_exit() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Script::Reply(vec!["Hi", " there", "!"])]));
        let mut session = ChatSession::new(gateway.clone());
        let mut sink = TerminalSink::new(Vec::new());
        let mut lines = ScriptedLines::lines(&["hello", "EXIT", "never sent"]);

        run_repl(&mut session, &mut lines, &mut sink, never).await.unwrap();

        assert_eq!(session.state(), SessionState::Exited);
        assert_eq!(gateway.calls(), 1);
        let roles: Vec<Role> = session.transcript().turns().iter().map(|t| t.role()).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::Assistant]);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("🔥 FORGE: Hi there!"));
        assert!(output.contains("Goodbye"));
    }

    #[tokio::test]
    async fn test_repl_continues_after_failure() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Script::DropAfter(vec!["par"]),
            Script::Reply(vec!["recovered"]),
        ]));
        let mut session = ChatSession::new(gateway.clone());
        let mut sink = TerminalSink::new(Vec::new());
        let mut lines = ScriptedLines::lines(&["one", "two"]);

        run_repl(&mut session, &mut lines, &mut sink, never).await.unwrap();

        assert_eq!(gateway.calls(), 2);
        let contents: Vec<&str> =
            session.transcript().turns().iter().skip(1).map(|t| t.content()).collect();
        assert_eq!(contents, vec!["one", "two", "recovered"]);

        let output = String::from_utf8(sink.into_inner()).unwrap();
        assert!(output.contains("❌ Error: Stream interrupted"));
    }

    #[tokio::test]
    async fn test_repl_ends_at_end_of_input() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let mut session = ChatSession::new(gateway.clone());
        let mut sink = TerminalSink::new(Vec::new());

        run_repl(&mut session, &mut ScriptedLines::lines(&[]), &mut sink, never).await.unwrap();

        assert_eq!(gateway.calls(), 0);
        assert_eq!(session.state(), SessionState::AwaitingInput);
    }

    #[tokio::test]
    async fn test_interrupt_at_prompt_returns_without_waiting_for_a_line() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let mut session = ChatSession::new(gateway.clone());
        let mut sink = TerminalSink::new(Vec::new());

        run_repl(&mut session, &mut SilentTerminal, &mut sink, || async {}).await.unwrap();

        assert_eq!(gateway.calls(), 0);
        assert_eq!(session.transcript().len(), 1);
        assert!(String::from_utf8(sink.into_inner()).unwrap().contains("Goodbye"));
    }

    #[tokio::test]
    async fn test_editor_interrupt_ends_repl() {
        let gateway = Arc::new(ScriptedGateway::new(vec![Script::Reply(vec!["ok"])]));
        let mut session = ChatSession::new(gateway.clone());
        let mut sink = TerminalSink::new(Vec::new());
        let mut lines = ScriptedLines(VecDeque::from(vec![
            ReadOutcome::Line("first".to_string()),
            ReadOutcome::Interrupted,
            ReadOutcome::Line("never sent".to_string()),
        ]));

        run_repl(&mut session, &mut lines, &mut sink, never).await.unwrap();

        assert_eq!(gateway.calls(), 1);
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert_eq!(session.transcript().len(), 3);
    }

    #[tokio::test]
    async fn test_read_failure_is_reported() {
        let gateway = Arc::new(ScriptedGateway::new(vec![]));
        let mut session = ChatSession::new(gateway);
        let mut sink = TerminalSink::new(Vec::new());
        let mut lines = ScriptedLines(VecDeque::from(vec![ReadOutcome::Failed("tty".to_string())]));

        let result = run_repl(&mut session, &mut lines, &mut sink, never).await;

        assert!(result.is_err());
    }
}
