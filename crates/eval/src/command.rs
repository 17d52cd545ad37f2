use crate::error::{EvalError, Result};
use crate::{Evaluator, Session};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

/// Compiled-session style backend driving an external REPL process.
///
/// One subprocess per session, spawned with the evaluation root as its
/// working directory. The wire protocol is line-oriented:
///
/// - `:load <path>` loads a file; the process answers one line, `ok` or
///   `error: <message>`.
/// - any other line is an expression; the process answers one line holding
///   the textual result, or `error: <message>`.
///
/// The process is killed when the session drops, so an aborted evaluation
/// leaves nothing behind.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    program: String,
    args: Vec<String>,
}

impl CommandEvaluator {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Evaluator for CommandEvaluator {
    async fn open_session(&self, root: &Path) -> Result<Box<dyn Session>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| EvalError::session(format!("failed to spawn {}: {e}", self.program)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EvalError::session("evaluator stdin unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EvalError::session("evaluator stdout unavailable"))?;

        log::debug!("opened evaluator session `{}` in {}", self.program, root.display());
        Ok(Box::new(CommandSession {
            _child: child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        }))
    }
}

struct CommandSession {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl CommandSession {
    async fn round_trip(&mut self, request: &str) -> Result<String> {
        self.stdin.write_all(request.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;

        let line = self
            .stdout
            .next_line()
            .await?
            .ok_or_else(|| EvalError::session("evaluator process closed its stdout"))?;
        if let Some(message) = line.strip_prefix("error: ") {
            return Err(EvalError::evaluation(message.to_string()));
        }
        Ok(line)
    }
}

#[async_trait]
impl Session for CommandSession {
    async fn load_file(&mut self, path: &Path) -> Result<()> {
        let reply = self
            .round_trip(&format!(":load {}", path.display()))
            .await?;
        if reply == "ok" {
            Ok(())
        } else {
            Err(EvalError::session(format!(
                "unexpected load reply: {reply}"
            )))
        }
    }

    async fn evaluate(&mut self, expression: &str) -> Result<String> {
        self.round_trip(expression).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // `cat` echoes every request line back, which is enough to exercise the
    // line protocol without a real REPL on the test host.
    #[tokio::test]
    async fn echo_process_round_trips() {
        let evaluator = CommandEvaluator::new("cat", vec![]);
        let mut session = evaluator.open_session(Path::new(".")).await.unwrap();
        assert_eq!(session.evaluate("1 + 2").await.unwrap(), "1 + 2");
    }

    #[tokio::test]
    async fn error_lines_become_evaluation_errors() {
        let evaluator = CommandEvaluator::new("cat", vec![]);
        let mut session = evaluator.open_session(Path::new(".")).await.unwrap();
        let err = session.evaluate("error: boom").await.unwrap_err();
        assert!(matches!(err, EvalError::Evaluation(_)));
    }

    #[tokio::test]
    async fn missing_program_fails_to_open() {
        let evaluator = CommandEvaluator::new("definitely-not-a-real-repl", vec![]);
        assert!(evaluator.open_session(Path::new(".")).await.is_err());
    }
}
