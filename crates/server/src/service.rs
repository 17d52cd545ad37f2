use crate::router::{error_code, CommandRouter};
use anyhow::Result;
use doctest_eval::Evaluator;
use doctest_protocol::{Request, Response};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// JSON-lines service over arbitrary byte streams.
///
/// One request object per input line, one response object per output line.
/// Logging goes to stderr; the output stream carries protocol JSON only,
/// so the service can sit directly on a host editor's stdio pipe.
pub struct Service {
    router: CommandRouter,
}

impl Service {
    pub fn new(evaluator: Arc<dyn Evaluator>) -> Self {
        Self {
            router: CommandRouter::new(evaluator),
        }
    }

    /// Serve requests from stdin until EOF
    pub async fn serve_stdio(&self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve requests from `input` until EOF, writing responses to `output`
    pub async fn serve<R, W>(&self, input: R, mut output: W) -> Result<()>
    where
        R: tokio::io::AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = BufReader::new(input).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line).await;
            let mut raw = serde_json::to_string(&response)?;
            raw.push('\n');
            output.write_all(raw.as_bytes()).await?;
            output.flush().await?;
        }
        log::info!("input closed, shutting down");
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                log::warn!("malformed request: {e}");
                return Response::error("bad_request", e.to_string());
            }
        };
        self.handle(request).await
    }

    async fn handle(&self, request: Request) -> Response {
        match request {
            Request::ListActions { file } => match self.router.list_actions(&file) {
                Ok(actions) => Response::Actions { actions },
                Err(e) => {
                    log::warn!("list_actions({file}) failed: {e}");
                    Response::error(error_code(&e), e.to_string())
                }
            },
            Request::Invoke { payload } => match self.router.invoke(&payload).await {
                Ok(result) => Response::Invoked(result),
                Err(e) => {
                    log::warn!("invoke({}) failed: {e}", payload.file);
                    Response::error(error_code(&e), e.to_string())
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctest_eval::MiniInterpreter;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    async fn run_lines(requests: &str) -> Vec<Response> {
        let service = Service::new(Arc::new(MiniInterpreter::new()));
        let mut output = Vec::new();
        service
            .serve(requests.as_bytes(), &mut output)
            .await
            .unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn list_then_invoke_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "// >>> 2 + 3\nfn main() {}\n").unwrap();

        let requests = format!(
            "{}\n{}\n",
            serde_json::to_string(&Request::ListActions {
                file: path.to_str().unwrap().into()
            })
            .unwrap(),
            serde_json::to_string(&Request::Invoke {
                payload: doctest_protocol::ActionPayload {
                    file: path.to_str().unwrap().into(),
                    marker_line: 0,
                    marker_text: "// >>> 2 + 3".into(),
                }
            })
            .unwrap()
        );

        let responses = run_lines(&requests).await;
        assert_eq!(responses.len(), 2);
        let Response::Actions { actions } = &responses[0] else {
            panic!("expected actions, got {:?}", responses[0]);
        };
        assert_eq!(actions[0].label, "Evaluate");
        let Response::Invoked(result) = &responses[1] else {
            panic!("expected invoke result, got {:?}", responses[1]);
        };
        assert!(result.refresh_actions);
    }

    #[tokio::test]
    async fn malformed_requests_get_error_envelopes() {
        let responses = run_lines("{\"method\":\"nope\"}\n").await;
        let Response::Error { error } = &responses[0] else {
            panic!("expected error, got {:?}", responses[0]);
        };
        assert_eq!(error.code, "bad_request");
    }

    #[tokio::test]
    async fn stale_invoke_gets_stale_location_code() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "// >>> 2 + 3\nfn main() {}\n").unwrap();

        let request = serde_json::to_string(&Request::Invoke {
            payload: doctest_protocol::ActionPayload {
                file: path.to_str().unwrap().into(),
                marker_line: 0,
                marker_text: "// >>> something else".into(),
            },
        })
        .unwrap();
        let responses = run_lines(&format!("{request}\n")).await;
        let Response::Error { error } = &responses[0] else {
            panic!("expected error, got {:?}", responses[0]);
        };
        assert_eq!(error.code, "stale_location");
    }
}
