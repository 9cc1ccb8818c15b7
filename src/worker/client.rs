//! NDJSON transport to a provider worker process.

use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;

use super::error::{WorkerError, WorkerResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};

/// Seconds a request may wait for its reply unless configured otherwise.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Code used for replies synthesized when the worker's stdout closes.
const WORKER_EXITED: &str = "WORKER_EXITED";

/// Requests awaiting a reply, keyed by request id.
///
/// Becomes `None` once the reader has seen end of stream, so late requests
/// fail immediately instead of waiting out their timeout.
struct Inflight {
    waiting: Mutex<Option<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>,
}

impl Inflight {
    fn open() -> Arc<Self> {
        Arc::new(Self {
            waiting: Mutex::new(Some(HashMap::new())),
        })
    }

    async fn register(&self, id: &str) -> WorkerResult<oneshot::Receiver<ResponseEnvelope>> {
        let mut waiting = self.waiting.lock().await;
        let table = waiting.as_mut().ok_or(WorkerError::ChannelClosed)?;
        let (tx, rx) = oneshot::channel();
        table.insert(id.to_string(), tx);
        Ok(rx)
    }

    async fn forget(&self, id: &str) {
        if let Some(table) = self.waiting.lock().await.as_mut() {
            table.remove(id);
        }
    }

    async fn deliver(&self, response: ResponseEnvelope) {
        let sender = match self.waiting.lock().await.as_mut() {
            Some(table) => table.remove(&response.id),
            None => None,
        };
        match sender {
            Some(tx) => {
                let _ = tx.send(response);
            }
            None => tracing::debug!(id = %response.id, "reply for unknown request ignored"),
        }
    }

    /// Close the table and answer every waiter with a worker-exited error.
    async fn shut(&self) {
        let Some(table) = self.waiting.lock().await.take() else {
            return;
        };
        if !table.is_empty() {
            tracing::warn!(abandoned = table.len(), "provider worker exited with requests in flight");
        }
        for (id, tx) in table {
            let _ = tx.send(ResponseEnvelope {
                id,
                success: false,
                result: None,
                error: Some(ErrorInfo {
                    code: WORKER_EXITED.to_string(),
                    message: "provider worker exited before replying".to_string(),
                }),
            });
        }
    }
}

/// Client for one provider worker child process.
///
/// Requests are written to the worker's stdin as one JSON object per line.
/// A background task reads stdout and routes each reply to its caller by id,
/// so several requests may be outstanding at once.
///
/// ```ignore
/// let client = WorkerClient::spawn("./voyanta-worker", &[], Duration::from_secs(30)).await?;
/// let reply: MetadataVersionResponse = client
///     .request(methods::METADATA_VERSION, CatalogParams { credential })
///     .await?;
/// ```
pub struct WorkerClient {
    writer: Mutex<BufWriter<ChildStdin>>,
    inflight: Arc<Inflight>,
    reader: JoinHandle<()>,
    timeout: Duration,
    // Held so the worker is killed when the client drops.
    _process: Child,
}

impl WorkerClient {
    /// Start `program` with `args`, piping its stdin and stdout.
    ///
    /// The worker's stderr is inherited so its diagnostics reach the terminal.
    pub async fn spawn<P: AsRef<Path>>(
        program: P,
        args: &[String],
        timeout: Duration,
    ) -> WorkerResult<Self> {
        let program = program.as_ref();
        let mut process = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(WorkerError::SpawnFailed)?;

        let (Some(stdin), Some(stdout)) = (process.stdin.take(), process.stdout.take()) else {
            return Err(WorkerError::SpawnFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "worker pipes were not captured",
            )));
        };

        let inflight = Inflight::open();
        let reader = tokio::spawn(read_replies(stdout, inflight.clone()));
        tracing::debug!(worker = %program.display(), pid = ?process.id(), "provider worker started");

        Ok(Self {
            writer: Mutex::new(BufWriter::new(stdin)),
            inflight,
            reader,
            timeout,
            _process: process,
        })
    }

    /// Call `method` with `params` and decode the reply's result as `R`.
    ///
    /// Error replies are classified by their code; a missing reply within the
    /// client's timeout yields [`WorkerError::Timeout`].
    pub async fn request<P, R>(&self, method: &str, params: P) -> WorkerResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let envelope = RequestEnvelope {
            id: uuid::Uuid::new_v4().to_string(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(WorkerError::SerializeFailed)?,
        };
        let mut line = serde_json::to_vec(&envelope).map_err(WorkerError::SerializeFailed)?;
        line.push(b'\n');

        let reply = self.inflight.register(&envelope.id).await?;
        if let Err(e) = self.send_line(&line).await {
            self.inflight.forget(&envelope.id).await;
            return Err(e);
        }
        tracing::trace!(method, id = %envelope.id, "worker request sent");

        let response = match tokio::time::timeout(self.timeout, reply).await {
            Ok(received) => received?,
            Err(_) => {
                self.inflight.forget(&envelope.id).await;
                tracing::warn!(method, secs = self.timeout.as_secs(), "worker request timed out");
                return Err(WorkerError::Timeout(self.timeout.as_secs()));
            }
        };

        decode_reply(response)
    }

    async fn send_line(&self, line: &[u8]) -> WorkerResult<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line).await.map_err(WorkerError::WriteFailed)?;
        writer.flush().await.map_err(WorkerError::WriteFailed)
    }

    /// False once the worker's stdout has closed.
    pub fn is_alive(&self) -> bool {
        !self.reader.is_finished()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

async fn read_replies(stdout: ChildStdout, inflight: Arc<Inflight>) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                Ok(response) => inflight.deliver(response).await,
                Err(e) => tracing::warn!(error = %e, "unparseable line from provider worker"),
            },
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "reading provider worker output failed");
                break;
            }
        }
    }
    inflight.shut().await;
}

fn decode_reply<R: DeserializeOwned>(response: ResponseEnvelope) -> WorkerResult<R> {
    if !response.success {
        return Err(match response.error {
            Some(ErrorInfo { code, message }) => WorkerError::classify(&code, &message),
            None => WorkerError::remote("UNKNOWN", "worker reported failure without details"),
        });
    }
    serde_json::from_value(response.result.unwrap_or(Value::Null))
        .map_err(WorkerError::DeserializeFailed)
}
