use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::error::{JimboError, Result};
use crate::methods::{MethodInvoker, MethodRegistry};
use crate::rpc::handle_line;

use super::Transport;

type Reader = Box<dyn AsyncBufRead + Send + Unpin>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

/// Newline-delimited JSON-RPC over a reader/writer pair (stdin/stdout by default).
///
/// Each line is handled on its own task, so responses may come back in a
/// different order than requests arrived.
pub struct StdioTransport {
    methods: Arc<MethodRegistry>,
    io: Mutex<Option<(Reader, Writer)>>,
    stopped_tx: Arc<watch::Sender<bool>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self::with_io(BufReader::new(io::stdin()), io::stdout())
    }

    pub fn with_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (stopped_tx, _) = watch::channel(false);
        Self {
            methods: Arc::new(MethodRegistry::new()),
            io: Mutex::new(Some((Box::new(reader), Box::new(writer)))),
            stopped_tx: Arc::new(stopped_tx),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    fn name(&self) -> &'static str {
        "stdio"
    }

    fn add_method(&self, method: Arc<MethodInvoker>) -> Result<()> {
        self.methods.insert_shared(method)
    }

    async fn start(&self) -> Result<()> {
        let (mut reader, mut writer) = self
            .io
            .lock()
            .map_err(|_| JimboError::internal("Stdio transport lock poisoned"))?
            .take()
            .ok_or_else(|| JimboError::transport("Stdio transport already started"))?;

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_task = tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                tracing::debug!("Sending: {}", line);
                if let Err(e) = write_line(&mut writer, &line).await {
                    tracing::error!("Error writing response: {}", e);
                    break;
                }
            }
        });

        let methods = Arc::clone(&self.methods);
        let stopped_tx = Arc::clone(&self.stopped_tx);
        tokio::spawn(async move {
            let mut line = String::new();
            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        let request = line.trim().to_string();
                        if request.is_empty() {
                            continue;
                        }

                        tracing::debug!("Received: {}", request);
                        let methods = Arc::clone(&methods);
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            let Some(response) = handle_line(&methods, &request).await else {
                                return;
                            };
                            match serde_json::to_string(&response) {
                                Ok(json) => {
                                    let _ = tx.send(json);
                                }
                                Err(e) => tracing::error!("Failed to encode response: {}", e),
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!("Error reading from stdin: {}", e);
                        break;
                    }
                }
            }

            // In-flight calls keep their own sender; the writer drains them.
            drop(tx);
            let _ = writer_task.await;
            tracing::info!("Stdio transport shutting down");
            stopped_tx.send_replace(true);
        });

        tracing::info!("Stdio transport ready with {} methods", self.methods.len());
        Ok(())
    }

    async fn stopped(&self) {
        let mut rx = self.stopped_tx.subscribe();
        loop {
            let stopped = *rx.borrow_and_update();
            if stopped || rx.changed().await.is_err() {
                break;
            }
        }
    }
}

async fn write_line(writer: &mut Writer, line: &str) -> std::io::Result<()> {
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}
