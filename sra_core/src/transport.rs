use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::mcp_server::{JsonRpcHandler, SERVER_NAME};

/// Newline-delimited JSON-RPC over stdio. Each message is handled on its own
/// task; a single writer serializes replies.
pub struct StdioTransport {
    handler: Arc<JsonRpcHandler>,
}

impl StdioTransport {
    pub fn new(handler: JsonRpcHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub async fn run(&self) -> io::Result<()> {
        info!(target: "transport.stdio", "starting stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve until `reader` hits EOF, then drain in-flight requests.
    pub async fn serve<R, W>(&self, reader: R, writer: W) -> io::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let writer_task = tokio::spawn(write_lines(writer, rx));

        let mut lines = BufReader::new(reader).lines();
        let mut in_flight = JoinSet::new();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!(target: "transport.stdio", "EOF reached on stdin");
                    break;
                }
                Err(e) => {
                    error!(target: "transport.stdio", error = %e, "error reading from stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let handler = Arc::clone(&self.handler);
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = handler.handle_message(&line).await {
                    match serde_json::to_string(&response) {
                        Ok(text) => {
                            if tx.send(text).is_err() {
                                error!(target: "transport.stdio", "writer closed before reply");
                            }
                        }
                        Err(e) => error!(target: "transport.stdio", error = %e, "failed to encode reply"),
                    }
                }
            });

            // reap finished tasks so the set does not grow unbounded
            while let Some(done) = in_flight.try_join_next() {
                if let Err(e) = done {
                    error!(target: "transport.stdio", error = %e, "request task failed");
                }
            }
        }

        while let Some(done) = in_flight.join_next().await {
            if let Err(e) = done {
                error!(target: "transport.stdio", error = %e, "request task failed");
            }
        }
        drop(tx);

        writer_task
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

async fn write_lines<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<String>) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = rx.recv().await {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        debug!(target: "transport.stdio", bytes = line.len(), "sent response");
    }
    Ok(())
}

/// JSON-RPC over HTTP: `POST /mcp` and `GET /health`.
pub struct HttpTransport {
    handler: Arc<JsonRpcHandler>,
}

impl HttpTransport {
    pub fn new(handler: JsonRpcHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/mcp", post(mcp_handler))
            .route("/health", get(health_handler))
            .with_state(Arc::clone(&self.handler))
    }

    pub async fn run(&self, bind: &str) -> io::Result<()> {
        let listener = tokio::net::TcpListener::bind(bind).await?;
        info!(target: "transport.http", addr = %listener.local_addr()?, "HTTP transport listening");
        axum::serve(listener, self.router()).await
    }
}

async fn mcp_handler(State(handler): State<Arc<JsonRpcHandler>>, body: String) -> Response {
    match handler.handle_message(&body).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": SERVER_NAME,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
