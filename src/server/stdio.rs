//! Stdio transport for MCP.
//!
//! Reads newline-delimited JSON-RPC from stdin and writes responses and
//! notifications to stdout, one message per line. The configured token
//! plays the role of the `authorization` header on every message.

use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::mcp::handler::parse_message;
use crate::mcp::notifier::Notifier;
use crate::mcp::McpState;

pub async fn run_stdio(mcp_state: Arc<McpState>, token: Option<String>) -> Result<()> {
    info!("Serving MCP over stdio");
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    serve_lines(&mcp_state, token.as_deref(), stdin, &mut stdout).await
}

async fn write_message<W, T>(writer: &mut W, message: &T) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let mut line = serde_json::to_vec(message)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    writer.flush().await?;
    Ok(())
}

/// Serve one client until `reader` reaches EOF, then terminate its session.
pub async fn serve_lines<R, W>(
    mcp: &McpState,
    authorization: Option<&str>,
    reader: R,
    writer: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut session_id: Option<String> = None;
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request = match parse_message(line) {
            Ok(request) => request,
            Err(response) => {
                write_message(writer, &response).await?;
                continue;
            }
        };

        let admitted = match mcp.admit(&request.method, authorization, session_id.as_deref()) {
            Ok(admitted) => admitted,
            Err(rejection) => {
                debug!("stdio message {} rejected: {:?}", request.method, rejection);
                write_message(writer, &rejection.response()).await?;
                continue;
            }
        };
        if admitted.opened {
            if let Some(previous) = session_id.replace(admitted.session_id.clone()) {
                mcp.sessions.terminate(&previous);
            }
        }

        // Notifications are written as they arrive and always before the response
        let (notifier, mut notifications) = Notifier::channel();
        let dispatch = mcp.dispatch(request, &admitted.session_id, notifier);
        tokio::pin!(dispatch);

        let response = loop {
            tokio::select! {
                biased;
                Some(notification) = notifications.recv() => {
                    write_message(writer, &notification).await?;
                }
                response = &mut dispatch => break response,
            }
        };
        while let Ok(notification) = notifications.try_recv() {
            write_message(writer, &notification).await?;
        }

        if let Some(response) = response {
            write_message(writer, &response).await?;
        }
    }

    if let Some(session_id) = session_id {
        mcp.sessions.terminate(&session_id);
    }
    info!("stdio client disconnected");
    Ok(())
}
