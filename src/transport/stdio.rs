// src/transport/stdio.rs

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use super::{CallContext, RpcService};
use crate::mcp::protocol::{error_codes, Request, Response};

const TRANSPORT: &str = "stdio";

/// Serves newline-delimited JSON-RPC on the process's stdin/stdout.
pub async fn run(rpc: Arc<dyn RpcService>) {
    info!("🚀 Starting MCP server on stdin/stdout...");
    serve(rpc, BufReader::new(io::stdin()), io::stdout()).await;
    info!("MCP server shutting down");
}

/// One request per line in, one response per line out. Notifications get no line.
pub async fn serve<R, W>(rpc: Arc<dyn RpcService>, reader: R, mut writer: W)
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let ctx = CallContext::new(TRANSPORT, None);
    let mut lines = reader.lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                info!("EOF received, closing stdio transport");
                break;
            }
            Err(e) => {
                error!("Failed to read from stdin: {}", e);
                break;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("Received: {}", line);

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => rpc.call(request, &ctx).await,
            Err(parse_error) => {
                error!("JSON parse error: {}", parse_error);
                Some(Response::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {}", parse_error),
                ))
            }
        };

        let Some(response) = response else { continue };
        let Ok(mut encoded) = serde_json::to_string(&response) else { continue };
        debug!("Sending: {}", encoded);
        encoded.push('\n');

        if let Err(e) = writer.write_all(encoded.as_bytes()).await {
            error!("Failed to write response: {}", e);
            break;
        }
        if let Err(e) = writer.flush().await {
            error!("Failed to flush response: {}", e);
            break;
        }
    }
}
