use std::convert::Infallible;
use std::process::Stdio;
use std::sync::atomic::Ordering;

use anyhow::Context;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::channel::mpsc::{self, UnboundedSender};
use futures::{Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::state::SharedState;

/// Sentinel line closing the event stream; the status page disconnects
/// when it sees this.
pub const DONE_SENTINEL: &str = "[DONE]";

/// GET /stream-logs — spawn one consolidation subprocess and forward its
/// output line by line as server-sent events, closing with the sentinel.
///
/// The bridge is one-shot: at most one run is active per server, and a
/// second subscriber only receives a refusal line. A client that
/// disconnects does not cancel the run in flight.
pub async fn stream_logs(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded::<String>();

    if state.run_active.swap(true, Ordering::SeqCst) {
        let _ = tx.unbounded_send("⚠️ A run is already in progress. Try again later.".to_string());
        let _ = tx.unbounded_send(DONE_SENTINEL.to_string());
        // dropping tx here ends the stream right after the sentinel
    } else {
        tokio::spawn(run_pipeline(state.clone(), tx));
    }

    let stream = rx.map(|line| Ok(Event::default().data(line)));
    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Owns the child process for one run and clears the busy flag when done.
async fn run_pipeline(state: SharedState, tx: UnboundedSender<String>) {
    match spawn_and_forward(&state, &tx).await {
        Ok(0) => {
            let _ = tx.unbounded_send(String::new());
            let _ = tx.unbounded_send("🎉 Process complete! You can close this window.".to_string());
        }
        Ok(code) => {
            let _ = tx.unbounded_send(String::new());
            let _ = tx.unbounded_send(format!("❌ Consolidation failed with exit code {}.", code));
        }
        Err(err) => {
            let _ = tx.unbounded_send(format!("⚠️ A critical error occurred: {:#}", err));
        }
    }
    let _ = tx.unbounded_send(DONE_SENTINEL.to_string());
    state.run_active.store(false, Ordering::SeqCst);
}

async fn spawn_and_forward(
    state: &SharedState,
    tx: &UnboundedSender<String>,
) -> anyhow::Result<i32> {
    let (program, args) = state
        .pipeline_command
        .split_first()
        .context("empty pipeline command")?;

    tracing::info!(program = %program, "starting consolidation run");
    let mut child = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("spawning {}", program))?;

    // stdout and stderr are forwarded on the same stream, like a terminal.
    let out_task = child
        .stdout
        .take()
        .map(|out| tokio::spawn(forward_lines(out, tx.clone())));
    let err_task = child
        .stderr
        .take()
        .map(|err| tokio::spawn(forward_lines(err, tx.clone())));

    let status = child.wait().await.context("waiting for consolidation run")?;
    if let Some(task) = out_task {
        let _ = task.await;
    }
    if let Some(task) = err_task {
        let _ = task.await;
    }

    Ok(status.code().unwrap_or(-1))
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, tx: UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        // Keep draining even after the client is gone so the child never
        // blocks on a full pipe.
        let _ = tx.unbounded_send(line);
    }
}
