//! Request loop of the binary.
//!
//! A mutating request is persisted before its response is written, so a
//! client never sees `ok: true` for state that was not saved.

use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{error, info};

use crate::command::{handle_line, Response};
use crate::error::{AppError, AppResult};
use crate::InMemoryBettingService;

pub struct Session {
    service: InMemoryBettingService,
    snapshot_path: Option<PathBuf>,
}

impl Session {
    pub fn new(service: InMemoryBettingService, snapshot_path: Option<PathBuf>) -> Self {
        Self { service, snapshot_path }
    }

    pub fn service(&self) -> &InMemoryBettingService {
        &self.service
    }

    /// Run one request line and persist its effect.
    ///
    /// On a failed save the response reports a storage error and the
    /// save error is returned alongside it; the session must stop then.
    pub async fn process(&self, line: &str) -> (Response, Option<AppError>) {
        let (response, changed) = handle_line(&self.service, line).await;

        if let (true, Some(path)) = (changed, &self.snapshot_path) {
            if let Err(e) = self.service.snapshot().await.save(path) {
                error!("Failed to persist snapshot {:?}: {}", path, e);
                let failure = Response::failure("storage", format!("Operation not persisted: {}", e));
                return (failure, Some(e));
            }
        }

        (response, None)
    }

    /// Answer every line of `input` on `output` until input ends or a
    /// save fails
    pub async fn run<R, W>(&self, input: R, output: &mut W) -> AppResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (response, fatal) = self.process(line).await;

            let mut out = serde_json::to_string(&response)?;
            out.push('\n');
            output.write_all(out.as_bytes()).await?;
            output.flush().await?;

            if let Some(e) = fatal {
                return Err(e);
            }
        }

        info!("Input closed");
        Ok(())
    }
}
