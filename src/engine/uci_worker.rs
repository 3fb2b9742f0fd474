use std::{path::Path, process::Stdio, time::Duration};

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader},
    process::{Child, ChildStdin, Command},
};

use super::AnalysisEngine;

const QUIT_GRACE_PERIOD: Duration = Duration::from_millis(500);

/// Every non-empty line the engine prints, in order. Ends when the engine closes its output.
pub type EngineLines = UnboundedReceiver<String>;

/// Talks UCI to an engine over a pair of byte pipes.
pub struct UciWorker<W> {
    stdin: W,
    process: Option<Child>,
}

impl UciWorker<ChildStdin> {
    /// Starts the engine binary at `path` and performs the opening `uci` / `isready` exchange.
    /// The process is killed if the worker is dropped without a clean shutdown.
    pub async fn spawn(path: &Path) -> Result<(Self, EngineLines)> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start engine '{}'", path.display()))?;

        let stdin = process.stdin.take().context("engine stdin is not piped")?;
        let stdout = process.stdout.take().context("engine stdout is not piped")?;

        let (mut worker, lines) = UciWorker::new(stdin, stdout);
        worker.process = Some(process);
        worker.handshake().await?;

        info!("engine '{}' started", path.display());
        Ok((worker, lines))
    }
}

impl<W> UciWorker<W>
where
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps already connected pipes. Must be called inside a tokio runtime: the reader side is
    /// drained by a background task feeding the returned channel.
    pub fn new<R>(stdin: W, stdout: R) -> (Self, EngineLines)
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded();
        tokio::spawn(forward_lines(stdout, tx));

        (
            UciWorker {
                stdin,
                process: None,
            },
            rx,
        )
    }

    pub async fn handshake(&mut self) -> Result<()> {
        self.send("uci").await?;
        self.send("isready").await
    }

    async fn send(&mut self, cmd: &str) -> Result<()> {
        debug!("> {cmd}");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .with_context(|| format!("failed to send '{cmd}' to engine"))?;
        self.stdin.flush().await?;
        Ok(())
    }
}

async fn forward_lines<R>(stdout: R, tx: UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                debug!("< {line}");
                if tx.unbounded_send(line.to_string()).is_err() {
                    // nobody is listening anymore
                    break;
                }
            }
            Ok(None) => {
                info!("engine closed its output");
                break;
            }
            Err(e) => {
                error!("failed to read engine output: {e}");
                break;
            }
        }
    }
}

#[async_trait]
impl<W> AnalysisEngine for UciWorker<W>
where
    W: AsyncWrite + Unpin + Send,
{
    async fn analyze(&mut self, fen: &str, depth: u8) -> Result<()> {
        self.send("stop").await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.send("quit").await?;

        if let Some(process) = &mut self.process {
            match tokio::time::timeout(QUIT_GRACE_PERIOD, process.wait()).await {
                Ok(status) => info!("engine exited ({})", status?),
                Err(_) => {
                    warn!("engine ignored quit, killing it");
                    process.kill().await?;
                }
            }
        }
        Ok(())
    }
}
