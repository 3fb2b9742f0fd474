mod uci_worker;

use anyhow::Result;
use async_trait::async_trait;

pub use uci_worker::{EngineLines, UciWorker};

/// Something that analyses positions and reports back asynchronously on its line channel.
#[async_trait]
pub trait AnalysisEngine: Send {
    /// Starts a search of `fen` to `depth`, abandoning any search still running.
    async fn analyze(&mut self, fen: &str, depth: u8) -> Result<()>;

    async fn shutdown(&mut self) -> Result<()>;
}
