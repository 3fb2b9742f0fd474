mod board;
mod config;
mod display;
mod engine;
mod interpreter;
mod session;
mod util;

use anyhow::{Context, Result, anyhow};
use log::{LevelFilter, error, info};

use crate::{
    board::GameBoard,
    config::Config,
    engine::{AnalysisEngine, UciWorker},
    session::Session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_logging(config.log_level)?;

    // an optional FEN as first argument replaces the starting position
    let board = match std::env::args().nth(1) {
        Some(fen) => GameBoard::from_fen(&fen)?,
        None => GameBoard::new(),
    };

    let (worker, engine_lines) = UciWorker::spawn(&config.engine_path)
        .await
        .context("is Stockfish installed? set STOCKFISH_PATH to point at it")?;
    let mut engine: Box<dyn AnalysisEngine> = Box::new(worker);

    info!(
        "Analysing to depth {}, {:?} to move - enter moves like e2e4, 'fen' or 'quit'",
        config.depth,
        board.turn()
    );

    let session = Session::new(board, config.depth);
    let user_lines = session::spawn_line_reader(std::io::BufReader::new(std::io::stdin()));
    let mut stdout = std::io::stdout();

    match session::run(
        session,
        engine.as_mut(),
        engine_lines,
        user_lines,
        &mut stdout,
        config.output,
    )
    .await
    {
        Ok(()) => info!("session finished"),
        Err(e) => {
            error!("session failed because, {e:#}");
            return Err(e);
        }
    }

    Ok(())
}

/// Logs go to stderr so stdout stays reserved for the analysis display.
fn init_logging(level: LevelFilter) -> Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .map_err(|e| anyhow!("failed to install logger: {e}"))
}
