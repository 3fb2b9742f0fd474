use std::{
    io::{BufRead, Write},
    thread,
};

use anyhow::Result;
use futures::{
    Stream, StreamExt,
    channel::mpsc::{self, UnboundedReceiver},
};
use log::{debug, error, info, warn};
use shakmaty::Color;

use crate::{
    board::GameBoard,
    config::OutputMode,
    display::AnalysisDisplay,
    engine::{AnalysisEngine, EngineLines},
    interpreter::interpret_line,
    util::parse_user_move,
};

/// What the loop should do after a line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Ignored,
    Quit,
    Position(String),
    Rejected(String),
    Submitted,
}

pub struct Session {
    board: GameBoard,
    display: AnalysisDisplay,
    depth: u8,
    /// Side to move when the latest analysis request went out.
    pending_turn: Option<Color>,
    /// A search is running, i.e. its `bestmove` has not been seen yet.
    searching: bool,
    /// The engine still owes the `bestmove` of a search it was told to stop.
    stale_bestmove_due: bool,
}

/// Lines typed by the user. Ends when the input closes.
pub type UserLines = UnboundedReceiver<String>;

/// Reads `input` line by line on its own thread.
///
/// Blocking reads cannot be cancelled, so they stay off the runtime; when the session ends the
/// thread is simply left behind and dies with the process.
pub fn spawn_line_reader<R>(input: R) -> UserLines
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded();
    thread::spawn(move || {
        for line in input.lines() {
            match line {
                Ok(line) => {
                    if tx.unbounded_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("failed to read input: {e}");
                    break;
                }
            }
        }
    });
    rx
}

impl Session {
    pub fn new(board: GameBoard, depth: u8) -> Session {
        let display = AnalysisDisplay::new(board.fen());
        Session {
            board,
            display,
            depth,
            pending_turn: None,
            searching: false,
            stale_bestmove_due: false,
        }
    }

    pub fn display(&self) -> &AnalysisDisplay {
        &self.display
    }

    pub async fn handle_input(
        &mut self,
        line: &str,
        engine: &mut dyn AnalysisEngine,
    ) -> Result<Reply> {
        let input = line.trim();
        match input {
            "" => return Ok(Reply::Ignored),
            "quit" | "exit" => return Ok(Reply::Quit),
            "fen" => return Ok(Reply::Position(self.board.fen())),
            _ => {}
        }

        let (from, to) = match parse_user_move(input) {
            Ok(squares) => squares,
            Err(e) => {
                warn!("unreadable input '{input}': {e}");
                return Ok(Reply::Rejected(e.to_string()));
            }
        };

        let description = self.board.describe_move(from, to);
        let submission = match self.board.play(from, to) {
            Ok(submission) => submission,
            Err(e) => {
                warn!("rejected move {from}{to}: {e:#}");
                return Ok(Reply::Rejected(e.to_string()));
            }
        };
        info!("{description}");
        if self.board.is_game_over() {
            info!("game over, analysing the final position anyway");
        }

        self.display.fen = submission.fen.clone();
        self.pending_turn = Some(submission.turn);
        // the engine answers the stop of a running search with one more bestmove
        self.stale_bestmove_due |= self.searching;
        self.searching = true;
        engine.analyze(&submission.fen, self.depth).await?;

        Ok(Reply::Submitted)
    }

    /// Folds one engine line into the display. Returns whether the display changed.
    ///
    /// Output of a search abandoned for a newer position is dropped up to and including its
    /// `bestmove`.
    pub fn handle_engine_line(&mut self, line: &str) -> bool {
        let Some(turn) = self.pending_turn else {
            debug!("no analysis requested yet, skipping '{line}'");
            return false;
        };

        let is_bestmove = line.split_whitespace().next() == Some("bestmove");
        if self.stale_bestmove_due {
            debug!("skipping output of stopped search '{line}'");
            if is_bestmove {
                self.stale_bestmove_due = false;
            }
            return false;
        }
        if is_bestmove {
            self.searching = false;
        }

        let result = interpret_line(line, turn);
        if result.is_empty() {
            return false;
        }
        self.display.apply(&result)
    }
}

/// Runs the single message loop until the user quits, input ends or the engine goes away.
pub async fn run<I, W>(
    mut session: Session,
    engine: &mut dyn AnalysisEngine,
    mut engine_lines: EngineLines,
    mut user_lines: I,
    out: &mut W,
    mode: OutputMode,
) -> Result<()>
where
    I: Stream<Item = String> + Unpin,
    W: Write,
{
    render(out, mode, session.display())?;

    loop {
        tokio::select! {
            biased;

            line = engine_lines.next() => {
                let Some(line) = line else {
                    warn!("engine output ended");
                    break;
                };
                if session.handle_engine_line(&line) {
                    render(out, mode, session.display())?;
                }
            }
            input = user_lines.next() => {
                let Some(input) = input else {
                    info!("input closed");
                    break;
                };
                match session.handle_input(&input, engine).await? {
                    Reply::Ignored => {}
                    Reply::Quit => break,
                    Reply::Position(fen) => message(out, mode, "fen", &fen)?,
                    Reply::Rejected(reason) => message(out, mode, "error", &reason)?,
                    Reply::Submitted => render(out, mode, session.display())?,
                }
            }
        }
    }

    engine.shutdown().await
}

fn render<W: Write>(out: &mut W, mode: OutputMode, display: &AnalysisDisplay) -> Result<()> {
    match mode {
        OutputMode::Text => writeln!(out, "{display}\n")?,
        OutputMode::Json => writeln!(out, "{}", display.to_json()?)?,
    }
    out.flush()?;
    Ok(())
}

fn message<W: Write>(out: &mut W, mode: OutputMode, key: &str, text: &str) -> Result<()> {
    match mode {
        OutputMode::Text => writeln!(out, "{text}")?,
        OutputMode::Json => {
            let mut row = serde_json::Map::new();
            row.insert(key.to_string(), text.into());
            writeln!(out, "{}", serde_json::Value::Object(row))?
        }
    }
    out.flush()?;
    Ok(())
}
