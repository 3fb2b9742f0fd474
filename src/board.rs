use std::str::FromStr;

use anyhow::{Context, Result};
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Position, Rank, Role, Square,
    fen::Fen,
    uci::UciMove,
};

/// A position handed to the analysis engine, together with the turn the interpreter needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Position after the user's move.
    pub fen: String,
    /// Side that was to move before the user's move.
    pub turn: Color,
}

pub struct GameBoard {
    game: Chess,
}

impl GameBoard {
    pub fn new() -> GameBoard {
        GameBoard {
            game: Chess::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<GameBoard> {
        let game = Fen::from_str(fen.trim())
            .with_context(|| format!("invalid FEN '{fen}'"))?
            .into_position(CastlingMode::Standard)
            .with_context(|| format!("FEN '{fen}' is not a legal position"))?;
        Ok(GameBoard { game })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.game, EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Color {
        self.game.turn()
    }

    pub fn is_game_over(&self) -> bool {
        self.game.is_game_over()
    }

    /// Plays `from` -> `to` if legal. Pawns reaching the last rank always become queens.
    pub fn play(&mut self, from: Square, to: Square) -> Result<Submission> {
        let promotion = match self.game.board().piece_at(from) {
            Some(piece)
                if piece.role == Role::Pawn && matches!(to.rank(), Rank::First | Rank::Eighth) =>
            {
                Some(Role::Queen)
            }
            _ => None,
        };

        let uci_move = UciMove::Normal {
            from,
            to,
            promotion,
        };
        let valid_move = uci_move
            .to_move(&self.game)
            .with_context(|| format!("illegal move {uci_move}"))?;

        let turn = self.game.turn();
        self.game.play_unchecked(valid_move);

        Ok(Submission {
            fen: self.fen(),
            turn,
        })
    }

    /// One-line description of a move about to be played, e.g. "1. WHITE played Pawn (e2) to e4".
    pub fn describe_move(&self, from: Square, to: Square) -> String {
        let board = self.game.board();
        let moved = board
            .piece_at(from)
            .map_or("nothing".to_string(), |p| format!("{:?}", p.role));
        let taken = board.piece_at(to);

        format!(
            "{:>2}. {} played {} ({}) to {}{}",
            self.game.fullmoves(),
            format!("{:?}", self.game.turn()).to_uppercase(),
            moved,
            from,
            to,
            taken.map_or("".to_string(), |p| format!(", taking {:?}", p.role))
        )
    }
}

impl Default for GameBoard {
    fn default() -> Self {
        Self::new()
    }
}
