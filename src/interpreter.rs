//! Turns single lines of UCI engine output into displayable analysis results.

use std::fmt;

use shakmaty::Color;

/// Engine evaluation, already adjusted for the submitting side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Signed score in centipawns, shown in pawns.
    Centipawns(i64),
    /// Forced mate, distance in moves without sign.
    MateIn(u32),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Evaluation::Centipawns(cp) => write!(f, "{}", cp as f64 / 100.0),
            Evaluation::MateIn(n) => write!(f, "Mate in {n}"),
        }
    }
}

/// Whatever could be extracted from one engine line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    pub best_move: Option<String>,
    pub evaluation: Option<Evaluation>,
}

impl AnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.best_move.is_none() && self.evaluation.is_none()
    }
}

/// Interprets one line of engine output.
///
/// `turn` is the side that was to move when the analysis request was issued. Centipawn scores are
/// negated unless that side was Black; mate distances ignore both sign and turn. Anything that
/// cannot be read (missing tokens, bad integers) is simply left out of the result.
pub fn interpret_line(line: &str, turn: Color) -> AnalysisResult {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let mut result = AnalysisResult::default();

    if tokens.first() == Some(&"bestmove") {
        result.best_move = tokens.get(1).map(|mv| mv.to_string());
    }

    if tokens.contains(&"info") && tokens.contains(&"score") {
        result.evaluation = parse_score(&tokens, turn);
    }

    result
}

fn parse_score(tokens: &[&str], turn: Color) -> Option<Evaluation> {
    let score_idx = tokens.iter().position(|t| *t == "score")?;
    let kind = *tokens.get(score_idx + 1)?;
    let value: i32 = tokens.get(score_idx + 2)?.parse().ok()?;

    match kind {
        "cp" => {
            let cp = i64::from(value);
            let cp = if turn != Color::Black { -cp } else { cp };
            Some(Evaluation::Centipawns(cp))
        }
        "mate" => Some(Evaluation::MateIn(value.unsigned_abs())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_text(line: &str, turn: Color) -> Option<String> {
        interpret_line(line, turn).evaluation.map(|e| e.to_string())
    }

    #[test]
    fn extracts_best_move_and_ignores_ponder() {
        let result = interpret_line("bestmove e2e4 ponder e7e5", Color::White);
        assert_eq!(result.best_move.as_deref(), Some("e2e4"));
        assert_eq!(result.evaluation, None);
    }

    #[test]
    fn best_move_is_passed_through_verbatim() {
        let result = interpret_line("bestmove (none)", Color::Black);
        assert_eq!(result.best_move.as_deref(), Some("(none)"));
    }

    #[test]
    fn best_move_requires_leading_token() {
        assert_eq!(interpret_line("info string bestmove e2e4", Color::White).best_move, None);
        assert_eq!(interpret_line("bestmoves e2e4", Color::White).best_move, None);
        assert!(interpret_line("bestmove", Color::White).is_empty());
    }

    #[test]
    fn centipawns_are_negated_for_white() {
        let line = "info depth 15 score cp 150 nodes 12345";
        assert_eq!(eval_text(line, Color::White).as_deref(), Some("-1.5"));
        assert_eq!(eval_text(line, Color::Black).as_deref(), Some("1.5"));
    }

    #[test]
    fn centipawn_formatting() {
        assert_eq!(eval_text("info score cp -33", Color::Black).as_deref(), Some("-0.33"));
        assert_eq!(eval_text("info score cp 200", Color::Black).as_deref(), Some("2"));
        assert_eq!(eval_text("info score cp 5", Color::Black).as_deref(), Some("0.05"));
        assert_eq!(eval_text("info score cp 0", Color::White).as_deref(), Some("0"));
        assert_eq!(eval_text("info score cp -7", Color::White).as_deref(), Some("0.07"));
    }

    #[test]
    fn extreme_centipawns_do_not_overflow() {
        let line = format!("info score cp {}", i32::MIN);
        assert_eq!(
            interpret_line(&line, Color::White).evaluation,
            Some(Evaluation::Centipawns(-i64::from(i32::MIN)))
        );
    }

    #[test]
    fn mate_is_unsigned_and_turn_independent() {
        let line = "info depth 10 score mate -3 nodes 500";
        assert_eq!(eval_text(line, Color::White).as_deref(), Some("Mate in 3"));
        assert_eq!(eval_text(line, Color::Black).as_deref(), Some("Mate in 3"));
        assert_eq!(eval_text("info score mate 7 pv h5f7", Color::White).as_deref(), Some("Mate in 7"));
    }

    #[test]
    fn bound_markers_after_value_are_tolerated() {
        let line = "info depth 22 seldepth 30 multipv 1 score cp 34 lowerbound nodes 1 pv e2e4";
        assert_eq!(eval_text(line, Color::Black).as_deref(), Some("0.34"));
    }

    #[test]
    fn truncated_or_malformed_scores_are_absent() {
        for line in [
            "info depth 3 score",
            "info depth 3 score cp",
            "info depth 3 score mate",
            "info score cp abc",
            "info score cp 99999999999",
            "info score wdl 500 400 100",
            "info depth 3 nodes 20",
        ] {
            assert!(interpret_line(line, Color::White).is_empty(), "line: {line}");
        }
    }

    #[test]
    fn unrelated_lines_yield_nothing() {
        for line in ["readyok", "uciok", "id name Stockfish 16.1", "", "   "] {
            assert!(interpret_line(line, Color::White).is_empty(), "line: {line:?}");
        }
    }

    #[test]
    fn repeated_calls_agree() {
        let line = "info depth 12 score cp -48 nodes 90000 pv d7d5";
        assert_eq!(interpret_line(line, Color::White), interpret_line(line, Color::White));
    }

    #[test]
    fn concurrent_callers_see_identical_results() {
        let line = "info depth 8 score cp 61 pv g1f3";
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(move || interpret_line(line, Color::Black)))
            .collect();
        for handle in handles {
            let result = handle.join().unwrap();
            assert_eq!(result.evaluation, Some(Evaluation::Centipawns(61)));
        }
    }
}
