use std::fmt;

use serde::Serialize;

use crate::interpreter::AnalysisResult;

/// What the user currently sees: the position and the latest known analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisDisplay {
    pub fen: String,
    pub best_move: Option<String>,
    pub evaluation: Option<String>,
}

impl AnalysisDisplay {
    pub fn new(fen: String) -> Self {
        AnalysisDisplay {
            fen,
            ..Default::default()
        }
    }

    /// Takes over every field present in `result`; absent fields keep their previous value.
    /// Returns whether anything visible changed.
    pub fn apply(&mut self, result: &AnalysisResult) -> bool {
        let mut changed = false;

        if let Some(best_move) = &result.best_move {
            changed |= self.best_move.as_ref() != Some(best_move);
            self.best_move = Some(best_move.clone());
        }
        if let Some(evaluation) = result.evaluation {
            let text = evaluation.to_string();
            changed |= self.evaluation.as_ref() != Some(&text);
            self.evaluation = Some(text);
        }

        changed
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for AnalysisDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Position: {}", self.fen)?;
        writeln!(
            f,
            "Best Move: {}",
            self.best_move.as_deref().unwrap_or("Calculating...")
        )?;
        write!(
            f,
            "Evaluation: {}",
            self.evaluation.as_deref().unwrap_or("Evaluating...")
        )
    }
}
