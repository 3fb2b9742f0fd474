use std::str::FromStr;

use anyhow::{Result, bail};
use shakmaty::Square;

/// Reads a from/to square pair typed by the user.
///
/// Accepts "e2e4", "e2 e4", "e2-e4" and UCI moves with a promotion suffix ("e7e8q"). The suffix is
/// dropped since promotions always go to a queen.
pub fn parse_user_move(move_str: &str) -> Result<(Square, Square)> {
    let compact: String = move_str
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase();

    let squares = match compact.len() {
        4 => &compact[..],
        5 if compact.ends_with(['q', 'r', 'b', 'n']) => &compact[..4],
        _ => bail!("expected a move like e2e4, got '{}'", move_str.trim()),
    };

    if !squares.is_ascii() {
        bail!("expected a move like e2e4, got '{}'", move_str.trim());
    }

    let from = Square::from_str(&squares[0..2])?;
    let to = Square::from_str(&squares[2..4])?;

    Ok((from, to))
}
