//! The textual matrix format.
//!
//! ```text
//! <d>
//! <n>
//! <row 0 tokens> … <row n-1 tokens>
//! ```
//!
//! Tokens are non-negative decimal integers separated by arbitrary runs of
//! whitespace (the line structure above is conventional, not required). The
//! parser checks structure only (token syntax and count); *value* validity
//! (range, contiguity, the diagonal split) is the refinement driver's job,
//! so a malformed palette surfaces as a [`crate::refine::RefineError`], not
//! as a parse error.

use crate::matrix::{Color, ColorMatrix};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Error type for parsing the textual matrix format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseError {
    /// The input is empty (no palette-size token).
    MissingPalette,
    /// The input ends after the palette size (no order token).
    MissingOrder,
    /// A token is not a non-negative decimal integer that fits the cell
    /// width.
    InvalidToken {
        /// The offending token.
        token: String,
    },
    /// The number of cell tokens does not match the declared order.
    TokenCount {
        /// `order²`.
        expected: usize,
        /// Tokens actually present.
        found: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::MissingPalette => write!(f, "missing palette size"),
            ParseError::MissingOrder => write!(f, "missing matrix order"),
            ParseError::InvalidToken { token } => write!(f, "invalid token {:?}", token),
            ParseError::TokenCount { expected, found } => {
                write!(f, "expected {} cell tokens, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for ParseError {}

fn parse_token(token: &str) -> Result<u32, ParseError> {
    token.parse::<u32>().map_err(|_| ParseError::InvalidToken {
        token: token.to_string(),
    })
}

/// Parses a matrix from the textual format.
///
/// Returns the matrix and the declared palette size.
pub fn parse_matrix(input: &str) -> Result<(ColorMatrix, u32), ParseError> {
    let mut tokens = input.split_whitespace();
    let declared = parse_token(tokens.next().ok_or(ParseError::MissingPalette)?)?;
    let order = parse_token(tokens.next().ok_or(ParseError::MissingOrder)?)? as usize;

    let expected = order * order;
    // Capacity follows the tokens actually present; a wild order header must
    // not drive the allocation.
    let mut cells = Vec::new();
    for token in tokens.by_ref().take(expected) {
        cells.push(Color::new(parse_token(token)?));
    }
    let surplus = tokens.count();
    if cells.len() != expected || surplus != 0 {
        return Err(ParseError::TokenCount {
            expected,
            found: cells.len() + surplus,
        });
    }
    Ok((ColorMatrix::from_cells(order, cells), declared))
}

/// Renders a matrix in the textual format, one matrix row per line.
pub fn render_matrix(matrix: &ColorMatrix, palette_size: u32) -> String {
    let n = matrix.order();
    let mut out = String::new();
    let _ = writeln!(out, "{}", palette_size);
    let _ = writeln!(out, "{}", n);
    for u in 0..n {
        for (v, color) in matrix.row(u).iter().enumerate() {
            if v > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{}", color);
        }
        out.push('\n');
    }
    out
}
