//! The refinement driver: validation, canonicalisation, fixed-point loop.
//!
//! Each pass computes a signature for every cell (row-major), interns the
//! signatures into per-pass tables, rewrites a scratch matrix with the new
//! colors, and stops when the palette stops growing. Folding the current
//! color into every signature makes each pass a refinement of the previous
//! coloring, so the palette is strictly monotone until the fixed point and
//! `d' == d` is a sufficient convergence test.
//!
//! # Citations
//! - Weisfeiler & Leman (1968); Weisfeiler (ed.), "On Construction and
//!   Identification of Graphs", LNM 558 (1976): the stabilisation procedure
//! - Babel, Chuvaeva, Klin & Pasechnik, "Program implementation of the
//!   Weisfeiler-Leman algorithm" (1997): termination and palette bounds

use crate::matrix::{Color, ColorMatrix, MAX_ORDER};
use crate::palette::{Palette, PassTables, PALETTE_CEILING};
use crate::signature::SignatureBuilder;
use serde::{Deserialize, Serialize};

/// Error type for refinement calls.
///
/// Three failure classes, none recovered internally: malformed input (the
/// first five variants, detected before any refinement work), memory
/// exhaustion on the bulk buffers, and palette overflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefineError {
    /// The matrix has order zero.
    EmptyMatrix,
    /// The matrix order exceeds [`MAX_ORDER`].
    OrderTooLarge {
        /// The offending order.
        order: usize,
    },
    /// A cell value is not strictly below the declared palette size.
    ColorOutOfRange {
        /// The offending value.
        color: u32,
        /// The declared palette size.
        declared: u32,
    },
    /// A declared color never appears (values are not an initial segment).
    UnusedColor {
        /// The missing value.
        color: u32,
    },
    /// A value appears both on and off the diagonal.
    DiagonalClash {
        /// The shared value.
        color: u32,
    },
    /// The palette would reach [`PALETTE_CEILING`].
    PaletteOverflow {
        /// The palette size the refinement would have needed.
        required: usize,
    },
    /// A bulk working buffer could not be allocated.
    OutOfMemory,
}

impl std::fmt::Display for RefineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefineError::EmptyMatrix => write!(f, "matrix has order zero"),
            RefineError::OrderTooLarge { order } => {
                write!(f, "matrix order {} exceeds the supported {}", order, MAX_ORDER)
            }
            RefineError::ColorOutOfRange { color, declared } => {
                write!(f, "cell value {} is not below the declared palette size {}", color, declared)
            }
            RefineError::UnusedColor { color } => {
                write!(f, "declared color {} never appears in the matrix", color)
            }
            RefineError::DiagonalClash { color } => {
                write!(f, "color {} appears both on and off the diagonal", color)
            }
            RefineError::PaletteOverflow { required } => {
                write!(f, "refinement needs {} colors, ceiling is {}", required, PALETTE_CEILING)
            }
            RefineError::OutOfMemory => write!(f, "working buffers could not be allocated"),
        }
    }
}

impl std::error::Error for RefineError {}

/// Scans the matrix against the declared palette size.
///
/// Checks that every value is below `declared`, that every value in
/// `0..declared` occurs, and that no value occurs both on and off the
/// diagonal. Returns the per-color diagonal membership flags for the
/// canonicalisation step.
fn validate(matrix: &ColorMatrix, declared: u32) -> Result<Vec<bool>, RefineError> {
    let n = matrix.order();
    let mut on_diagonal = vec![false; declared as usize];
    let mut off_diagonal = vec![false; declared as usize];
    for u in 0..n {
        for v in 0..n {
            let color = matrix.get(u, v).as_u32();
            if color >= declared {
                return Err(RefineError::ColorOutOfRange { color, declared });
            }
            if u == v {
                on_diagonal[color as usize] = true;
            } else {
                off_diagonal[color as usize] = true;
            }
        }
    }
    for color in 0..declared {
        match (on_diagonal[color as usize], off_diagonal[color as usize]) {
            (true, true) => return Err(RefineError::DiagonalClash { color }),
            (false, false) => return Err(RefineError::UnusedColor { color }),
            _ => {}
        }
    }
    Ok(on_diagonal)
}

/// Relabels the palette so diagonal colors occupy an initial range.
///
/// Diagonal colors become `0..d_D` and off-diagonal colors `d_D..d`, both
/// ascending by old value. Every subsequent pass preserves this shape.
fn canonicalize(matrix: &mut ColorMatrix, declared: u32, on_diagonal: &[bool]) -> Palette {
    let mut relabel = vec![0u32; declared as usize];
    let mut next = 0u32;
    for (color, &diag) in on_diagonal.iter().enumerate() {
        if diag {
            relabel[color] = next;
            next += 1;
        }
    }
    let diagonal = next;
    for (color, &diag) in on_diagonal.iter().enumerate() {
        if !diag {
            relabel[color] = next;
            next += 1;
        }
    }
    debug_assert_eq!(next, declared);
    for cell in matrix.cells_mut() {
        *cell = Color::new(relabel[cell.as_usize()]);
    }
    Palette {
        total: declared,
        diagonal,
    }
}

/// Refines `matrix` to the coarsest coherent (cellular) coloring.
///
/// On success the matrix holds the refined coloring (diagonal colors first,
/// numbered by first occurrence in row-major order) and the new palette is
/// returned. On failure the matrix contents are unspecified (validation
/// failures are reported before any rewriting, the other classes may leave a
/// partially relabeled matrix behind).
///
/// # Resource model
/// Single-threaded; allocates one scratch matrix and the signature buffers up
/// front, plus per-pass tables of at most `n²` entries that are dropped at
/// pass end. No per-cell allocation.
pub fn refine(matrix: &mut ColorMatrix, declared: u32) -> Result<Palette, RefineError> {
    let n = matrix.order();
    if n == 0 {
        return Err(RefineError::EmptyMatrix);
    }
    if n > MAX_ORDER {
        return Err(RefineError::OrderTooLarge { order: n });
    }
    if declared >= PALETTE_CEILING {
        return Err(RefineError::PaletteOverflow {
            required: declared as usize,
        });
    }
    let on_diagonal = validate(matrix, declared)?;
    let mut palette = canonicalize(matrix, declared, &on_diagonal);

    let mut scratch_cells = Vec::new();
    scratch_cells
        .try_reserve_exact(n * n)
        .map_err(|_| RefineError::OutOfMemory)?;
    scratch_cells.resize(n * n, Color::new(0));
    let mut scratch = ColorMatrix::from_cells(n, scratch_cells);
    let mut builder = SignatureBuilder::with_order(n).ok_or(RefineError::OutOfMemory)?;

    // Each non-final pass strictly grows the palette and d ≤ n², so n² passes
    // always suffice; exceeding the budget is a logic error, not an input.
    let pass_budget = n * n;
    for _pass in 0..pass_budget {
        let mut tables = PassTables::new();
        for u in 0..n {
            for v in 0..n {
                let fingerprint = builder.cell_signature(matrix, palette.total, u, v);
                let provisional = tables.assign(u == v, fingerprint);
                scratch.set(u, v, Color::new(provisional));
            }
        }
        let next = tables.finalize()?;
        for u in 0..n {
            for v in 0..n {
                if u != v {
                    let rebased = scratch.get(u, v).as_u32() + next.diagonal;
                    scratch.set(u, v, Color::new(rebased));
                }
            }
        }
        matrix.swap_cells(&mut scratch);
        let previous = palette.total;
        palette = next;
        if palette.total == previous {
            return Ok(palette);
        }
        debug_assert!(palette.total > previous, "a pass must never coarsen");
    }
    unreachable!("refinement did not converge within the pass budget")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_matrix() {
        let mut m = ColorMatrix::filled(0, Color::new(0));
        assert_eq!(refine(&mut m, 1), Err(RefineError::EmptyMatrix));
    }

    #[test]
    fn rejects_out_of_range_value() {
        let mut m = ColorMatrix::from_raw(2, &[0, 1, 5, 0]);
        assert_eq!(
            refine(&mut m, 2),
            Err(RefineError::ColorOutOfRange { color: 5, declared: 2 })
        );
    }

    #[test]
    fn rejects_unused_color() {
        let mut m = ColorMatrix::from_raw(2, &[0, 2, 2, 0]);
        assert_eq!(refine(&mut m, 3), Err(RefineError::UnusedColor { color: 1 }));
    }

    #[test]
    fn rejects_diagonal_clash() {
        let mut m = ColorMatrix::from_raw(2, &[0, 0, 1, 0]);
        let before = m.clone();
        assert_eq!(refine(&mut m, 2), Err(RefineError::DiagonalClash { color: 0 }));
        // Validation fails before any rewriting.
        assert_eq!(m, before);
    }

    #[test]
    fn rejects_declared_palette_at_ceiling() {
        let mut m = ColorMatrix::filled(1, Color::new(0));
        assert_eq!(
            refine(&mut m, PALETTE_CEILING),
            Err(RefineError::PaletteOverflow {
                required: PALETTE_CEILING as usize
            })
        );
    }

    #[test]
    fn singleton_is_a_fixed_point() {
        let mut m = ColorMatrix::filled(1, Color::new(0));
        let palette = refine(&mut m, 1).unwrap();
        assert_eq!(palette, Palette { total: 1, diagonal: 1 });
        assert_eq!(m.get(0, 0), Color::new(0));
    }

    #[test]
    fn two_color_identity_pattern_is_cellular() {
        // One diagonal color, one off-diagonal color: already cellular for
        // any order, so the output partition equals the input partition.
        for n in [2usize, 3, 5] {
            let mut m = ColorMatrix::filled(n, Color::new(1));
            for u in 0..n {
                m.set(u, u, Color::new(0));
            }
            let input = m.clone();
            let palette = refine(&mut m, 2).unwrap();
            assert_eq!(palette, Palette { total: 2, diagonal: 1 });
            assert!(m.same_partition(&input), "order {} changed partition", n);
        }
    }

    #[test]
    fn canonicalization_moves_diagonal_colors_first() {
        // Diagonal color 1, off-diagonal color 0: valid but not canonical.
        let mut m = ColorMatrix::from_raw(2, &[1, 0, 0, 1]);
        let palette = refine(&mut m, 2).unwrap();
        assert_eq!(palette.diagonal, 1);
        assert_eq!(m.get(0, 0), Color::new(0));
        assert_eq!(m.get(0, 1), Color::new(1));
    }

    #[test]
    fn all_distinct_colors_are_cellular() {
        // n = 2 with four distinct colors: the discrete partition is always
        // cellular, so nothing splits (or merges).
        let mut m = ColorMatrix::from_raw(2, &[0, 2, 3, 1]);
        let input = m.clone();
        let palette = refine(&mut m, 4).unwrap();
        assert_eq!(palette, Palette { total: 4, diagonal: 2 });
        assert!(m.same_partition(&input));
    }

    #[test]
    fn refinement_never_merges_input_classes() {
        // A directed 3-cycle next to an isolated vertex, as a 4×4 coloring.
        let mut m = ColorMatrix::filled(4, Color::new(2));
        for u in 0..4 {
            m.set(u, u, Color::new(0));
        }
        for (u, v) in [(0, 1), (1, 2), (2, 0)] {
            m.set(u, v, Color::new(1));
        }
        let input = m.clone();
        let palette = refine(&mut m, 3).unwrap();
        assert!(palette.total >= 3);
        for u in 0..4 {
            for v in 0..4 {
                for x in 0..4 {
                    for y in 0..4 {
                        if m.get(u, v) == m.get(x, y) {
                            assert_eq!(input.get(u, v), input.get(x, y));
                        }
                    }
                }
            }
        }
    }
}
