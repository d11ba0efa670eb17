//! Palette management: signature interning and the diagonal/off-diagonal split.
//!
//! A *coherent* coloring keeps diagonal and off-diagonal colors in disjoint
//! contiguous ranges, diagonal first. Each refinement pass interns cell
//! signatures into two separate tables, one per range, and concatenates the
//! ranges on finalisation. The tables live strictly shorter than the matrix:
//! built at pass begin, dropped at pass end on every exit path.
//!
//! # Citations
//! - Higman, "Coherent configurations I" (1970)

use crate::refine::RefineError;
use crate::signature::SignatureHash;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Palette ceiling: refinement aborts when the next palette would reach this
/// size. Keeps packed-key arithmetic far inside the 64-bit accumulator and
/// matches the documented 16-bit index-width recommendation.
pub const PALETTE_CEILING: u32 = 1 << 16;

/// A palette size together with its diagonal/off-diagonal split.
///
/// Diagonal colors occupy `{0, …, diagonal-1}`, off-diagonal colors occupy
/// `{diagonal, …, total-1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Total number of colors `d`.
    pub total: u32,
    /// Number of diagonal colors `d_D`.
    pub diagonal: u32,
}

impl Palette {
    /// Returns the number of off-diagonal colors.
    #[inline]
    pub fn off_diagonal(&self) -> u32 {
        self.total - self.diagonal
    }

    /// Checks whether a color value lies in the diagonal range.
    #[inline]
    pub fn is_diagonal_color(&self, color: crate::matrix::Color) -> bool {
        color.as_u32() < self.diagonal
    }
}

/// Per-pass signature tables.
///
/// Maps each signature fingerprint to a *provisional* color index, counted
/// from zero separately within the diagonal and off-diagonal ranges. The
/// driver rebases off-diagonal indices by the final diagonal count after
/// [`PassTables::finalize`].
///
/// # Invariants
/// - The two tables never share color values once rebased: diagonal indices
///   are final, off-diagonal indices are shifted past them.
/// - Indices within a table are dense: `0, 1, …, len-1` in order of first
///   assignment, which for a row-major traversal makes the output numbering
///   deterministic.
#[derive(Debug, Default)]
pub struct PassTables {
    diagonal: BTreeMap<SignatureHash, u32>,
    off_diagonal: BTreeMap<SignatureHash, u32>,
}

impl PassTables {
    /// Creates fresh, empty tables for one pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the provisional color index for a signature, creating the
    /// next-unused index in the cell's range on first sight.
    pub fn assign(&mut self, on_diagonal: bool, signature: SignatureHash) -> u32 {
        let table = if on_diagonal {
            &mut self.diagonal
        } else {
            &mut self.off_diagonal
        };
        let next = table.len() as u32;
        *table.entry(signature).or_insert(next)
    }

    /// Concatenates the two ranges and reports the new palette.
    ///
    /// Fails with [`RefineError::PaletteOverflow`] when the combined palette
    /// would reach [`PALETTE_CEILING`]. Consumes the tables; their storage is
    /// released before the next pass begins.
    pub fn finalize(self) -> Result<Palette, RefineError> {
        let diagonal = self.diagonal.len();
        let required = diagonal + self.off_diagonal.len();
        if required >= PALETTE_CEILING as usize {
            return Err(RefineError::PaletteOverflow { required });
        }
        Ok(Palette {
            total: required as u32,
            diagonal: diagonal as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(tag: u64) -> SignatureHash {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&tag.to_le_bytes());
        SignatureHash::from_bytes(bytes)
    }

    #[test]
    fn assign_is_dense_and_stable() {
        let mut tables = PassTables::new();
        assert_eq!(tables.assign(true, fp(10)), 0);
        assert_eq!(tables.assign(true, fp(20)), 1);
        assert_eq!(tables.assign(true, fp(10)), 0); // repeat lookup
        assert_eq!(tables.assign(false, fp(10)), 0); // ranges are independent
        assert_eq!(tables.assign(false, fp(30)), 1);
    }

    #[test]
    fn finalize_concatenates_ranges() {
        let mut tables = PassTables::new();
        tables.assign(true, fp(1));
        tables.assign(true, fp(2));
        tables.assign(false, fp(3));
        tables.assign(false, fp(4));
        tables.assign(false, fp(5));
        let palette = tables.finalize().unwrap();
        assert_eq!(palette.diagonal, 2);
        assert_eq!(palette.total, 5);
        assert_eq!(palette.off_diagonal(), 3);
    }

    #[test]
    fn finalize_detects_overflow() {
        let mut tables = PassTables::new();
        tables.assign(true, fp(u64::MAX));
        for i in 0..PALETTE_CEILING as u64 - 1 {
            tables.assign(false, fp(i));
        }
        assert!(matches!(
            tables.finalize(),
            Err(RefineError::PaletteOverflow { required }) if required == PALETTE_CEILING as usize
        ));
    }
}
