//! Dense color matrices over `Ω × Ω`.
//!
//! A coloring of the Cartesian square of `Ω = {0, …, n-1}` is stored as a
//! dense row-major `n × n` array of color indices. Squareness is a type
//! invariant: constructors take the order and exactly `order²` cells.
//!
//! # Citations
//! - Weisfeiler & Leman, "A reduction of a graph to a canonical form and an
//!   algebra arising during this reduction" (1968)
//! - Higman, "Coherent configurations I" (1970): the diagonal/off-diagonal split

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Largest supported matrix order.
///
/// Cells are 32-bit and packed contribution keys are accumulated in 64 bits;
/// `65 535` rows is the documented ceiling for that representation.
pub const MAX_ORDER: usize = 65_535;

/// A color index in the palette `{0, …, d-1}`.
///
/// Uses a transparent `u32` wrapper for efficient comparison and hashing.
/// Whether a value is a *diagonal* or an *off-diagonal* color is a property
/// of the palette split, not of the value itself (see [`crate::palette::Palette`]).
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Color(u32);

impl Color {
    /// Creates a new `Color` from a raw `u32` index.
    #[inline]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw `u32` index.
    #[inline]
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Returns the index widened to `usize` (for table lookups).
    #[inline]
    pub const fn as_usize(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dense `n × n` matrix of color indices, row-major.
///
/// # Invariants
/// - `cells.len() == order * order` always.
/// - The matrix says nothing about palette validity; that is checked by the
///   refinement driver (values in range, contiguous, diagonal/off-diagonal
///   disjoint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorMatrix {
    order: usize,
    cells: Vec<Color>,
}

impl ColorMatrix {
    /// Creates a matrix of the given order with every cell set to `fill`.
    pub fn filled(order: usize, fill: Color) -> Self {
        Self {
            order,
            cells: vec![fill; order * order],
        }
    }

    /// Creates a matrix from a row-major cell vector.
    ///
    /// # Panics
    /// If `cells.len() != order * order`.
    pub fn from_cells(order: usize, cells: Vec<Color>) -> Self {
        assert_eq!(
            cells.len(),
            order * order,
            "cell vector length must equal order squared"
        );
        Self { order, cells }
    }

    /// Creates a matrix from raw `u32` values, row-major.
    ///
    /// # Panics
    /// If `raw.len() != order * order`.
    pub fn from_raw(order: usize, raw: &[u32]) -> Self {
        Self::from_cells(order, raw.iter().copied().map(Color::new).collect())
    }

    /// Returns the matrix order `n`.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Returns the color at cell `(u, v)`.
    ///
    /// # Panics
    /// If `u` or `v` is out of bounds.
    #[inline]
    pub fn get(&self, u: usize, v: usize) -> Color {
        self.cells[u * self.order + v]
    }

    /// Sets the color at cell `(u, v)`.
    ///
    /// # Panics
    /// If `u` or `v` is out of bounds.
    #[inline]
    pub fn set(&mut self, u: usize, v: usize, color: Color) {
        self.cells[u * self.order + v] = color;
    }

    /// Returns row `u` as a contiguous slice.
    #[inline]
    pub fn row(&self, u: usize) -> &[Color] {
        &self.cells[u * self.order..(u + 1) * self.order]
    }

    /// Returns all cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Color] {
        &self.cells
    }

    /// Returns all cells mutably, row-major.
    #[inline]
    pub(crate) fn cells_mut(&mut self) -> &mut [Color] {
        &mut self.cells
    }

    /// Swaps the cell storage of two matrices of equal order.
    pub(crate) fn swap_cells(&mut self, other: &mut ColorMatrix) {
        debug_assert_eq!(self.order, other.order);
        std::mem::swap(&mut self.cells, &mut other.cells);
    }

    /// Checks whether two matrices induce the same partition of `Ω × Ω`.
    ///
    /// Color *numbering* may differ; only the equivalence classes are
    /// compared. This is the equality relevant for refinement outputs, whose
    /// numbering is deterministic per implementation but not canonical.
    pub fn same_partition(&self, other: &ColorMatrix) -> bool {
        if self.order != other.order {
            return false;
        }
        let mut fwd: HashMap<Color, Color> = HashMap::new();
        let mut bwd: HashMap<Color, Color> = HashMap::new();
        for (&a, &b) in self.cells.iter().zip(other.cells.iter()) {
            if *fwd.entry(a).or_insert(b) != b {
                return false;
            }
            if *bwd.entry(b).or_insert(a) != a {
                return false;
            }
        }
        true
    }

    /// Renumbers arbitrary cell values into a canonical coherent palette.
    ///
    /// Distinct diagonal values become `0..d_D` (ascending by old value) and
    /// distinct off-diagonal values become `d_D..d`. A value that appears in
    /// both positions is treated as two separate classes, so the result
    /// always satisfies the coherence invariant regardless of the input.
    ///
    /// This is the wrapper-level palette repair; the refinement driver itself
    /// rejects non-coherent input rather than repairing it.
    pub fn fix_colors(&mut self) -> crate::palette::Palette {
        use std::collections::BTreeMap;
        let n = self.order;
        let mut diagonal: BTreeMap<Color, u32> = BTreeMap::new();
        let mut off_diagonal: BTreeMap<Color, u32> = BTreeMap::new();
        for u in 0..n {
            for v in 0..n {
                let c = self.get(u, v);
                let table = if u == v { &mut diagonal } else { &mut off_diagonal };
                table.insert(c, 0);
            }
        }
        // Ranks follow the sorted key order, diagonal range first.
        for (rank, value) in diagonal.values_mut().enumerate() {
            *value = rank as u32;
        }
        let split = diagonal.len() as u32;
        for (rank, value) in off_diagonal.values_mut().enumerate() {
            *value = split + rank as u32;
        }
        for u in 0..n {
            for v in 0..n {
                let c = self.get(u, v);
                let new = if u == v { diagonal[&c] } else { off_diagonal[&c] };
                self.set(u, v, Color::new(new));
            }
        }
        crate::palette::Palette {
            total: split + off_diagonal.len() as u32,
            diagonal: split,
        }
    }
}
