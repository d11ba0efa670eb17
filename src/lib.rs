//! Weisfeiler: coherent (Weisfeiler–Leman) refinement of matrix colorings.
//!
//! This crate computes the coarsest *cellular* refinement of a coloring of
//! `Ω × Ω` for a finite set `Ω = {0, …, n-1}`: the input is an `n × n`
//! matrix of color indices, the output is a matrix over a new palette in
//! which, for every ordered color triple `(i, j, k)`, the number of
//! `w ∈ Ω` completing an `i`-`j` path between the endpoints of a `k`-cell
//! is the same for all `k`-cells. Diagonal and off-diagonal colors are kept
//! in disjoint contiguous ranges throughout (a *coherent* coloring).
//!
//! The kernel is single-threaded and deterministic: a fixed row-major
//! traversal, a fixed signature strategy, and first-occurrence numbering
//! make outputs reproducible run to run. Only the induced partition is
//! canonical across implementations.
//!
//! # Mathematical Foundations
//!
//! The fixed point of the refinement is the adjacency algebra of a coherent
//! configuration: the 0/1 indicator matrices of the final color classes are
//! closed under matrix multiplication over the non-negative integers. The
//! per-pass step replaces each cell's color with (a fingerprint of) the
//! multiset of color pairs `{(A[u,w], A[w,v]) : w ∈ Ω}`.
//!
//! # References
//!
//! - Weisfeiler, Leman. "A reduction of a graph to a canonical form and an
//!   algebra arising during this reduction" (1968)
//! - Weisfeiler (ed.). "On Construction and Identification of Graphs",
//!   Springer LNM 558 (1976)
//! - Higman. "Coherent configurations I" (1970)
//! - Babel, Chuvaeva, Klin, Pasechnik. "Algebraic combinatorics in
//!   mathematical chemistry II. Program implementation of the
//!   Weisfeiler-Leman algorithm" (1997)
//!
//! # Example
//!
//! ```
//! use weisfeiler::prelude::*;
//!
//! // A 4-cycle. Its distance partition is already coherent: one vertex
//! // class, edges and non-edges apart.
//! let graph = ColoredGraph::from_adjacency(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
//! let (mut matrix, palette) = graph.to_matrix();
//! let refined = refine(&mut matrix, palette.total).unwrap();
//! assert_eq!(refined.diagonal, 1);
//! assert_eq!(refined.total, 3);
//! ```

pub mod graph;
pub mod io;
pub mod matrix;
pub mod palette;
pub mod refine;
pub mod signature;

pub use graph::ColoredGraph;
pub use matrix::{Color, ColorMatrix, MAX_ORDER};
pub use palette::{Palette, PALETTE_CEILING};
pub use refine::{refine, RefineError};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::graph::ColoredGraph;
    pub use crate::io::{parse_matrix, render_matrix, ParseError};
    pub use crate::matrix::{Color, ColorMatrix, MAX_ORDER};
    pub use crate::palette::{Palette, PALETTE_CEILING};
    pub use crate::refine::{refine, RefineError};
    pub use crate::signature::{SignatureBuilder, SignatureHash};
}
