//! Encoding colored graphs as coherent matrix colorings.
//!
//! The refinement kernel works on matrices; this wrapper builds them from
//! graphs. Vertices carry *vertex colors* (the future diagonal cells) and
//! ordered vertex pairs carry *edge colors* (the off-diagonal cells). The
//! encoder renumbers both families into the canonical coherent palette, so
//! the produced matrix always passes the driver's validation.
//!
//! # Citations
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014): colored
//!   graphs as the common front-end of partition refinement

use crate::matrix::{Color, ColorMatrix};
use crate::palette::Palette;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A finite graph with colored vertices and colored ordered pairs.
///
/// Color values are arbitrary `u32` labels; only their equivalence classes
/// matter. An unweighted simple graph is the special case with one vertex
/// color and edge colors `{0, 1}` for non-edge/edge (see
/// [`ColoredGraph::from_adjacency`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColoredGraph {
    order: usize,
    vertex_colors: Vec<u32>,
    /// Row-major `order × order` pair colors; diagonal entries are unused.
    edge_colors: Vec<u32>,
}

impl ColoredGraph {
    /// Creates a graph on `order` vertices with all colors zero.
    pub fn with_order(order: usize) -> Self {
        Self {
            order,
            vertex_colors: vec![0; order],
            edge_colors: vec![0; order * order],
        }
    }

    /// Encodes an unweighted simple graph from an undirected edge list.
    ///
    /// Every listed edge gets pair color `1` in both directions; all other
    /// pairs keep color `0`. Vertices share one color.
    ///
    /// # Panics
    /// If an edge endpoint is out of bounds or an edge is a loop.
    pub fn from_adjacency(order: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self::with_order(order);
        for &(a, b) in edges {
            graph.set_edge_color(a, b, 1);
            graph.set_edge_color(b, a, 1);
        }
        graph
    }

    /// Returns the number of vertices.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Sets the color of vertex `v`.
    ///
    /// # Panics
    /// If `v` is out of bounds.
    pub fn set_vertex_color(&mut self, v: usize, color: u32) {
        self.vertex_colors[v] = color;
    }

    /// Sets the color of the ordered pair `(u, v)`.
    ///
    /// # Panics
    /// If `u == v` (vertex colors live on the diagonal) or an index is out
    /// of bounds.
    pub fn set_edge_color(&mut self, u: usize, v: usize, color: u32) {
        assert!(u != v, "pair colors are off-diagonal; use set_vertex_color");
        assert!(u < self.order && v < self.order, "vertex out of bounds");
        self.edge_colors[u * self.order + v] = color;
    }

    /// Builds the coherent matrix coloring of this graph.
    ///
    /// Distinct vertex colors become the diagonal range `0..d_D` and distinct
    /// pair colors the off-diagonal range `d_D..d`, each ascending by old
    /// label. The result satisfies the validation rules of
    /// [`crate::refine::refine`] by construction.
    pub fn to_matrix(&self) -> (ColorMatrix, Palette) {
        let n = self.order;
        let mut vertex_classes: BTreeMap<u32, u32> = BTreeMap::new();
        let mut pair_classes: BTreeMap<u32, u32> = BTreeMap::new();
        for &c in &self.vertex_colors {
            vertex_classes.insert(c, 0);
        }
        for u in 0..n {
            for v in 0..n {
                if u != v {
                    pair_classes.insert(self.edge_colors[u * n + v], 0);
                }
            }
        }
        for (rank, value) in vertex_classes.values_mut().enumerate() {
            *value = rank as u32;
        }
        let diagonal = vertex_classes.len() as u32;
        for (rank, value) in pair_classes.values_mut().enumerate() {
            *value = diagonal + rank as u32;
        }

        let mut matrix = ColorMatrix::filled(n, Color::new(0));
        for u in 0..n {
            for v in 0..n {
                let new = if u == v {
                    vertex_classes[&self.vertex_colors[u]]
                } else {
                    pair_classes[&self.edge_colors[u * n + v]]
                };
                matrix.set(u, v, Color::new(new));
            }
        }
        let palette = Palette {
            total: diagonal + pair_classes.len() as u32,
            diagonal,
        };
        (matrix, palette)
    }
}
