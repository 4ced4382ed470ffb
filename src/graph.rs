//! Mutable directed graph store
//!
//! Owns the adjacency representation shared by every session. Vertex ids
//! are 0-based here; the wire boundary (1-based) is handled in the
//! protocol layer. Parallel edges and self-loops are allowed: adjacency
//! lists are multisets, and `remove_edge` removes a single occurrence.

use crate::error::{Result, SccdError};

/// A directed graph over vertices `0..n` with multiset edge semantics.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    adj: Vec<Vec<usize>>,
}

impl Graph {
    /// Create a graph with `n` isolated vertices.
    pub fn new(n: usize) -> Self {
        Self {
            adj: vec![Vec::new(); n],
        }
    }

    /// Replace the graph with `n` isolated vertices, discarding all edges.
    ///
    /// This is the only operation that changes the vertex count.
    pub fn reset(&mut self, n: usize) {
        self.adj = vec![Vec::new(); n];
    }

    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adj.iter().map(Vec::len).sum()
    }

    /// Add the directed edge `u -> v`. Duplicates accumulate.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<()> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        self.adj[u].push(v);
        Ok(())
    }

    /// Remove one occurrence of `u -> v`. Absence is not an error.
    pub fn remove_edge(&mut self, u: usize, v: usize) -> Result<()> {
        self.check_vertex(u)?;
        self.check_vertex(v)?;
        if let Some(pos) = self.adj[u].iter().position(|&w| w == v) {
            self.adj[u].remove(pos);
        }
        Ok(())
    }

    /// Out-neighbors of `v`, one entry per parallel edge.
    pub fn out_neighbors(&self, v: usize) -> &[usize] {
        &self.adj[v]
    }

    fn check_vertex(&self, v: usize) -> Result<()> {
        if v < self.adj.len() {
            Ok(())
        } else {
            Err(SccdError::InvalidVertex {
                vertex: v,
                n: self.adj.len(),
            })
        }
    }
}
