use std::cmp::Ordering;
use std::path::Path;

use ndarray::prelude::*;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::table_io;
use super::RouteOptError;


/// Boarding and alighting propensities of a stop.  Neither needs to be normalized.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct NodeProbs {
    pub prob_in: f64,
    pub prob_out: f64,
}

#[derive(PartialEq, Debug, Clone, Default)]
pub struct StopNode {
    pub probs: Option<NodeProbs>,
}

/// A weighted undirected network over stops `0..n`.  Built once per run and read-only after.
#[derive(Debug, Clone)]
pub struct TransitNetwork {
    graph: UnGraph<StopNode, f64>,
}

impl TransitNetwork {
    /// Adds an edge for every pair `(i, j)` with `i <= j`, self-edges included, weighted by
    /// `matrix[[i, j]]`.
    pub fn from_matrix(num_nodes: usize, matrix: &Array<f64, Ix2>)
                       -> Result<TransitNetwork, RouteOptError> {
        if matrix.dim() != (num_nodes, num_nodes) {
            return Err(RouteOptError::ShapeMismatch {
                expected: (num_nodes, num_nodes),
                found: matrix.dim(),
            });
        }

        let mut graph = UnGraph::with_capacity(num_nodes, num_nodes * (num_nodes + 1) / 2);
        for _ in 0..num_nodes {
            graph.add_node(StopNode::default());
        }
        for ii in 0..num_nodes {
            for jj in ii..num_nodes {
                let length = matrix[[ii, jj]];
                if !length.is_finite() || length < 0. {
                    return Err(RouteOptError::invalid(
                        "distance matrix",
                        format!("entry ({}, {}) is {}, lengths must be finite and non-negative",
                                ii, jj, length)));
                }
                graph.add_edge(NodeIndex::new(ii), NodeIndex::new(jj), length);
            }
        }
        log::debug!("built network with {} nodes and {} edges", graph.node_count(),
                    graph.edge_count());

        Ok(TransitNetwork { graph })
    }

    pub fn from_csv(num_nodes: usize, matrix_path: &Path)
                    -> Result<TransitNetwork, RouteOptError> {
        let matrix = table_io::read_numeric_table(matrix_path)?;
        TransitNetwork::from_matrix(num_nodes, &matrix)
    }

    /// Attaches `(prob_in, prob_out)` to each node; row `ii` belongs to node `ii`.
    pub fn with_node_probs(mut self, probs: &[(f64, f64)])
                           -> Result<TransitNetwork, RouteOptError> {
        if probs.len() != self.num_nodes() {
            return Err(RouteOptError::ShapeMismatch {
                expected: (self.num_nodes(), 2),
                found: (probs.len(), 2),
            });
        }
        for (ii, (prob_in, prob_out)) in probs.iter().enumerate() {
            let node = &mut self.graph[NodeIndex::new(ii)];
            node.probs = Some(NodeProbs { prob_in: *prob_in, prob_out: *prob_out });
        }
        Ok(self)
    }

    pub fn with_node_probs_csv(self, probs_path: &Path)
                               -> Result<TransitNetwork, RouteOptError> {
        let probs = table_io::read_node_probs(probs_path)?;
        self.with_node_probs(&probs)
    }

    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains_node(&self, node: usize) -> bool {
        node < self.num_nodes()
    }

    pub fn node_probs(&self, node: usize) -> Option<NodeProbs> {
        self.graph.node_weight(NodeIndex::new(node)).and_then(|nn| nn.probs)
    }

    pub fn edge_length(&self, from: usize, to: usize) -> Option<f64> {
        if !self.contains_node(from) || !self.contains_node(to) {
            return None;
        }
        self.graph.find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .map(|ei| self.graph[ei])
    }

    /// All edges as `(i, j, length)` with `i <= j`.
    pub fn edges(&self) -> Vec<(usize, usize, f64)> {
        self.graph.edge_references().map(|er| {
            let (aa, bb) = (er.source().index(), er.target().index());
            (aa.min(bb), aa.max(bb), *er.weight())
        }).collect()
    }

    /// Neighbours of `node` (itself included, via its self-edge) ordered by edge length,
    /// longest first.  Ties are broken by node id so the ranking is deterministic.
    pub fn ranked_neighbours(&self, node: usize) -> Vec<usize> {
        if !self.contains_node(node) {
            return vec![];
        }
        let ni = NodeIndex::new(node);
        let mut nbrs: Vec<(usize, f64)> = self.graph.edges(ni).map(|er| {
            let other = if er.source() == ni { er.target() } else { er.source() };
            (other.index(), *er.weight())
        }).collect();
        nbrs.sort_by(|aa, bb| {
            bb.1.partial_cmp(&aa.1).unwrap_or(Ordering::Equal).then(aa.0.cmp(&bb.0))
        });
        nbrs.dedup_by_key(|nbr| nbr.0);
        nbrs.into_iter().map(|(nn, _)| nn).collect()
    }

    /// Sum of edge lengths between consecutive stops.
    pub fn path_length(&self, stops: &[usize]) -> Result<f64, RouteOptError> {
        let mut length = 0.;
        for pair in stops.windows(2) {
            length += self.edge_length(pair[0], pair[1]).ok_or_else(|| {
                RouteOptError::invalid("stops", format!("no edge between {} and {}",
                                                        pair[0], pair[1]))
            })?;
        }
        Ok(length)
    }
}
