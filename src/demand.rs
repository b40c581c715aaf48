use std::collections::HashMap;

use petgraph::graphmap::DiGraphMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::transit_network::TransitNetwork;
use super::RouteOptError;


/// Directed origin-destination passenger counts.  An edge exists only when at least one trip
/// was drawn for it, and never from a node to itself.
#[derive(Debug, Clone, Default)]
pub struct DemandGraph {
    graph: DiGraphMap<usize, u32>,
}

impl DemandGraph {
    pub fn new() -> DemandGraph {
        DemandGraph { graph: DiGraphMap::new() }
    }

    /// Builds a demand graph from `(origin, destination, count)` triples.  Self-loops and
    /// zero counts are dropped; repeated pairs are added together.
    pub fn from_edges(edges: &[(usize, usize, u32)]) -> DemandGraph {
        let mut demand = DemandGraph::new();
        for (origin, destination, count) in edges {
            demand.add_trips(*origin, *destination, *count);
        }
        demand
    }

    pub fn add_trips(&mut self, origin: usize, destination: usize, count: u32) {
        if origin == destination || count == 0 {
            return;
        }
        match self.graph.edge_weight_mut(origin, destination) {
            Some(weight) => *weight += count,
            None => {
                self.graph.add_edge(origin, destination, count);
            }
        }
    }

    /// Remaining passengers from `origin` to `destination`.
    pub fn weight(&self, origin: usize, destination: usize) -> u32 {
        self.graph.edge_weight(origin, destination).cloned().unwrap_or(0)
    }

    /// Removes up to `count` passengers from an edge and returns how many were removed.  The
    /// edge stays in place, possibly with a weight of zero.
    pub fn take(&mut self, origin: usize, destination: usize, count: u32) -> u32 {
        match self.graph.edge_weight_mut(origin, destination) {
            Some(weight) => {
                let taken = count.min(*weight);
                *weight -= taken;
                taken
            }
            None => 0,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn total_weight(&self) -> u64 {
        self.graph.all_edges().map(|(_, _, ww)| *ww as u64).sum()
    }

    pub fn edges(&self) -> Vec<(usize, usize, u32)> {
        self.graph.all_edges().map(|(oo, dd, ww)| (oo, dd, *ww)).collect()
    }
}

/// Two demand graphs are equal when they hold the same passengers; drained edges don't count.
impl PartialEq for DemandGraph {
    fn eq(&self, other: &Self) -> bool {
        let waiting = |demand: &DemandGraph| {
            let mut edges: Vec<_> = demand.edges().into_iter()
                .filter(|(_, _, count)| *count > 0)
                .collect();
            edges.sort();
            edges
        };
        waiting(self) == waiting(other)
    }
}


fn weighted_index(weights: &[f64], what: &str) -> Result<WeightedIndex<f64>, RouteOptError> {
    if weights.iter().any(|ww| !ww.is_finite() || *ww < 0.) {
        return Err(RouteOptError::degenerate(format!("{} (negative or non-finite entry)",
                                                     what)));
    }
    let total: f64 = weights.iter().sum();
    if total <= 0. {
        return Err(RouteOptError::degenerate(format!("{} (sums to {})", what, total)));
    }
    WeightedIndex::new(weights).map_err(|err| RouteOptError::degenerate(
        format!("{} ({})", what, err)))
}


/// Draws `num_of_people` trips and tallies them into a demand graph.  Origins are drawn from
/// the normalized `prob_out` of each node and destinations, independently, from `prob_in`;
/// the i-th origin is paired with the i-th destination.  Pairs with the same origin and
/// destination are discarded, so the total weight is at most `num_of_people`.
pub fn simulate_people<RR>(network: &TransitNetwork, num_of_people: usize, rng: &mut RR)
                           -> Result<DemandGraph, RouteOptError>
                           where RR: Rng {
    let mut probs_out = vec![];
    let mut probs_in = vec![];
    for node in 0..network.num_nodes() {
        let probs = network.node_probs(node)
            .ok_or(RouteOptError::MissingNodeProbabilities { node })?;
        probs_out.push(probs.prob_out);
        probs_in.push(probs.prob_in);
    }
    let out_dist = weighted_index(&probs_out, "prob_out")?;
    let in_dist = weighted_index(&probs_in, "prob_in")?;

    let origins: Vec<usize> = (0..num_of_people).map(|_| out_dist.sample(rng)).collect();
    let destinations: Vec<usize> = (0..num_of_people).map(|_| in_dist.sample(rng)).collect();

    let mut counts = HashMap::new();
    for (origin, destination) in origins.into_iter().zip(destinations) {
        if origin != destination {
            *counts.entry((origin, destination)).or_insert(0) += 1;
        }
    }

    let mut demand = DemandGraph::new();
    for ((origin, destination), count) in counts {
        demand.add_trips(origin, destination, count);
    }
    if demand.edge_count() == 0 && num_of_people > 0 {
        log::warn!("none of the {} simulated people travel between distinct stops",
                   num_of_people);
    }
    log::debug!("simulated {} people, {} travel on {} od pairs", num_of_people,
                demand.total_weight(), demand.edge_count());

    Ok(demand)
}
