use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use super::transit_network::TransitNetwork;
use super::RouteOptError;


/// How many consecutive draws of the current node are tolerated before giving up.
pub const MAX_STALLED_DRAWS: usize = 1000;
const FAR_POOL_SIZE: usize = 10;
const FAR_POOL_PENALTY: f64 = 4.;

/// Which node's neighbour ranking the candidate pools are taken from at each step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RankAnchor {
    /// The current last node of the walk.
    Frontier,
    /// One node, the same at every step.  `Fixed(0)` reproduces the routes of older runs,
    /// which always ranked the neighbours of node 0.
    Fixed(usize),
}

impl Default for RankAnchor {
    fn default() -> RankAnchor {
        RankAnchor::Frontier
    }
}


/// Grows a stochastic path of exactly `walk_len` stops from `source` to `destination`.
///
/// At each step two candidate pools are cut from the anchor's neighbour ranking (longest
/// edges first): a near pool of `walk.len() + 1` nodes and a far pool of 10.  The
/// destination is never a candidate.  A candidate `c` is drawn with weight
/// `1 / (1 + len(c, destination))`, with the far pool's lengths multiplied by 4 so that it
/// is picked less often.  Drawing the current last node is retried.
pub fn random_walk<RR>(network: &TransitNetwork, source: usize, destination: usize,
                       walk_len: usize, anchor: RankAnchor, rng: &mut RR)
                       -> Result<Vec<usize>, RouteOptError>
                       where RR: Rng {
    if walk_len < 2 {
        return Err(RouteOptError::invalid("walk_len", "a walk needs at least two stops"));
    }
    for (name, node) in &[("source", source), ("destination", destination)] {
        if !network.contains_node(*node) {
            return Err(RouteOptError::invalid(name, format!("node {} is not in the network",
                                                            node)));
        }
    }
    if let RankAnchor::Fixed(node) = anchor {
        if !network.contains_node(node) {
            return Err(RouteOptError::invalid("anchor", format!("node {} is not in the network",
                                                                node)));
        }
    }
    if source == destination && walk_len == 2 {
        return Err(RouteOptError::invalid("destination",
                                          "a two-stop walk cannot start where it ends"));
    }

    let mut walk = vec![source];
    let mut stalled_draws = 0;
    while walk.len() < walk_len - 1 {
        let last = walk[walk.len() - 1];
        let ranking = match anchor {
            RankAnchor::Frontier => network.ranked_neighbours(last),
            RankAnchor::Fixed(node) => network.ranked_neighbours(node),
        };

        let mut candidates = vec![];
        let mut weights = vec![];
        let pools = [(walk.len() + 1, 1.), (FAR_POOL_SIZE, FAR_POOL_PENALTY)];
        for (pool_size, penalty) in pools.iter() {
            for node in ranking.iter().take(*pool_size).filter(|nn| **nn != destination) {
                // nodes with no direct edge to the destination sit this step out
                if let Some(length) = network.edge_length(*node, destination) {
                    candidates.push(*node);
                    weights.push(1. / (1. + length * penalty));
                }
            }
        }

        if candidates.is_empty() {
            return Err(RouteOptError::NoViableContinuation {
                walk_len: walk.len(),
                destination,
            });
        }
        let dist = WeightedIndex::new(&weights).map_err(|err| {
            RouteOptError::degenerate(format!("walk candidate weights ({})", err))
        })?;

        let next = candidates[dist.sample(rng)];
        if next != last {
            walk.push(next);
            stalled_draws = 0;
        } else {
            stalled_draws += 1;
            if stalled_draws >= MAX_STALLED_DRAWS {
                return Err(RouteOptError::StalledWalk {
                    node: last,
                    attempts: stalled_draws,
                });
            }
        }
    }
    walk.push(destination);

    log::trace!("walk from {} to {}: {:?}", source, destination, walk);
    Ok(walk)
}
