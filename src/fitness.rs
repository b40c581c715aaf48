use std::collections::HashMap;

use super::demand::DemandGraph;
use super::fleet_plan::FleetPlan;
use super::RouteOptError;


/// The `(c1, c2, c3)` coefficients of the objective.  Negative values express penalties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveWeights {
    pub served: f64,
    pub buses: f64,
    pub avg_route_len: f64,
}

impl ObjectiveWeights {
    pub fn new(served: f64, buses: f64, avg_route_len: f64) -> ObjectiveWeights {
        ObjectiveWeights { served, buses, avg_route_len }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessComponents {
    /// Passengers who found room on some route.
    pub num_ppl: u64,
    /// Sum over routes of `ceil(num_vehicles / max_trips)`.
    pub num_buses_per_route: u64,
    /// `cum_len / num_buses` of the plan.
    pub avg_route_len: f64,
}

impl FitnessComponents {
    /// The weighted objective, clamped below at zero.
    pub fn score(&self, weights: &ObjectiveWeights) -> f64 {
        let score = weights.served * self.num_ppl as f64
            + weights.buses * self.num_buses_per_route as f64
            + weights.avg_route_len * self.avg_route_len;
        if score > 0. {
            score
        } else {
            0.
        }
    }
}


/// Simulates the plan against `demand` and returns the unweighted components.
///
/// Routes are run one after another against a private copy of the demand, so passengers
/// served by an earlier route are no longer waiting for a later one.  Along a route, each
/// stop first releases the seats of passengers alighting there, then boards waiting
/// passengers for each later stop in route order until the route's total capacity
/// (`num_vehicles * capacity`) is used up.
pub fn fitness_components<PP>(plan: &PP, demand: &DemandGraph, max_trips: u32)
                              -> Result<FitnessComponents, RouteOptError>
                              where PP: FleetPlan {
    if max_trips == 0 {
        return Err(RouteOptError::invalid("max_trips", "must be at least 1"));
    }
    if plan.num_buses() == 0 {
        return Err(RouteOptError::invalid("plan", "a plan without vehicles can't be scored"));
    }

    let mut remaining = demand.clone();
    for route in plan.routes() {
        let stops = route.active_stops();
        let mut current_capacity = route.total_capacity();
        // seats to free up on reaching each stop
        let mut deboarding: HashMap<usize, u64> = HashMap::new();
        for (ii, here) in stops.iter().enumerate() {
            current_capacity += deboarding.remove(here).unwrap_or(0);
            for later in &stops[ii + 1..] {
                if current_capacity == 0 {
                    break;
                }
                let room = current_capacity.min(u32::MAX as u64) as u32;
                let boarding = remaining.take(*here, *later, room) as u64;
                if boarding > 0 {
                    *deboarding.entry(*later).or_insert(0) += boarding;
                    current_capacity -= boarding;
                }
            }
        }
    }
    let num_ppl = demand.total_weight() - remaining.total_weight();

    let num_buses_per_route = plan.routes().iter()
        .map(|rr| {
            let (num_vehicles, max_trips) = (rr.num_vehicles as u64, max_trips as u64);
            (num_vehicles + max_trips - 1) / max_trips
        })
        .sum();

    Ok(FitnessComponents {
        num_ppl,
        num_buses_per_route,
        avg_route_len: plan.cum_len() / plan.num_buses() as f64,
    })
}

/// The clamped, weighted score of a plan.
pub fn fitness<PP>(plan: &PP, demand: &DemandGraph, weights: &ObjectiveWeights, max_trips: u32)
                   -> Result<f64, RouteOptError>
                   where PP: FleetPlan {
    Ok(fitness_components(plan, demand, max_trips)?.score(weights))
}
