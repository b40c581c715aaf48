use itertools::Itertools;
use rand::Rng;

use super::random_walk::{random_walk, RankAnchor};
use super::transit_network::TransitNetwork;
use super::RouteOptError;


/// What the genetic optimizer needs from a candidate solution.  Implementations must stay
/// structurally valid after `mutate` and `crossover`: every route keeps at least one vehicle
/// and the cached statistics match the routes.
pub trait FleetPlan: Clone + Send + Sync {
    fn routes(&self) -> &[BusRoute];

    /// Total length of all routes.
    fn cum_len(&self) -> f64;

    /// Total number of vehicles over all routes.
    fn num_buses(&self) -> u32;

    /// Perturbs the plan in place with probability `mutation_prob`.
    fn mutate<RR: Rng>(&mut self, mutation_prob: f64, rng: &mut RR);

    /// Recombines this plan with `other`, turning both into offspring.
    fn crossover<RR: Rng>(&mut self, other: &mut Self, rng: &mut RR);
}


#[derive(PartialEq, Debug, Clone)]
pub struct BusRoute {
    stops: Vec<usize>,
    disabled: Vec<bool>,
    pub num_vehicles: u32,
    /// Passengers per vehicle.
    pub capacity: u32,
    length: f64,
}

impl BusRoute {
    pub fn new(stops: Vec<usize>, num_vehicles: u32, capacity: u32, network: &TransitNetwork)
               -> Result<BusRoute, RouteOptError> {
        let length = network.path_length(&stops)?;
        BusRoute::with_length(stops, num_vehicles, capacity, length)
    }

    /// Builds a route whose length is already known.
    pub fn with_length(stops: Vec<usize>, num_vehicles: u32, capacity: u32, length: f64)
                       -> Result<BusRoute, RouteOptError> {
        if stops.len() < 2 {
            return Err(RouteOptError::invalid("stops", "a route needs at least two stops"));
        }
        if num_vehicles == 0 {
            return Err(RouteOptError::invalid("num_vehicles", "a route needs a vehicle"));
        }
        if !length.is_finite() || length < 0. {
            return Err(RouteOptError::invalid("length", format!("{} is not a valid length",
                                                                length)));
        }
        let disabled = vec![false; stops.len()];
        Ok(BusRoute { stops, disabled, num_vehicles, capacity, length })
    }

    pub fn stops(&self) -> &[usize] {
        &self.stops
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_disabled(&self, stop_idx: usize) -> bool {
        self.disabled.get(stop_idx).cloned().unwrap_or(false)
    }

    /// Flips whether passengers can board and alight at an interior stop.  The terminals
    /// can't be disabled; returns whether anything changed.
    pub fn toggle_stop(&mut self, stop_idx: usize) -> bool {
        if stop_idx == 0 || stop_idx + 1 >= self.stops.len() {
            return false;
        }
        self.disabled[stop_idx] = !self.disabled[stop_idx];
        true
    }

    /// The stops where passengers are actually served, in route order.  Disabled stops are
    /// skipped, and a stop left next to itself by that is served once.  Loops and later
    /// revisits stay, since passengers may ride to them.
    pub fn active_stops(&self) -> Vec<usize> {
        self.stops.iter().zip(&self.disabled)
            .filter(|(_, disabled)| !**disabled)
            .map(|(stop, _)| *stop)
            .dedup()
            .collect()
    }

    /// Total passengers all of the route's vehicles can hold at once.
    pub fn total_capacity(&self) -> u64 {
        self.num_vehicles as u64 * self.capacity as u64
    }
}


/// Parameters for seeding plans with random walks.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSampling {
    pub num_routes: usize,
    pub walk_length: usize,
    pub vehicles_per_route: u32,
    pub vehicle_capacity: u32,
    pub anchor: RankAnchor,
}


/// The crate's fleet plan: a list of bus routes with cached totals.
#[derive(PartialEq, Debug, Clone)]
pub struct RouteSet {
    routes: Vec<BusRoute>,
    cum_len: f64,
    num_buses: u32,
}

impl RouteSet {
    pub fn new(routes: Vec<BusRoute>) -> Result<RouteSet, RouteOptError> {
        if routes.is_empty() {
            return Err(RouteOptError::invalid("routes", "a plan needs at least one route"));
        }
        let mut route_set = RouteSet { routes, cum_len: 0., num_buses: 0 };
        route_set.refresh_stats();
        Ok(route_set)
    }

    /// Builds a plan of routes between random distinct terminals, each grown by
    /// `random_walk`.
    pub fn sample<RR>(network: &TransitNetwork, sampling: &RouteSampling, rng: &mut RR)
                      -> Result<RouteSet, RouteOptError>
                      where RR: Rng {
        if network.num_nodes() < 2 {
            return Err(RouteOptError::invalid("network", "need at least two stops to sample \
                                                          routes"));
        }
        let mut routes = vec![];
        for _ in 0..sampling.num_routes {
            let source = rng.gen_range(0..network.num_nodes());
            let mut destination = rng.gen_range(0..network.num_nodes() - 1);
            if destination >= source {
                destination += 1;
            }
            let stops = random_walk(network, source, destination, sampling.walk_length,
                                    sampling.anchor, rng)?;
            routes.push(BusRoute::new(stops, sampling.vehicles_per_route,
                                      sampling.vehicle_capacity, network)?);
        }
        RouteSet::new(routes)
    }

    fn refresh_stats(&mut self) {
        self.cum_len = self.routes.iter().map(|rr| rr.length).sum();
        self.num_buses = self.routes.iter().map(|rr| rr.num_vehicles).sum();
    }
}

impl FleetPlan for RouteSet {
    fn routes(&self) -> &[BusRoute] {
        &self.routes
    }

    fn cum_len(&self) -> f64 {
        self.cum_len
    }

    fn num_buses(&self) -> u32 {
        self.num_buses
    }

    fn mutate<RR: Rng>(&mut self, mutation_prob: f64, rng: &mut RR) {
        if rng.gen::<f64>() >= mutation_prob {
            return;
        }
        let route_idx = rng.gen_range(0..self.routes.len());
        let route = &mut self.routes[route_idx];
        let num_interior = route.stops.len() - 2;
        if num_interior > 0 && rng.gen::<bool>() {
            route.toggle_stop(rng.gen_range(1..=num_interior));
        } else if route.num_vehicles > 1 && rng.gen::<bool>() {
            route.num_vehicles -= 1;
        } else {
            route.num_vehicles += 1;
        }
        self.refresh_stats();
    }

    fn crossover<RR: Rng>(&mut self, other: &mut Self, rng: &mut RR) {
        let min_len = self.routes.len().min(other.routes.len());
        if min_len < 2 {
            return;
        }
        // one-point crossover; both plans keep their number of routes
        let cut = rng.gen_range(1..min_len);
        for ii in cut..min_len {
            std::mem::swap(&mut self.routes[ii], &mut other.routes[ii]);
        }
        self.refresh_stats();
        other.refresh_stats();
    }
}
