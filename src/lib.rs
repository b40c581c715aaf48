// imports of other modules from this crate
mod error;
pub use error::RouteOptError;

mod config_utils;

mod config;
pub use config::{GaConfig, OptimizerConfig};

mod table_io;
pub use table_io::{read_node_probs, read_numeric_table};

mod geometry;
pub use geometry::{distance_matrix_km, GeoPoint, EARTH_RADIUS_KM};

mod transit_network;
pub use transit_network::{NodeProbs, StopNode, TransitNetwork};

mod demand;
pub use demand::{simulate_people, DemandGraph};

mod random_walk;
pub use random_walk::{random_walk, RankAnchor, MAX_STALLED_DRAWS};

mod fleet_plan;
pub use fleet_plan::{BusRoute, FleetPlan, RouteSampling, RouteSet};

mod fitness;
pub use fitness::{fitness, fitness_components, FitnessComponents, ObjectiveWeights};

mod genetic;
pub use genetic::{rank, select_proportional, GaOutcome, GaParams, GenerationStats,
                  GeneticOptimizer};
