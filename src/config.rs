use std::collections::HashMap;
use std::path::{Path, PathBuf};

use yaml_rust::{Yaml, YamlLoader};

use super::config_utils;
use super::fitness::ObjectiveWeights;
use super::fleet_plan::RouteSampling;
use super::genetic::GaParams;
use super::random_walk::RankAnchor;
use super::RouteOptError;


static DEFAULT_SEED: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct GaConfig {
    pub iterations: usize,
    pub population_size: usize,
    pub num_people: usize,
    pub elite_fraction: f64,
    pub mutation_prob: f64,
    pub crossover_fraction: f64,
    pub max_trips: u32,
    /// A bus count to compare results against.  It is reported, not optimized.
    pub reference_buses: u32,
    pub mode: String,
    pub parallel_evaluation: bool,
}

impl GaConfig {
    fn from_yaml(yaml_cfg: &Yaml) -> Result<GaConfig, RouteOptError> {
        Ok(GaConfig {
            iterations: config_utils::get_usize(yaml_cfg, "iterations")?,
            population_size: config_utils::get_usize(yaml_cfg, "population_size")?,
            num_people: config_utils::get_usize(yaml_cfg, "num_people")?,
            elite_fraction: config_utils::get_f64(yaml_cfg, "elite_fraction")?,
            mutation_prob: config_utils::get_f64(yaml_cfg, "mutation_prob")?,
            crossover_fraction: config_utils::get_f64(yaml_cfg, "crossover_fraction")?,
            max_trips: config_utils::get_u32(yaml_cfg, "max_trips")?,
            reference_buses: match yaml_cfg["reference_buses"].is_badvalue() {
                true => 0,
                false => config_utils::get_u32(yaml_cfg, "reference_buses")?,
            },
            mode: String::from(config_utils::get_str(yaml_cfg, "mode")?),
            parallel_evaluation: config_utils::get_bool_or(yaml_cfg, "parallel_evaluation",
                                                           true)?,
        })
    }
}


/// Everything needed for one optimization run, read from a yaml file.
#[derive(Debug, Clone, PartialEq)]
pub struct OptimizerConfig {
    pub num_nodes: usize,
    pub distance_matrix_path: PathBuf,
    pub node_probs_path: Option<PathBuf>,
    pub seed: u64,
    pub ga: GaConfig,
    /// Objective weights by mode name.
    pub modes: HashMap<String, ObjectiveWeights>,
    pub routes: RouteSampling,
}

impl OptimizerConfig {
    pub fn from_file(config_path: &str) -> Result<OptimizerConfig, RouteOptError> {
        let file_contents = std::fs::read_to_string(config_path).map_err(|err| {
            RouteOptError::config(config_path, format!("failed to read config file: {}", err))
        })?;
        let config_dir = Path::new(config_path).parent().unwrap_or(Path::new("."));
        OptimizerConfig::from_yaml_str(&file_contents, config_dir)
    }

    /// Parses a yaml config; relative paths are taken relative to `config_dir`.
    pub fn from_yaml_str(yaml_str: &str, config_dir: &Path) -> Result<OptimizerConfig, RouteOptError> {
        let yaml_cfgs = YamlLoader::load_from_str(yaml_str).map_err(|err| {
            RouteOptError::config("<root>", format!("failed to parse as yaml: {}", err))
        })?;
        let yaml_cfg = yaml_cfgs.get(0)
            .ok_or_else(|| RouteOptError::config("<root>", "the config is empty"))?;

        let distance_matrix_path = config_utils::get_str(yaml_cfg, "distance_matrix_path")?;
        let distance_matrix_path = config_utils::str_to_absolute_path(distance_matrix_path,
                                                                      config_dir);
        let node_probs_path = match yaml_cfg["node_probs_path"].is_badvalue() {
            true => None,
            false => {
                let path = config_utils::get_str(yaml_cfg, "node_probs_path")?;
                Some(config_utils::str_to_absolute_path(path, config_dir))
            }
        };
        let seed = match yaml_cfg["seed"].is_badvalue() {
            true => DEFAULT_SEED,
            false => config_utils::get_usize(yaml_cfg, "seed")? as u64,
        };

        let ga = GaConfig::from_yaml(config_utils::get_section(yaml_cfg, "ga")?)?;
        let modes = parse_modes(&yaml_cfg["modes"])?;
        if !modes.contains_key(&ga.mode) {
            return Err(RouteOptError::config("ga.mode", format!("no weights for mode '{}'",
                                                                ga.mode)));
        }
        let routes = parse_route_sampling(config_utils::get_section(yaml_cfg, "routes")?)?;

        Ok(OptimizerConfig {
            num_nodes: config_utils::get_usize(yaml_cfg, "num_nodes")?,
            distance_matrix_path,
            node_probs_path,
            seed,
            ga,
            modes,
            routes,
        })
    }

    pub fn objective_weights(&self) -> Result<ObjectiveWeights, RouteOptError> {
        self.modes.get(&self.ga.mode).cloned().ok_or_else(|| {
            RouteOptError::config("ga.mode", format!("no weights for mode '{}'", self.ga.mode))
        })
    }

    pub fn ga_params(&self) -> Result<GaParams, RouteOptError> {
        Ok(GaParams {
            iterations: self.ga.iterations,
            pop_size: self.ga.population_size,
            num_people: self.ga.num_people,
            weights: self.objective_weights()?,
            max_trips: self.ga.max_trips,
            elite_fraction: self.ga.elite_fraction,
            mutation_prob: self.ga.mutation_prob,
            crossover_fraction: self.ga.crossover_fraction,
            parallel_evaluation: self.ga.parallel_evaluation,
        })
    }
}


fn parse_modes(yaml_modes: &Yaml) -> Result<HashMap<String, ObjectiveWeights>, RouteOptError> {
    let hash = yaml_modes.as_hash().ok_or_else(|| RouteOptError::config(
        "modes", "expected a map from mode name to [c1, c2, c3]"))?;
    let mut modes = HashMap::new();
    for (name, consts) in hash {
        let name = name.as_str()
            .ok_or_else(|| RouteOptError::config("modes", "mode names must be strings"))?;
        let key = format!("modes.{}", name);
        let consts = match consts.as_vec() {
            Some(consts) if consts.len() == 3 => consts,
            _ => return Err(RouteOptError::config(&key, "expected exactly three weights")),
        };
        let mut values = [0.; 3];
        for (value, yaml_value) in values.iter_mut().zip(consts) {
            *value = match yaml_value {
                Yaml::Integer(ii) => *ii as f64,
                Yaml::Real(_) => yaml_value.as_f64()
                    .ok_or_else(|| RouteOptError::config(&key, "weights must be numbers"))?,
                _ => return Err(RouteOptError::config(&key, "weights must be numbers")),
            };
        }
        modes.insert(String::from(name), ObjectiveWeights::new(values[0], values[1],
                                                               values[2]));
    }
    Ok(modes)
}

fn parse_route_sampling(yaml_cfg: &Yaml) -> Result<RouteSampling, RouteOptError> {
    let anchor = match &yaml_cfg["rank_anchor"] {
        Yaml::BadValue => RankAnchor::Frontier,
        Yaml::String(ss) if ss == "frontier" => RankAnchor::Frontier,
        Yaml::Integer(node) if *node >= 0 => RankAnchor::Fixed(*node as usize),
        _ => return Err(RouteOptError::config("routes.rank_anchor",
                                              "expected 'frontier' or a node id")),
    };
    Ok(RouteSampling {
        num_routes: config_utils::get_usize(yaml_cfg, "num_routes")?,
        walk_length: config_utils::get_usize(yaml_cfg, "walk_length")?,
        vehicles_per_route: config_utils::get_u32(yaml_cfg, "vehicles_per_route")?,
        vehicle_capacity: config_utils::get_u32(yaml_cfg, "vehicle_capacity")?,
        anchor,
    })
}
