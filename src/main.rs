use std::error::Error;

use bus_route_ga::{fitness_components, FleetPlan, GeneticOptimizer, OptimizerConfig, RouteSet,
                   TransitNetwork};
use rand::SeedableRng;
use rand_isaac::Isaac64Rng;


fn run(config_path: &str) -> Result<(), Box<dyn Error>> {
    let cfg = OptimizerConfig::from_file(config_path)?;

    let mut network = TransitNetwork::from_csv(cfg.num_nodes, &cfg.distance_matrix_path)?;
    match &cfg.node_probs_path {
        Some(probs_path) => network = network.with_node_probs_csv(probs_path)?,
        None => log::warn!("no node_probs_path given, demand can't be simulated"),
    }
    log::info!("Loaded a network with {} stops and {} edges", network.num_nodes(),
               network.num_edges());

    let mut rng = Isaac64Rng::seed_from_u64(cfg.seed);
    let population = (0..cfg.ga.population_size)
        .map(|_| RouteSet::sample(&network, &cfg.routes, &mut rng))
        .collect::<Result<Vec<_>, _>>()?;

    let params = cfg.ga_params()?;
    let max_trips = params.max_trips;
    let optimizer = GeneticOptimizer::new(params)?;
    let outcome = optimizer.run(population, &network, &mut rng)?;

    let components = fitness_components(&outcome.best, &outcome.demand, max_trips)?;
    println!("best fitness: {}", outcome.best_fitness);
    println!("served {} of {} simulated passengers", components.num_ppl,
             outcome.demand.total_weight());
    println!("bus cycles: {} (reference: {})", components.num_buses_per_route,
             cfg.ga.reference_buses);
    println!("vehicles: {}, average route length: {}", outcome.best.num_buses(),
             components.avg_route_len);
    for (ii, route) in outcome.best.routes().iter().enumerate() {
        println!("route {}: {:?} x{}", ii, route.active_stops(), route.num_vehicles);
    }
    Ok(())
}

fn main () {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: {} <config.yaml>", args[0]);
        std::process::exit(2);
    }
    if let Err(err) = run(&args[1]) {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
