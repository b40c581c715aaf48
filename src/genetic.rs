use std::cmp::Ordering;

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index;
use rand::Rng;
use rayon::prelude::*;

use super::demand::{simulate_people, DemandGraph};
use super::fitness::{fitness, ObjectiveWeights};
use super::fleet_plan::FleetPlan;
use super::transit_network::TransitNetwork;
use super::RouteOptError;


#[derive(Debug, Clone, PartialEq)]
pub struct GaParams {
    /// Number of generations.
    pub iterations: usize,
    pub pop_size: usize,
    /// Number of simulated people in the shared demand snapshot.
    pub num_people: usize,
    pub weights: ObjectiveWeights,
    pub max_trips: u32,
    /// Fraction of the population copied unchanged into the next generation.
    pub elite_fraction: f64,
    pub mutation_prob: f64,
    /// Fraction of the selected plans that take part in crossover.
    pub crossover_fraction: f64,
    pub parallel_evaluation: bool,
}

impl GaParams {
    fn validate(&self) -> Result<(), RouteOptError> {
        if self.pop_size == 0 {
            return Err(RouteOptError::invalid("pop_size", "the population can't be empty"));
        }
        for (name, value) in &[("elite_fraction", self.elite_fraction),
                               ("mutation_prob", self.mutation_prob),
                               ("crossover_fraction", self.crossover_fraction)] {
            if !(0. ..=1.).contains(value) {
                return Err(RouteOptError::invalid(name, format!("{} is not in [0, 1]", value)));
            }
        }
        if self.max_trips == 0 {
            return Err(RouteOptError::invalid("max_trips", "must be at least 1"));
        }
        Ok(())
    }

    pub fn elite_count(&self) -> usize {
        (self.elite_fraction * self.pop_size as f64).floor() as usize
    }

    /// How many of `num_selected` plans are paired up for crossover: the fraction rounded up
    /// to an even number, but never more than there are plans to pair.
    pub fn crossover_count(&self, num_selected: usize) -> usize {
        let mut count = (self.crossover_fraction * num_selected as f64).ceil() as usize;
        count += count % 2;
        if count > num_selected {
            count = num_selected - num_selected % 2;
        }
        count
    }
}


#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    pub generation: usize,
    pub best: f64,
    pub average: f64,
    pub worst: f64,
}

#[derive(Debug)]
pub struct GaOutcome<PP> {
    pub best: PP,
    pub best_fitness: f64,
    /// The demand snapshot every generation was scored against.
    pub demand: DemandGraph,
    pub population: Vec<PP>,
    pub history: Vec<GenerationStats>,
}


pub struct GeneticOptimizer {
    params: GaParams,
}

impl GeneticOptimizer {
    pub fn new(params: GaParams) -> Result<GeneticOptimizer, RouteOptError> {
        params.validate()?;
        Ok(GeneticOptimizer { params })
    }

    pub fn get_params(&self) -> &GaParams {
        &self.params
    }

    /// Simulates one demand snapshot from the network's node probabilities and evolves
    /// `population` against it.
    pub fn run<PP, RR>(&self, population: Vec<PP>, network: &TransitNetwork, rng: &mut RR)
                       -> Result<GaOutcome<PP>, RouteOptError>
                       where PP: FleetPlan, RR: Rng {
        let demand = simulate_people(network, self.params.num_people, rng)?;
        self.run_with_demand(population, demand, rng)
    }

    pub fn run_with_demand<PP, RR>(&self, population: Vec<PP>, demand: DemandGraph,
                                   rng: &mut RR)
                                   -> Result<GaOutcome<PP>, RouteOptError>
                                   where PP: FleetPlan, RR: Rng {
        if population.len() != self.params.pop_size {
            return Err(RouteOptError::invalid(
                "population", format!("has {} plans, expected {}", population.len(),
                                      self.params.pop_size)));
        }

        let mut population = population;
        let mut history = vec![];
        let mut best = None;
        for generation in 0..self.params.iterations {
            log::info!("Iteration {} / {}", generation + 1, self.params.iterations);
            let fitnesses = self.evaluate_population(&population, &demand)?;
            let ranking = rank(&fitnesses);
            let stats = generation_stats(generation, &fitnesses, &ranking);
            log::info!("-- Average: {} Best: {} Worst: {}", stats.average, stats.best,
                       stats.worst);
            history.push(stats);
            best = Some((population[ranking[0]].clone(), fitnesses[ranking[0]]));

            population = self.next_generation(&population, &fitnesses, &ranking, rng)?;
        }

        let (best, best_fitness) = match best {
            Some(best) => best,
            None => {
                // no generations were run, so rank the initial population
                let fitnesses = self.evaluate_population(&population, &demand)?;
                let ranking = rank(&fitnesses);
                (population[ranking[0]].clone(), fitnesses[ranking[0]])
            }
        };

        Ok(GaOutcome { best, best_fitness, demand, population, history })
    }

    /// Scores every plan against the same demand snapshot.  The result is in population
    /// order.
    pub fn evaluate_population<PP>(&self, population: &[PP], demand: &DemandGraph)
                                   -> Result<Vec<f64>, RouteOptError>
                                   where PP: FleetPlan {
        log::debug!("evaluate fitness");
        let weights = &self.params.weights;
        let max_trips = self.params.max_trips;
        if self.params.parallel_evaluation {
            population.par_iter().map(|plan| fitness(plan, demand, weights, max_trips))
                .collect()
        } else {
            population.iter().map(|plan| fitness(plan, demand, weights, max_trips)).collect()
        }
    }

    /// Builds the next generation: fitness-proportional selection of
    /// `pop_size - elite_count` plans, crossover among a random even-sized subset of them,
    /// mutation of all of them, and finally the elites appended unchanged.
    fn next_generation<PP, RR>(&self, population: &[PP], fitnesses: &[f64], ranking: &[usize],
                               rng: &mut RR)
                               -> Result<Vec<PP>, RouteOptError>
                               where PP: FleetPlan, RR: Rng {
        let elite_count = self.params.elite_count();
        let elites: Vec<PP> = ranking.iter().take(elite_count)
            .map(|idx| population[*idx].clone())
            .collect();

        log::debug!("selection");
        let mut selected = select_proportional(population, fitnesses,
                                               self.params.pop_size - elite_count, rng)?;

        log::debug!("crossover");
        let crossover_count = self.params.crossover_count(selected.len());
        if crossover_count > 0 {
            let parents = index::sample(rng, selected.len(), crossover_count).into_vec();
            for pair in parents.chunks(2) {
                let (first, second) = pair_mut(&mut selected, pair[0], pair[1]);
                first.crossover(second, rng);
            }
        }

        log::debug!("mutation");
        for plan in selected.iter_mut() {
            plan.mutate(self.params.mutation_prob, rng);
        }

        selected.extend(elites);
        debug_assert_eq!(selected.len(), self.params.pop_size);
        Ok(selected)
    }
}


/// Indices of `fitnesses`, best first.  Equal scores keep population order.
pub fn rank(fitnesses: &[f64]) -> Vec<usize> {
    let mut ranking: Vec<usize> = (0..fitnesses.len()).collect();
    ranking.sort_by(|aa, bb| {
        fitnesses[*bb].partial_cmp(&fitnesses[*aa]).unwrap_or(Ordering::Equal)
    });
    ranking
}

/// Draws `count` clones from `population` with replacement, each with probability
/// proportional to its fitness.  All-zero fitness has no meaningful distribution and is an
/// error rather than a silent switch to uniform draws, even when `count` is zero.
pub fn select_proportional<PP, RR>(population: &[PP], fitnesses: &[f64], count: usize,
                                   rng: &mut RR)
                                   -> Result<Vec<PP>, RouteOptError>
                                   where PP: Clone, RR: Rng {
    if population.len() != fitnesses.len() {
        return Err(RouteOptError::invalid("fitnesses", "need one score per plan"));
    }
    if fitnesses.iter().any(|ff| !ff.is_finite() || *ff < 0.) {
        return Err(RouteOptError::degenerate("fitness (negative or non-finite score)"));
    }
    let total: f64 = fitnesses.iter().sum();
    if total <= 0. {
        return Err(RouteOptError::degenerate(format!("fitness (scores sum to {})", total)));
    }
    if count == 0 {
        return Ok(vec![]);
    }
    let dist = WeightedIndex::new(fitnesses).map_err(|err| {
        RouteOptError::degenerate(format!("fitness ({})", err))
    })?;

    Ok((0..count).map(|_| population[dist.sample(rng)].clone()).collect())
}

fn generation_stats(generation: usize, fitnesses: &[f64], ranking: &[usize])
                    -> GenerationStats {
    let average = fitnesses.iter().sum::<f64>() / fitnesses.len() as f64;
    GenerationStats {
        generation,
        best: fitnesses[ranking[0]],
        average,
        worst: fitnesses[ranking[ranking.len() - 1]],
    }
}

fn pair_mut<TT>(items: &mut [TT], first: usize, second: usize) -> (&mut TT, &mut TT) {
    assert_ne!(first, second);
    if first < second {
        let (head, tail) = items.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = items.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}


#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    use super::*;
    use super::super::fleet_plan::{BusRoute, RouteSet};

    /// A single-route plan whose score is easy to predict from its capacity.
    fn make_plan(capacity: u32) -> RouteSet {
        let route = BusRoute::with_length(vec![0, 1, 2], 1, capacity, 2.).unwrap();
        RouteSet::new(vec![route]).unwrap()
    }

    fn make_params(pop_size: usize) -> GaParams {
        GaParams {
            iterations: 5,
            pop_size,
            num_people: 100,
            weights: ObjectiveWeights::new(1., 0., 0.),
            max_trips: 1,
            elite_fraction: 0.2,
            mutation_prob: 0.3,
            crossover_fraction: 0.5,
            parallel_evaluation: false,
        }
    }

    #[test]
    fn test_param_validation() {
        let mut params = make_params(4);
        assert!(GeneticOptimizer::new(params.clone()).is_ok());
        params.elite_fraction = 1.5;
        assert!(GeneticOptimizer::new(params.clone()).is_err());
        params.elite_fraction = 0.2;
        params.mutation_prob = -0.1;
        assert!(GeneticOptimizer::new(params.clone()).is_err());
        params.mutation_prob = 0.1;
        params.pop_size = 0;
        assert!(GeneticOptimizer::new(params).is_err());
    }

    #[test]
    fn test_crossover_count() {
        let mut params = make_params(10);
        params.crossover_fraction = 0.5;
        assert_eq!(params.crossover_count(8), 4);
        assert_eq!(params.crossover_count(7), 4);
        assert_eq!(params.crossover_count(5), 4);
        params.crossover_fraction = 1.;
        assert_eq!(params.crossover_count(7), 6);
        assert_eq!(params.crossover_count(1), 0);
        params.crossover_fraction = 0.;
        assert_eq!(params.crossover_count(7), 0);
    }

    #[test]
    fn test_elite_count() {
        let mut params = make_params(10);
        params.elite_fraction = 0.25;
        assert_eq!(params.elite_count(), 2);
        params.elite_fraction = 1.;
        assert_eq!(params.elite_count(), 10);
    }

    #[test]
    fn test_rank() {
        assert_eq!(rank(&[1., 5., 3., 5.]), vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_select_proportional() {
        let mut rng = Isaac64Rng::seed_from_u64(0);
        let population = vec!["a", "b", "c"];
        let selected = select_proportional(&population, &[0., 2., 0.], 20, &mut rng).unwrap();
        assert_eq!(selected, vec!["b"; 20]);

        let selected = select_proportional(&population, &[1., 1., 1.], 7, &mut rng).unwrap();
        assert_eq!(selected.len(), 7);
    }

    #[test]
    fn test_select_rejects_zero_fitness() {
        let mut rng = Isaac64Rng::seed_from_u64(0);
        let population = vec![1, 2, 3];
        match select_proportional(&population, &[0., 0., 0.], 3, &mut rng) {
            Err(RouteOptError::DegenerateDistribution { .. }) => (),
            other => panic!("expected a degenerate distribution, got {:?}", other),
        }
        assert!(select_proportional(&population, &[1., -1., 3.], 3, &mut rng).is_err());
        assert!(select_proportional(&population, &[1., f64::NAN, 3.], 3, &mut rng).is_err());
    }

    #[test]
    fn test_population_size_is_preserved() {
        let demand = DemandGraph::from_edges(&[(0, 1, 30), (1, 2, 30)]);
        for (pop_size, elite_fraction) in &[(10, 0.2), (7, 0.), (5, 1.), (9, 0.35)] {
            let mut params = make_params(*pop_size);
            params.elite_fraction = *elite_fraction;
            let optimizer = GeneticOptimizer::new(params.clone()).unwrap();
            let population: Vec<_> = (0..*pop_size).map(|ii| make_plan(5 + ii as u32)).collect();
            let mut rng = Isaac64Rng::seed_from_u64(*pop_size as u64);

            let fitnesses = optimizer.evaluate_population(&population, &demand).unwrap();
            let ranking = rank(&fitnesses);
            let next = optimizer.next_generation(&population, &fitnesses, &ranking, &mut rng)
                .unwrap();
            assert_eq!(next.len(), *pop_size);
            let elite_count = params.elite_count();
            // the elites sit at the end, unchanged and in rank order
            for (ii, plan) in next[*pop_size - elite_count..].iter().enumerate() {
                assert_eq!(*plan, population[ranking[ii]]);
            }

            let outcome = optimizer.run_with_demand(population, demand.clone(), &mut rng)
                .unwrap();
            assert_eq!(outcome.population.len(), *pop_size);
            assert_eq!(outcome.history.len(), params.iterations);
        }
    }

    #[test]
    fn test_wrong_population_size() {
        let optimizer = GeneticOptimizer::new(make_params(4)).unwrap();
        let population = vec![make_plan(5); 3];
        let mut rng = Isaac64Rng::seed_from_u64(0);
        assert!(optimizer.run_with_demand(population, DemandGraph::new(), &mut rng).is_err());
    }

    #[test]
    fn test_all_unviable_is_fatal() {
        // nobody wants to travel, so every plan scores zero
        let optimizer = GeneticOptimizer::new(make_params(4)).unwrap();
        let population = vec![make_plan(5); 4];
        let mut rng = Isaac64Rng::seed_from_u64(0);
        match optimizer.run_with_demand(population, DemandGraph::new(), &mut rng) {
            Err(RouteOptError::DegenerateDistribution { .. }) => (),
            other => panic!("expected a degenerate distribution, got {:?}", other),
        }
    }

    #[test]
    fn test_all_unviable_is_fatal_without_selection() {
        let mut params = make_params(4);
        params.elite_fraction = 1.;
        let optimizer = GeneticOptimizer::new(params).unwrap();
        let population = vec![make_plan(5); 4];
        let mut rng = Isaac64Rng::seed_from_u64(0);
        match optimizer.run_with_demand(population, DemandGraph::new(), &mut rng) {
            Err(RouteOptError::DegenerateDistribution { .. }) => (),
            other => panic!("expected a degenerate distribution, got {:?}", other),
        }
        assert!(select_proportional(&[1, 2], &[0., 0.], 0, &mut rng).is_err());
        assert_eq!(select_proportional(&[1, 2], &[0., 3.], 0, &mut rng).unwrap(), vec![]);
    }

    #[test]
    fn test_best_is_top_of_last_ranking() {
        let demand = DemandGraph::from_edges(&[(0, 1, 50), (0, 2, 50), (1, 2, 50)]);
        let mut params = make_params(6);
        params.mutation_prob = 0.;
        params.crossover_fraction = 0.;
        params.elite_fraction = 0.5;
        let optimizer = GeneticOptimizer::new(params).unwrap();
        let population: Vec<_> = (1..7).map(|ii| make_plan(ii * 10)).collect();
        let mut rng = Isaac64Rng::seed_from_u64(2);
        let outcome = optimizer.run_with_demand(population, demand.clone(), &mut rng).unwrap();

        let best_score = fitness(&outcome.best, &demand, &ObjectiveWeights::new(1., 0., 0.), 1)
            .unwrap();
        assert_eq!(best_score, outcome.best_fitness);
        let last = outcome.history.last().unwrap();
        assert_eq!(last.best, outcome.best_fitness);
        // elitism keeps the best capacity around, and nothing mutates it
        assert_eq!(outcome.best, make_plan(60));
        // scores never get worse from one generation to the next
        for pair in outcome.history.windows(2) {
            assert!(pair[1].best >= pair[0].best);
        }
    }

    #[test]
    fn test_zero_iterations() {
        let demand = DemandGraph::from_edges(&[(0, 1, 50)]);
        let mut params = make_params(3);
        params.iterations = 0;
        let optimizer = GeneticOptimizer::new(params).unwrap();
        let population = vec![make_plan(10), make_plan(40), make_plan(20)];
        let mut rng = Isaac64Rng::seed_from_u64(2);
        let outcome = optimizer.run_with_demand(population.clone(), demand, &mut rng).unwrap();
        assert_eq!(outcome.best, make_plan(40));
        assert_eq!(outcome.best_fitness, 40.);
        assert_eq!(outcome.population, population);
        assert!(outcome.history.is_empty());
    }

    #[test]
    fn test_parallel_matches_serial() {
        let demand = DemandGraph::from_edges(&[(0, 1, 15), (1, 2, 25), (0, 2, 5)]);
        let mut params = make_params(8);
        let population: Vec<_> = (0..8).map(|ii| make_plan(3 * ii + 1)).collect();
        let serial = GeneticOptimizer::new(params.clone()).unwrap()
            .evaluate_population(&population, &demand).unwrap();
        params.parallel_evaluation = true;
        let parallel = GeneticOptimizer::new(params).unwrap()
            .evaluate_population(&population, &demand).unwrap();
        assert_eq!(serial, parallel);
    }
}
