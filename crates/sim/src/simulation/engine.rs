//! Simulation engine for directed evolution.
//!
//! Each generation runs three steps over the live population:
//!
//! 1. **Evaluating**: score any individual without a cached fitness.
//! 2. **Reproducing**: draw parent pairs, produce exactly
//!    `offspring_per_generation` unique children and attach them. In a flat
//!    population children join the generation; in a tree population a child
//!    is attached under its fitter parent only if it beats that parent.
//! 3. **Selecting**: trim the population to `max_population_size` with the
//!    configured survivor selection. In a tree, kept descendants of a removed
//!    node move up to its nearest kept ancestor.
//!
//! The generations themselves run strictly one after another. Within the
//! Reproducing step this engine goes beyond a purely single-threaded loop:
//! children are produced in parallel batches on the rayon pool, each with
//! its own generator seeded from the one master `Xoshiro256PlusPlus`, and
//! accepted in batch order. A run is therefore reproducible for a fixed seed
//! regardless of the thread count, and a one-thread pool (`--threads 1` in
//! the CLI) gives the fully sequential behaviour.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use log::{debug, info};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::base::{Alphabet, Sequence};
use crate::errors::{RecombinationError, SimulationError};
use crate::evolution::{
    ConservationModel, EvolutionContext, FitnessFunction, ReproductionModel, fitness_proportionate,
};
use crate::genome::{CodonTable, Individual, NodePath, lineage};
use crate::simulation::{Configuration, Population, Topology};
use crate::storage::PopulationSnapshot;

/// Lifecycle of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Initialized,
    Evaluating,
    Reproducing,
    Selecting,
    Terminated,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initialized => "initialized",
            Self::Evaluating => "evaluating",
            Self::Reproducing => "reproducing",
            Self::Selecting => "selecting",
            Self::Terminated => "terminated",
        };
        f.write_str(name)
    }
}

/// A planned reproduction: the anchor parent donates the origin tag and is
/// where a tree child would attach.
struct Mating<'p> {
    anchor: &'p Individual,
    mate: &'p Individual,
    anchor_path: NodePath,
    seed: u64,
}

/// Main simulation engine.
#[derive(Debug)]
pub struct Simulation {
    /// Current population
    population: Population,
    /// Conservation model built from the reference set
    model: ConservationModel,
    /// Reference sequences of the model's length
    reference: Vec<Sequence>,
    alphabet: Alphabet,
    fitness: Arc<dyn FitnessFunction>,
    codons: Option<Arc<dyn CodonTable>>,
    config: Configuration,
    reproduction: ReproductionModel,
    /// Random number generator (using Xoshiro256++ for better performance)
    rng: Xoshiro256PlusPlus,
    state: EngineState,
}

impl Simulation {
    /// Assemble an engine around an initialised population.
    /// Use [`SimulationBuilder`](crate::simulation::SimulationBuilder) for
    /// validation and defaults.
    pub(crate) fn new(
        population: Population,
        model: ConservationModel,
        reference: Vec<Sequence>,
        alphabet: Alphabet,
        fitness: Arc<dyn FitnessFunction>,
        codons: Option<Arc<dyn CodonTable>>,
        config: Configuration,
    ) -> Self {
        let rng = match config.execution.seed {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_seed(rand::rng().random()),
        };
        let reproduction =
            ReproductionModel::new(config.evolution.crossover, config.evolution.mutation.clone());
        info!(
            "Simulation initialized: {} individuals, model length {}, {} reference sequences",
            population.size(),
            model.len(),
            reference.len()
        );
        Self {
            population,
            model,
            reference,
            alphabet,
            fitness,
            codons,
            config,
            reproduction,
            rng,
            state: EngineState::Initialized,
        }
    }

    /// Get the current population.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Get the current generation number.
    pub fn generation(&self) -> usize {
        self.population.generation()
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn model(&self) -> &ConservationModel {
        &self.model
    }

    /// Reference sequences retained by the conservation model.
    pub fn reference(&self) -> &[Sequence] {
        &self.reference
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    /// Get reference to simulation configuration.
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// Fittest live individual.
    pub fn best(&self) -> Option<&Individual> {
        self.population.best()
    }

    /// Serializable view of the current population.
    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot::capture(&self.population)
    }

    fn enter(&mut self, state: EngineState) {
        debug!("Generation {}: {state}", self.generation() + 1);
        self.state = state;
    }

    /// Advance simulation by one generation.
    pub fn step(&mut self) -> Result<(), SimulationError> {
        let generation = self.generation() + 1;

        self.enter(EngineState::Evaluating);
        self.population
            .evaluate_missing(self.fitness.as_ref(), &self.model)
            .map_err(|e| SimulationError::at(generation, EngineState::Evaluating, e))?;

        self.enter(EngineState::Reproducing);
        let children = self.produce_children(generation)?;
        let produced = children.len();
        let mut attached = 0;
        for (anchor_path, child) in children {
            match self.population.topology() {
                Topology::Flat => {
                    self.population.push(child);
                    attached += 1;
                }
                Topology::Tree => {
                    let improves = self
                        .population
                        .get(&anchor_path)
                        .is_some_and(|anchor| child.fitness() > anchor.fitness());
                    if improves && self.population.attach(&anchor_path, child) {
                        attached += 1;
                    }
                }
            }
        }
        debug!("Generation {generation}: attached {attached} of {produced} children");

        self.enter(EngineState::Selecting);
        let max_size = self.config.execution.max_population_size;
        let keep: HashSet<NodePath> = {
            let members = self.population.flatten_with_paths();
            let individuals: Vec<&Individual> = members.iter().map(|(_, ind)| *ind).collect();
            let survivors = self
                .config
                .evolution
                .survivor_selection
                .select(&individuals, max_size, &mut self.rng)
                .map_err(|e| SimulationError::at(generation, EngineState::Selecting, e))?;
            survivors
                .into_iter()
                .map(|i| members[i].0.clone())
                .collect()
        };
        self.population.retain(&keep);
        self.population.increment_generation();

        info!(
            "Generation {generation}: {} individuals, best fitness {:.4}, mean fitness {:.4}",
            self.population.size(),
            self.best().map_or(0.0, |ind| ind.fitness().get()),
            self.population.mean_fitness()
        );
        Ok(())
    }

    /// Produce exactly `offspring_per_generation` children whose sequences
    /// are new to the population, each paired with its anchor's path.
    fn produce_children(
        &mut self,
        generation: usize,
    ) -> Result<Vec<(NodePath, Individual)>, SimulationError> {
        let exec = &self.config.execution;
        let required = exec.offspring_per_generation;
        let max_attempts = exec.max_child_attempts;
        let topology = self.population.topology();

        let members = self.population.flatten_with_paths();
        let mut seen: HashSet<Sequence> = members
            .iter()
            .map(|(_, ind)| ind.sequence().clone())
            .collect();

        let pool = match topology {
            Topology::Flat => {
                let pool_size = exec.parent_pool_size.unwrap_or(members.len());
                fitness_proportionate(&members_only(&members), pool_size, &mut self.rng)
                    .map_err(|e| SimulationError::at(generation, EngineState::Reproducing, e))?
            }
            Topology::Tree => Vec::new(),
        };

        let ctx = EvolutionContext {
            model: &self.model,
            reference: &self.reference,
            alphabet: &self.alphabet,
            fitness: self.fitness.as_ref(),
            codons: self.codons.as_deref(),
        };

        let mut accepted: Vec<(NodePath, Individual)> = Vec::with_capacity(required);
        let mut duplicates = 0usize;
        while accepted.len() < required {
            let need = required - accepted.len();
            let matings = match topology {
                Topology::Flat => plan_flat(&members, &pool, need, &mut self.rng),
                Topology::Tree => plan_tree(self.population.forest(), need, &mut self.rng),
            };

            let results: Vec<Result<Individual, RecombinationError>> = matings
                .par_iter()
                .map(|mating| {
                    let mut local_rng = Xoshiro256PlusPlus::seed_from_u64(mating.seed);
                    self.reproduction
                        .reproduce(mating.anchor, mating.mate, "", &ctx, &mut local_rng)
                })
                .collect();

            for (mating, result) in matings.iter().zip(results) {
                if accepted.len() == required {
                    break;
                }
                let child = result
                    .map_err(|e| SimulationError::at(generation, EngineState::Reproducing, e))?;
                if !seen.insert(child.sequence().clone()) {
                    duplicates += 1;
                    debug!(
                        "Generation {generation}: rejected duplicate child of {} ({duplicates} in a row)",
                        mating.anchor.name()
                    );
                    if duplicates >= max_attempts {
                        return Err(SimulationError::ChildGenerationStalled {
                            generation,
                            produced: accepted.len(),
                            required,
                            attempts: duplicates,
                        });
                    }
                    continue;
                }
                duplicates = 0;
                let name = format!("ind_gen{generation}_{}", accepted.len());
                accepted.push((mating.anchor_path.clone(), child.renamed(name)));
            }
        }
        Ok(accepted)
    }

    /// Run simulation for the configured number of generations.
    pub fn run(&mut self) -> Result<(), SimulationError> {
        self.run_with(|_| Ok(()))
    }

    /// Run the configured number of generations, calling `on_generation`
    /// after each one (for example to record a snapshot).
    pub fn run_with<F>(&mut self, mut on_generation: F) -> Result<(), SimulationError>
    where
        F: FnMut(&Simulation) -> Result<(), SimulationError>,
    {
        for _ in 0..self.config.execution.generations {
            self.step()?;
            on_generation(self)?;
        }
        self.state = EngineState::Terminated;
        info!("Simulation terminated after generation {}", self.generation());
        Ok(())
    }

    /// Run simulation for a specific number of generations.
    pub fn run_for(&mut self, generations: usize) -> Result<(), SimulationError> {
        for _ in 0..generations {
            self.step()?;
        }
        Ok(())
    }
}

fn members_only<'p>(members: &[(NodePath, &'p Individual)]) -> Vec<&'p Individual> {
    members.iter().map(|(_, ind)| *ind).collect()
}

/// Pair parents from the fitness-proportionate pool. The mate is another
/// individual from the pool whenever the pool holds more than one.
fn plan_flat<'p, R: Rng + ?Sized>(
    members: &[(NodePath, &'p Individual)],
    pool: &[usize],
    count: usize,
    rng: &mut R,
) -> Vec<Mating<'p>> {
    (0..count)
        .filter_map(|_| {
            let &a = pool.choose(rng)?;
            let others: Vec<usize> = pool.iter().copied().filter(|&i| i != a).collect();
            let b = others.choose(rng).copied().unwrap_or(a);
            Some(Mating {
                anchor: members[a].1,
                mate: members[b].1,
                anchor_path: members[a].0.clone(),
                seed: rng.random(),
            })
        })
        .collect()
}

/// A node drawn uniformly from a uniformly chosen tree.
fn random_node<'p, R: Rng + ?Sized>(
    forest: &'p [Individual],
    rng: &mut R,
) -> Option<(NodePath, &'p Individual)> {
    if forest.is_empty() {
        return None;
    }
    let root = rng.random_range(0..forest.len());
    let steps = lineage::select_random_node(&forest[root], rng);
    let path = NodePath::from_parts(root, &steps);
    lineage::node(forest, &path).map(|ind| (path, ind))
}

/// Pair two distinct tree nodes; the fitter one anchors the child.
fn plan_tree<'p, R: Rng + ?Sized>(
    forest: &'p [Individual],
    count: usize,
    rng: &mut R,
) -> Vec<Mating<'p>> {
    let total: usize = forest.iter().map(Individual::subtree_size).sum();
    (0..count)
        .filter_map(|_| {
            let (path_a, a) = random_node(forest, rng)?;
            let (mut path_b, mut b) = random_node(forest, rng)?;
            if path_b == path_a && total > 1 {
                let others: Vec<(NodePath, &Individual)> = lineage::flatten_with_paths(forest)
                    .into_iter()
                    .filter(|(path, _)| *path != path_a)
                    .collect();
                if let Some((path, ind)) = others.choose(rng) {
                    path_b = path.clone();
                    b = *ind;
                }
            }
            let (anchor, anchor_path, mate) = if b.fitness() > a.fitness() {
                (b, path_b, a)
            } else {
                (a, path_a, b)
            };
            Some(Mating {
                anchor,
                mate,
                anchor_path,
                seed: rng.random(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::AlphabetKind;
    use crate::errors::{SelectionError, StepError};
    use crate::evolution::SurvivorSelection;
    use crate::simulation::SimulationBuilder;

    fn ac() -> Alphabet {
        Alphabet::new("AC").unwrap()
    }

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text, &ac()).unwrap()
    }

    fn reference() -> Vec<Sequence> {
        vec![
            seq("AAAAACCCCC"),
            seq("AAAAACCCCC"),
            seq("AAAAACCCCA"),
            seq("AAAACCCCCC"),
        ]
    }

    /// Helper function to create a test simulation with standard configuration.
    fn create_test_simulation(topology: Topology) -> Simulation {
        SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "AC".into(),
            })
            .reference(reference())
            .seeds(vec![
                Individual::new("s0", seq("CCCCCAAAAA")),
                Individual::new("s1", seq("ACACACACAC")),
                Individual::new("s2", seq("CACACACACA")),
            ])
            .generations(5)
            .max_population_size(6)
            .offspring_per_generation(4)
            .topology(topology)
            .seed(42)
            .build()
            .unwrap()
    }

    #[test]
    fn test_simulation_new() {
        let sim = create_test_simulation(Topology::Flat);
        assert_eq!(sim.population().size(), 3);
        assert_eq!(sim.generation(), 0);
        assert_eq!(sim.state(), EngineState::Initialized);
    }

    #[test]
    fn test_simulation_step_flat() {
        let mut sim = create_test_simulation(Topology::Flat);
        sim.step().unwrap();
        assert_eq!(sim.generation(), 1);
        // 3 seeds + 4 children, trimmed to 6
        assert_eq!(sim.population().size(), 6);
        assert_eq!(sim.state(), EngineState::Selecting);

        let members = sim.population().flatten();
        let unique: HashSet<&Sequence> = members.iter().map(|ind| ind.sequence()).collect();
        assert_eq!(unique.len(), members.len());
        assert!(members.iter().any(|ind| ind.name().starts_with("ind_gen1_")));
    }

    #[test]
    fn test_simulation_run() {
        let mut sim = create_test_simulation(Topology::Flat);
        let initial_best = sim.best().unwrap().fitness();
        let mut seen_generations = Vec::new();
        sim.run_with(|s| {
            seen_generations.push(s.generation());
            Ok(())
        })
        .unwrap();
        assert_eq!(sim.generation(), 5);
        assert_eq!(seen_generations, vec![1, 2, 3, 4, 5]);
        assert_eq!(sim.state(), EngineState::Terminated);
        // truncation keeps the best individual
        assert!(sim.best().unwrap().fitness() >= initial_best);
    }

    #[test]
    fn test_simulation_run_for() {
        let mut sim = create_test_simulation(Topology::Flat);
        sim.run_for(3).unwrap();
        assert_eq!(sim.generation(), 3);
        assert!(sim.population().size() <= 6);
    }

    #[test]
    fn test_tree_children_improve_on_their_parent() {
        let mut sim = create_test_simulation(Topology::Tree);
        sim.run_for(5).unwrap();

        fn check(node: &Individual) {
            for child in node.descendants() {
                assert!(child.fitness() > node.fitness());
                check(child);
            }
        }
        for root in sim.population().forest() {
            check(root);
        }
        let members = sim.population().flatten();
        let unique: HashSet<&Sequence> = members.iter().map(|ind| ind.sequence()).collect();
        assert_eq!(unique.len(), members.len());
    }

    #[test]
    fn test_tree_population_stays_within_max_size() {
        let mut sim = SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "AC".into(),
            })
            .reference(reference())
            .seeds(vec![
                Individual::new("s0", seq("CCCCCAAAAA")),
                Individual::new("s1", seq("ACACACACAC")),
            ])
            .topology(Topology::Tree)
            .crossover(crate::evolution::CrossoverPolicy::None)
            .max_population_size(2)
            .offspring_per_generation(4)
            .seed(42)
            .build()
            .unwrap();
        for _ in 0..20 {
            sim.step().unwrap();
            assert!(sim.population().size() <= 2);
        }
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = create_test_simulation(Topology::Flat);
        let mut b = create_test_simulation(Topology::Flat);
        a.run().unwrap();
        b.run().unwrap();
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_thread_count_does_not_change_run() {
        let run_on = |threads: usize| {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .unwrap();
            pool.install(|| {
                let mut sim = create_test_simulation(Topology::Flat);
                sim.run().unwrap();
                sim.snapshot()
            })
        };
        assert_eq!(run_on(1), run_on(4));
    }

    #[test]
    fn test_tournament_survivors() {
        let mut sim = SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "AC".into(),
            })
            .reference(reference())
            .max_population_size(3)
            .offspring_per_generation(3)
            .survivor_selection(SurvivorSelection::Tournament { k: 2 })
            .seed(7)
            .build()
            .unwrap();
        let best_before = sim.best().unwrap().fitness();
        sim.run_for(2).unwrap();
        assert_eq!(sim.population().size(), 3);
        assert!(sim.best().unwrap().fitness() >= best_before);
    }

    #[test]
    fn test_degenerate_pool_reports_generation_and_step() {
        // every seed misses every plurality symbol
        let mut sim = SimulationBuilder::new()
            .alphabet(AlphabetKind::Custom {
                symbols: "AC".into(),
            })
            .reference(vec![seq("AA"), seq("AA")])
            .seeds(vec![Individual::new("x", seq("CC"))])
            .offspring_per_generation(1)
            .seed(1)
            .build()
            .unwrap();
        let err = sim.step().unwrap_err();
        match err {
            SimulationError::Generation {
                generation,
                step,
                source,
            } => {
                assert_eq!(generation, 1);
                assert_eq!(step, EngineState::Reproducing);
                assert_eq!(
                    source,
                    StepError::Selection(SelectionError::DegenerateFitness { population: 1 })
                );
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_engine_state_display() {
        assert_eq!(EngineState::Reproducing.to_string(), "reproducing");
        assert_eq!(EngineState::Terminated.to_string(), "terminated");
    }
}
