//! Population management and operations.
//!
//! A population is either a flat list of live individuals or a forest of
//! lineage trees. Both are stored as a slice of root individuals (a flat
//! population is a forest of leaves), so the flattened view, node paths and
//! survivor pruning work the same way for either topology.

use std::collections::HashSet;

use crate::base::{FitnessValue, Sequence};
use crate::errors::FitnessError;
use crate::evolution::{ConservationModel, FitnessFunction, evaluate_batch};
use crate::genome::{Individual, NodePath, lineage};
use crate::simulation::Topology;

/// Live individuals, in one of the two lineage representations.
#[derive(Debug, Clone)]
pub enum Lineage {
    /// Members of the current generation, in insertion order.
    Flat { individuals: Vec<Individual> },
    /// Root individuals that exclusively own their descendants.
    Tree { roots: Vec<Individual> },
}

/// The evolving set of individuals plus the generation counter.
#[derive(Debug, Clone)]
pub struct Population {
    lineage: Lineage,
    generation: usize,
}

/// Remove individuals whose sequence was already seen, keeping the first
/// occurrence. Returns the survivors and how many were dropped.
pub fn deduplicate(individuals: Vec<Individual>) -> (Vec<Individual>, usize) {
    let total = individuals.len();
    let mut seen: HashSet<Sequence> = HashSet::with_capacity(total);
    let unique: Vec<Individual> = individuals
        .into_iter()
        .filter(|ind| seen.insert(ind.sequence().clone()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}

impl Population {
    /// Wrap already scored individuals without further checks.
    pub fn new(topology: Topology, individuals: Vec<Individual>) -> Self {
        let lineage = match topology {
            Topology::Flat => Lineage::Flat { individuals },
            Topology::Tree => Lineage::Tree { roots: individuals },
        };
        Self {
            lineage,
            generation: 0,
        }
    }

    /// Deduplicate the seeds by sequence and score every one of them.
    pub fn initialize(
        seeds: Vec<Individual>,
        topology: Topology,
        model: &ConservationModel,
        fitness: &dyn FitnessFunction,
    ) -> Result<Self, FitnessError> {
        let (mut seeds, dropped) = deduplicate(seeds);
        if dropped > 0 {
            log::info!("Dropped {dropped} duplicate seed sequences");
        }
        let sequences: Vec<&Sequence> = seeds.iter().map(Individual::sequence).collect();
        let scores = evaluate_batch(fitness, model, &sequences)?;
        for (ind, score) in seeds.iter_mut().zip(scores) {
            ind.set_cached_fitness(score);
        }
        Ok(Self::new(topology, seeds))
    }

    pub fn topology(&self) -> Topology {
        match self.lineage {
            Lineage::Flat { .. } => Topology::Flat,
            Lineage::Tree { .. } => Topology::Tree,
        }
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    /// Get the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Increment the generation counter.
    pub fn increment_generation(&mut self) {
        self.generation += 1;
    }

    /// The top-level individuals: generation members or tree roots.
    pub fn forest(&self) -> &[Individual] {
        match &self.lineage {
            Lineage::Flat { individuals } => individuals,
            Lineage::Tree { roots } => roots,
        }
    }

    fn forest_mut(&mut self) -> &mut Vec<Individual> {
        match &mut self.lineage {
            Lineage::Flat { individuals } => individuals,
            Lineage::Tree { roots } => roots,
        }
    }

    /// Number of live individuals (every node of every tree).
    pub fn size(&self) -> usize {
        self.forest().iter().map(Individual::subtree_size).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.forest().is_empty()
    }

    /// Every live individual in pre-order.
    pub fn flatten(&self) -> Vec<&Individual> {
        self.flatten_with_paths()
            .into_iter()
            .map(|(_, ind)| ind)
            .collect()
    }

    pub fn flatten_with_paths(&self) -> Vec<(NodePath, &Individual)> {
        lineage::flatten_with_paths(self.forest())
    }

    pub fn get(&self, path: &NodePath) -> Option<&Individual> {
        lineage::node(self.forest(), path)
    }

    /// Fittest live individual; ties go to the first in pre-order.
    pub fn best(&self) -> Option<&Individual> {
        self.flatten()
            .into_iter()
            .reduce(|best, ind| if ind.fitness() > best.fitness() { ind } else { best })
    }

    /// Score every individual without a cached fitness.
    /// Returns how many were scored.
    pub fn evaluate_missing(
        &mut self,
        fitness: &dyn FitnessFunction,
        model: &ConservationModel,
    ) -> Result<usize, FitnessError> {
        let pending: Vec<(NodePath, Sequence)> = self
            .flatten_with_paths()
            .into_iter()
            .filter(|(_, ind)| ind.cached_fitness().is_none())
            .map(|(path, ind)| (path, ind.sequence().clone()))
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let sequences: Vec<&Sequence> = pending.iter().map(|(_, seq)| seq).collect();
        let scores = evaluate_batch(fitness, model, &sequences)?;
        let forest = self.forest_mut();
        for ((path, _), score) in pending.iter().zip(scores) {
            if let Some(ind) = lineage::node_mut(forest, path) {
                ind.set_cached_fitness(score);
            }
        }
        Ok(pending.len())
    }

    /// Append an individual at the top level: a generation member in a flat
    /// population, a new root in a tree population.
    pub fn push(&mut self, individual: Individual) {
        self.forest_mut().push(individual);
    }

    /// Attach `child` under the node at `path`. Fails when the path does not
    /// resolve or a sibling already carries the same sequence.
    pub fn attach(&mut self, path: &NodePath, child: Individual) -> bool {
        lineage::node_mut(self.forest_mut(), path)
            .map(|parent| parent.add_descendant(child))
            .unwrap_or(false)
    }

    /// Keep exactly the nodes in `keep`.
    ///
    /// Flat members keep their relative order. In a tree, kept descendants of
    /// a removed node are re-attached to its nearest kept ancestor, or become
    /// roots when none is kept.
    pub fn retain(&mut self, keep: &HashSet<NodePath>) {
        let forest = std::mem::take(self.forest_mut());
        let kept: Vec<Individual> = match self.lineage {
            Lineage::Flat { .. } => forest
                .into_iter()
                .enumerate()
                .filter(|(i, _)| keep.contains(&NodePath::root(*i)))
                .map(|(_, ind)| ind)
                .collect(),
            Lineage::Tree { .. } => forest
                .into_iter()
                .enumerate()
                .flat_map(|(i, root)| lineage::prune(root, &NodePath::root(i), keep))
                .collect(),
        };
        *self.forest_mut() = kept;
    }

    /// Mean fitness over the live individuals.
    pub fn mean_fitness(&self) -> f64 {
        let members = self.flatten();
        if members.is_empty() {
            return FitnessValue::LETHAL_FITNESS.get();
        }
        members.iter().map(|ind| ind.fitness().get()).sum::<f64>() / members.len() as f64
    }
}
