//! Selection strategies.
//!
//! Selection decides which individuals reproduce and which survive:
//!
//! - **Fitness-proportionate** (roulette wheel): `n` draws with replacement,
//!   each individual chosen with probability proportional to its fitness.
//!   Used to fill the parent pool.
//! - **Truncation**: keep the top `max_size` by fitness. Equal fitness keeps
//!   input order.
//! - **k-tournament**: repeated contests among `k` distinct candidates drawn
//!   uniformly from the remaining pool. The winner leaves the pool; the
//!   losers go back and may compete again. With elitism the overall best is
//!   the first winner before any contest runs.
//!
//! All strategies take a slice of [`Scored`] items and return indices into
//! it. They never reorder or modify the input, so the same functions serve
//! flat generations and flattened lineage trees.

use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::base::FitnessValue;
use crate::errors::SelectionError;
use crate::genome::Individual;

/// Anything carrying a fitness value.
pub trait Scored {
    fn fitness_value(&self) -> FitnessValue;
}

impl Scored for FitnessValue {
    fn fitness_value(&self) -> FitnessValue {
        *self
    }
}

impl Scored for f64 {
    fn fitness_value(&self) -> FitnessValue {
        FitnessValue::new(*self)
    }
}

impl Scored for Individual {
    /// Unscored individuals count as lethal.
    fn fitness_value(&self) -> FitnessValue {
        self.fitness()
    }
}

impl<T: Scored + ?Sized> Scored for &T {
    fn fitness_value(&self) -> FitnessValue {
        (**self).fitness_value()
    }
}

/// Roulette-wheel sampling of `n` indices with replacement.
///
/// # Errors
/// - `EmptyPopulation` if `population` is empty.
/// - `DegenerateFitness` if every fitness is zero.
pub fn fitness_proportionate<S: Scored, R: Rng + ?Sized>(
    population: &[S],
    n: usize,
    rng: &mut R,
) -> Result<Vec<usize>, SelectionError> {
    if population.is_empty() {
        return Err(SelectionError::EmptyPopulation);
    }
    let weights: Vec<f64> = population.iter().map(|s| s.fitness_value().get()).collect();
    let degenerate = SelectionError::DegenerateFitness {
        population: population.len(),
    };
    if weights.iter().all(|&w| w == 0.0) {
        return Err(degenerate);
    }
    let dist = WeightedIndex::new(&weights).map_err(|_| degenerate)?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Indices of the `max_size` fittest items, best first.
///
/// Equal fitness keeps input order. If the population already fits, every
/// index is returned in input order.
pub fn truncation<S: Scored>(population: &[S], max_size: usize) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..population.len()).collect();
    if population.len() <= max_size {
        return ranked;
    }
    // sort_by is stable
    ranked.sort_by(|&a, &b| {
        population[b]
            .fitness_value()
            .cmp(&population[a].fitness_value())
    });
    ranked.truncate(max_size);
    ranked
}

/// Index of the fittest item; ties go to the lowest index.
fn fittest<S: Scored>(population: &[S], candidates: impl IntoIterator<Item = usize>) -> Option<usize> {
    candidates.into_iter().reduce(|best, i| {
        let (fb, fi) = (population[best].fitness_value(), population[i].fitness_value());
        if fb > fi || (fb == fi && best < i) {
            best
        } else {
            i
        }
    })
}

/// Choose `n` distinct winners by k-tournament.
///
/// Each round draws `min(k, remaining)` distinct candidates, the fittest of
/// them wins (lowest index on ties) and is removed from the pool. Asking for
/// at least as many winners as there are individuals returns every index.
///
/// # Errors
/// - `InvalidTournamentSize` if `k == 0`.
/// - `EmptyPopulation` if winners are requested from an empty population.
pub fn k_tournament<S: Scored, R: Rng + ?Sized>(
    population: &[S],
    n: usize,
    k: usize,
    elitism: bool,
    rng: &mut R,
) -> Result<Vec<usize>, SelectionError> {
    if k == 0 {
        return Err(SelectionError::InvalidTournamentSize(k));
    }
    if n == 0 {
        return Ok(Vec::new());
    }
    if population.is_empty() {
        return Err(SelectionError::EmptyPopulation);
    }
    if n >= population.len() {
        return Ok((0..population.len()).collect());
    }

    let mut pool: Vec<usize> = (0..population.len()).collect();
    let mut winners = Vec::with_capacity(n);

    if elitism {
        if let Some(best) = fittest(population, pool.iter().copied()) {
            pool.retain(|&i| i != best);
            winners.push(best);
        }
    }

    while winners.len() < n {
        let size = k.min(pool.len());
        let contestants = rand::seq::index::sample(rng, pool.len(), size);
        let winner = fittest(population, contestants.iter().map(|slot| pool[slot]))
            .ok_or(SelectionError::EmptyPopulation)?;
        pool.retain(|&i| i != winner);
        winners.push(winner);
    }
    Ok(winners)
}

/// How survivors are chosen at the end of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SurvivorSelection {
    /// Keep the fittest.
    #[default]
    Truncation,
    /// Elitist k-tournament without replacement.
    Tournament { k: usize },
}

impl SurvivorSelection {
    /// Indices of the survivors among `population`.
    pub fn select<S: Scored, R: Rng + ?Sized>(
        &self,
        population: &[S],
        max_size: usize,
        rng: &mut R,
    ) -> Result<Vec<usize>, SelectionError> {
        match *self {
            Self::Truncation => Ok(truncation(population, max_size)),
            Self::Tournament { k } => k_tournament(population, max_size, k, true, rng),
        }
    }
}
