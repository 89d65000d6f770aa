//! Scenario tests for the conservation model, fitness and selection through
//! the public API.

use easme_sim::{
    base::{Alphabet, FitnessValue, Sequence},
    errors::SelectionError,
    evolution::{
        ConservationModel, conservation_gate, consensus_fitness, fitness_proportionate,
        truncation, uniform_mutate,
    },
};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

fn ac(text: &str) -> Sequence {
    Sequence::parse(text, &Alphabet::new("AC").unwrap()).unwrap()
}

#[test]
fn test_four_by_five_reference_scenario() {
    let reference = [ac("AAAAA"), ac("AAAAA"), ac("AAAAA"), ac("AAAAC")];
    let model = ConservationModel::build(&reference).unwrap();

    let conserved: Vec<bool> = (0..5).map(|i| model.is_conserved(i)).collect();
    assert_eq!(conserved, vec![true, true, true, true, false]);
    for stats in model.positions() {
        assert_eq!(stats.total(), 4);
    }

    let candidate = ac("AAAAC");
    assert_eq!(
        consensus_fitness(&candidate, &model).unwrap(),
        FitnessValue::new(0.8)
    );
    assert!(conservation_gate(&candidate, &model).unwrap());
    assert!(!conservation_gate(&ac("CAAAC"), &model).unwrap());
}

#[test]
fn test_all_zero_fitness_population_is_degenerate() {
    let population = vec![FitnessValue::LETHAL_FITNESS; 5];
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    assert_eq!(
        fitness_proportionate(&population, 2, &mut rng),
        Err(SelectionError::DegenerateFitness { population: 5 })
    );
}

#[test]
fn test_truncation_keeps_ties_in_order() {
    let population: Vec<FitnessValue> =
        [0.9, 0.9, 0.5, 0.1].into_iter().map(FitnessValue::new).collect();
    assert_eq!(truncation(&population, 3), vec![0, 1, 2]);
}

#[test]
fn test_mutation_never_returns_its_input() {
    let alphabet = Alphabet::new("AC").unwrap();
    let original = ac("ACACA");
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    for _ in 0..200 {
        let mutated = uniform_mutate(&original, &alphabet, &mut rng).unwrap();
        assert_ne!(mutated.sequence, original);
    }
    assert_eq!(original.to_string(), "ACACA");
}
