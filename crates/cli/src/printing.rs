use easme_sim::base::AlphabetKind;
use easme_sim::evolution::{ConservationModel, MutationStrategy, SurvivorSelection};
use easme_sim::genome::Individual;
use easme_sim::simulation::Configuration;

pub fn print_parameters(config: &Configuration) {
    let execution = &config.execution;
    let evolution = &config.evolution;
    let initialization = &config.initialization;

    println!("\n📋 Simulation Configuration");
    println!("  • Generations: {} [-g, --generations]", execution.generations);
    println!(
        "  • Population Size: {} [-n, --population-size]",
        execution.max_population_size
    );
    println!("  • Offspring/Generation: {} [--offspring]", execution.offspring_per_generation);
    match execution.parent_pool_size {
        Some(size) => println!("  • Parent Pool: {size} [--parent-pool]"),
        None => println!("  • Parent Pool: population size [--parent-pool]"),
    }
    println!(
        "  • Max Child Attempts: {} [--max-child-attempts]",
        execution.max_child_attempts
    );
    println!("  • Topology: {:?} [--topology]", execution.topology);
    if let Some(seed) = execution.seed {
        println!("  • Random Seed: {seed} [--seed]");
    } else {
        println!("  • Random Seed: Random [--seed]");
    }

    println!("\n⚡ Evolution Parameters");
    match &evolution.alphabet {
        AlphabetKind::AminoAcid => println!("  • Alphabet: amino acids"),
        AlphabetKind::Nucleotide => println!("  • Alphabet: nucleotides"),
        AlphabetKind::Custom { symbols } => println!("  • Alphabet: {symbols}"),
    }
    match evolution.mutation {
        MutationStrategy::Uniform => println!("  • Mutation: uniform, 1 position"),
        MutationStrategy::Directed {
            count,
            comparison_size,
        } => {
            println!("  • Mutation: directed, {count} position(s) [--directed]");
            if comparison_size == 0 {
                println!("    - Comparison Set: whole reference");
            } else {
                println!("    - Comparison Set: {comparison_size} sequences [--comparison-size]");
            }
        }
    }
    println!("  • Crossover: {:?} [--crossover]", evolution.crossover);
    match evolution.survivor_selection {
        SurvivorSelection::Truncation => println!("  • Survivors: truncation"),
        SurvivorSelection::Tournament { k } => {
            println!("  • Survivors: {k}-tournament [--tournament]")
        }
    }
    println!("  • Fitness: {:?}", evolution.fitness);

    if initialization.origin.is_some() || initialization.drop_mismatched_seeds {
        println!("\n🌱 Seeds");
        if let Some(origin) = &initialization.origin {
            println!("  • Origin Filter: {origin} [--origin]");
        }
        if initialization.drop_mismatched_seeds {
            println!("  • Mismatched Lengths: dropped [--drop-mismatched-seeds]");
        }
    }
    println!();
}

pub fn print_model(model: &ConservationModel) {
    println!("\n🧬 Conservation Model");
    println!("  • Length: {}", model.len());
    println!("  • References Used: {}", model.retained());
    if model.dropped() > 0 {
        println!("  • References Dropped (length): {}", model.dropped());
    }
    println!("  • Conserved Positions: {}", model.conserved_positions().len());
}

pub fn print_individual(individual: &Individual) {
    println!("  Name: {}", individual.name());
    println!("  Fitness: {}", individual.fitness());
    if let Some(origin) = individual.origin() {
        println!("  Origin: {origin}");
    }
    println!("  Sequence: {}", individual.sequence());
    if let Some(coding) = individual.coding_sequence() {
        println!("  Coding: {coding}");
    }
}
